use std::error::Error;

use aws_config::BehaviorVersion;

use crate::config::{RendererMode, RendererSettings, Settings};
use crate::detection::RekognitionDetector;
use crate::overlay::Annotator;
use crate::pipeline::{DetectionRequest, Pipeline};
use crate::render::{FileRenderer, Renderer, WindowRenderer};
use crate::storage::S3ImageStore;

pub async fn start_app(settings: Settings) -> Result<(), Box<dyn Error>> {
    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let detector = RekognitionDetector::new(&sdk_config);
    let store = S3ImageStore::new(&sdk_config);
    let annotator = Annotator::new()?;
    let renderer = build_renderer(&settings.renderer, &settings.storage.image_key);

    let pipeline = Pipeline::new(detector, store, annotator, renderer);
    let request = DetectionRequest::from(&settings);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    pipeline.run_and_report(&request, &mut out).await?;

    Ok(())
}

fn build_renderer(settings: &RendererSettings, image_key: &str) -> Box<dyn Renderer> {
    match settings.mode {
        RendererMode::Window => Box::new(WindowRenderer::new(image_key)),
        RendererMode::File => Box::new(FileRenderer::new(settings.output_path.clone())),
    }
}
