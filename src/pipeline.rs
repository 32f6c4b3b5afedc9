use std::io::Write;

use thiserror::Error;

use crate::config::Settings;
use crate::detection::{DetectionError, LabelDetector};
use crate::overlay::{plan_annotations, Annotator};
use crate::render::{RenderError, Renderer};
use crate::storage::{ImageFetchError, ImageStore};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error(transparent)]
    ImageFetch(#[from] ImageFetchError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRequest {
    pub bucket: String,
    pub image_key: String,
    pub max_labels: i32,
}

impl From<&Settings> for DetectionRequest {
    fn from(settings: &Settings) -> Self {
        Self {
            bucket: settings.storage.bucket.clone(),
            image_key: settings.storage.image_key.clone(),
            max_labels: settings.detection.max_labels,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub label_count: usize,
}

pub struct Pipeline<D: LabelDetector, S: ImageStore, R: Renderer> {
    detector: D,
    store: S,
    annotator: Annotator,
    renderer: R,
}

impl<D: LabelDetector, S: ImageStore, R: Renderer> Pipeline<D, S, R> {
    pub fn new(detector: D, store: S, annotator: Annotator, renderer: R) -> Self {
        Self {
            detector,
            store,
            annotator,
            renderer,
        }
    }

    /// Runs detect → report → fetch → decode → annotate → present, in that
    /// order. Labels are written before any image work happens, so a fetch
    /// failure leaves them on the output stream. Every failure propagates as
    /// its tagged variant.
    pub async fn run<W: Write>(
        &self,
        request: &DetectionRequest,
        out: &mut W,
    ) -> Result<PipelineReport, PipelineError> {
        let labels = self
            .detector
            .detect_labels(&request.bucket, &request.image_key, request.max_labels)
            .await?;

        writeln!(out, "Detected labels for {}:", request.image_key)?;
        writeln!(out)?;
        for label in &labels {
            writeln!(out, "Label: {}", label.name)?;
            writeln!(out, "Confidence: {}", label.confidence)?;
            writeln!(out)?;
        }

        let bytes = self
            .store
            .fetch_image(&request.bucket, &request.image_key)
            .await?;
        let decoded = image::load_from_memory(&bytes).map_err(ImageFetchError::Decode)?;
        let mut canvas = decoded.to_rgb8();
        tracing::debug!(
            "Annotating {}x{} image with {} labels",
            canvas.width(),
            canvas.height(),
            labels.len()
        );

        let annotations = plan_annotations(&labels, canvas.width(), canvas.height());
        self.annotator.draw(&mut canvas, &annotations);
        self.renderer.present(&canvas)?;

        Ok(PipelineReport {
            label_count: labels.len(),
        })
    }

    /// Behavior-parity wrapper: detection and fetch failures are logged with
    /// their cause, degrade to a zero-label outcome after a one-line
    /// diagnostic, and the final count is the last line written. Render and
    /// IO failures propagate instead.
    pub async fn run_and_report<W: Write>(
        &self,
        request: &DetectionRequest,
        out: &mut W,
    ) -> Result<usize, PipelineError> {
        let label_count = match self.run(request, out).await {
            Ok(report) => report.label_count,
            Err(PipelineError::Detection(err)) => {
                tracing::error!("Label detection failed: {err}");
                writeln!(out, "Error detecting labels: {err}")?;
                0
            }
            Err(PipelineError::ImageFetch(err)) => {
                tracing::error!("Image fetch failed: {err}");
                writeln!(out, "Error loading image from S3: {err}")?;
                0
            }
            Err(err) => return Err(err),
        };

        writeln!(out, "Labels detected: {}", label_count)?;
        Ok(label_count)
    }
}
