use std::path::PathBuf;

use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to write annotated image: {0}")]
    Save(#[from] image::ImageError),
    #[error("viewer window failed: {0}")]
    Window(String),
}

/// Presents the composed image to the user. Implementations either block
/// until an interactive viewer is dismissed or export the image without
/// interaction.
pub trait Renderer {
    fn present(&self, image: &RgbImage) -> Result<(), RenderError>;
}

impl Renderer for Box<dyn Renderer> {
    fn present(&self, image: &RgbImage) -> Result<(), RenderError> {
        self.as_ref().present(image)
    }
}

/// Headless export: encodes the image to the configured path, format derived
/// from the file extension.
pub struct FileRenderer {
    path: PathBuf,
}

impl FileRenderer {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Renderer for FileRenderer {
    fn present(&self, image: &RgbImage) -> Result<(), RenderError> {
        image.save(&self.path)?;
        tracing::info!("Annotated image written to {}", self.path.display());
        Ok(())
    }
}

/// Interactive viewer window. `present` blocks until the window is closed.
pub struct WindowRenderer {
    title: String,
}

impl WindowRenderer {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
        }
    }
}

impl Renderer for WindowRenderer {
    fn present(&self, image: &RgbImage) -> Result<(), RenderError> {
        let size = [image.width() as usize, image.height() as usize];
        let pixels = image.as_raw().clone();
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([image.width() as f32, image.height() as f32]),
            ..Default::default()
        };

        let viewer = ViewerWindow {
            size,
            pixels,
            texture: None,
        };

        eframe::run_native(&self.title, options, Box::new(move |_cc| Box::new(viewer)))
            .map_err(|e| RenderError::Window(e.to_string()))
    }
}

struct ViewerWindow {
    size: [usize; 2],
    pixels: Vec<u8>,
    texture: Option<egui::TextureHandle>,
}

impl eframe::App for ViewerWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let texture = self.texture.get_or_insert_with(|| {
            let color_image = egui::ColorImage::from_rgb(self.size, &self.pixels);
            ctx.load_texture("annotated-image", color_image, egui::TextureOptions::LINEAR)
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().show(ui, |ui| {
                ui.image((texture.id(), texture.size_vec2()));
            });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_file_renderer_writes_the_image() {
        let path = std::env::temp_dir().join("label_overlay_render_test.png");
        let _ = std::fs::remove_file(&path);
        let image = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));

        FileRenderer::new(path.clone()).present(&image).unwrap();

        let written = image::open(&path).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (4, 4));
        assert_eq!(*written.get_pixel(0, 0), Rgb([255, 0, 0]));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_renderer_surfaces_save_failures() {
        let image = RgbImage::from_pixel(4, 4, Rgb([255, 0, 0]));
        let missing_dir = std::env::temp_dir()
            .join("label_overlay_missing")
            .join("out.png");

        let result = FileRenderer::new(missing_dir).present(&image);

        assert!(matches!(result, Err(RenderError::Save(_))));
    }
}
