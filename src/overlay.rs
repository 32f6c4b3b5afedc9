use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use thiserror::Error;

use crate::bounding_box::PixelBox;
use crate::detection::DetectedLabel;

const LABEL_FONT_SCALE: f32 = 16.0;
const LABEL_TEXT_HEIGHT: i32 = 18;
const LABEL_CHAR_WIDTH: f32 = 8.0; // rough advance estimate for the background box
const LABEL_TEXT_OFFSET: i32 = 2;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("no label font bundled with the ui toolkit")]
    MissingFont,
    #[error("failed to parse label font: {0}")]
    InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// The planned drawing operations for one detected instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub pixel_box: PixelBox,
    pub text: String,
    pub text_x: f32,
    pub text_y: f32,
}

/// One annotation per localized instance, in service order: labels first,
/// instances within each label second.
pub fn plan_annotations(
    labels: &[DetectedLabel],
    image_width: u32,
    image_height: u32,
) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    for label in labels {
        for instance in &label.instances {
            let pixel_box = instance.bounding_box.to_pixels(image_width, image_height);
            annotations.push(Annotation {
                text: format!("{} ({:.2}%)", label.name, label.confidence),
                text_x: pixel_box.left,
                text_y: pixel_box.top - LABEL_TEXT_OFFSET as f32,
                pixel_box,
            });
        }
    }
    annotations
}

pub struct OverlayStyle {
    pub stroke_width: u32,
    pub box_color: Rgb<u8>,
    pub text_color: Rgb<u8>,
    pub text_background: Rgb<u8>,
    pub background_alpha: f32,
    pub font_scale: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_width: 1,
            box_color: Rgb([255, 0, 0]),
            text_color: Rgb([255, 0, 0]),
            text_background: Rgb([255, 255, 255]),
            background_alpha: 0.7,
            font_scale: LABEL_FONT_SCALE,
        }
    }
}

pub struct Annotator {
    font: FontVec,
    style: OverlayStyle,
}

impl Annotator {
    pub fn new() -> Result<Self, OverlayError> {
        Ok(Self {
            font: bundled_label_font()?,
            style: OverlayStyle::default(),
        })
    }

    pub fn draw(&self, image: &mut RgbImage, annotations: &[Annotation]) {
        for annotation in annotations {
            self.draw_outline(image, &annotation.pixel_box);
            self.draw_label(image, annotation);
        }
    }

    fn draw_outline(&self, image: &mut RgbImage, pixel_box: &PixelBox) {
        let x = pixel_box.left.round() as i32;
        let y = pixel_box.top.round() as i32;
        let width = pixel_box.width.round();
        let height = pixel_box.height.round();
        if width < 1.0 || height < 1.0 {
            return;
        }
        let (width, height) = (width as u32, height as u32);

        for t in 0..self.style.stroke_width {
            let w = width.saturating_sub(2 * t);
            let h = height.saturating_sub(2 * t);
            if w == 0 || h == 0 {
                break;
            }
            let inset = t as i32;
            draw_hollow_rect_mut(
                image,
                Rect::at(x + inset, y + inset).of_size(w, h),
                self.style.box_color,
            );
        }
    }

    fn draw_label(&self, image: &mut RgbImage, annotation: &Annotation) {
        if annotation.text.is_empty() {
            return;
        }
        let x = annotation.text_x.round() as i32;
        let y = annotation.text_y.round() as i32;

        let text_width = (annotation.text.len() as f32 * LABEL_CHAR_WIDTH).ceil() as i32;
        blend_filled_rect(
            image,
            x,
            y,
            text_width,
            LABEL_TEXT_HEIGHT,
            self.style.text_background,
            self.style.background_alpha,
        );
        draw_text_mut(
            image,
            self.style.text_color,
            x,
            y,
            PxScale::from(self.style.font_scale),
            &self.font,
            &annotation.text,
        );
    }
}

// Blends `color` over the region at `alpha`, clipping to the image bounds.
fn blend_filled_rect(
    image: &mut RgbImage,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    color: Rgb<u8>,
    alpha: f32,
) {
    let x0 = x.clamp(0, image.width() as i32) as u32;
    let y0 = y.clamp(0, image.height() as i32) as u32;
    let x1 = x.saturating_add(width).clamp(0, image.width() as i32) as u32;
    let y1 = y.saturating_add(height).clamp(0, image.height() as i32) as u32;

    for yy in y0..y1 {
        for xx in x0..x1 {
            let pixel = image.get_pixel_mut(xx, yy);
            for c in 0..3 {
                let blended = pixel.0[c] as f32 * (1.0 - alpha) + color.0[c] as f32 * alpha;
                pixel.0[c] = blended.round() as u8;
            }
        }
    }
}

// The ui toolkit ships its fonts in the binary, so the annotator borrows one
// of those instead of carrying a font asset of its own.
fn bundled_label_font() -> Result<FontVec, OverlayError> {
    let definitions = egui::FontDefinitions::default();
    let name = definitions
        .families
        .get(&egui::FontFamily::Proportional)
        .and_then(|names| names.first())
        .cloned()
        .ok_or(OverlayError::MissingFont)?;
    let data = definitions
        .font_data
        .get(&name)
        .ok_or(OverlayError::MissingFont)?;

    Ok(FontVec::try_from_vec(data.font.to_vec())?)
}
