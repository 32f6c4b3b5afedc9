/// Axis-aligned box in fractions of the image dimensions, as returned by the
/// detection service. Components are expected to lie in [0, 1] but are not
/// validated here; drawing clips to the image instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// The same box scaled to pixel units. Values may be fractional; rounding is
/// left to the drawing primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedBox {
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelBox {
        let (w, h) = (image_width as f32, image_height as f32);
        PixelBox {
            left: self.left * w,
            top: self.top * h,
            width: self.width * w,
            height: self.height * h,
        }
    }
}
