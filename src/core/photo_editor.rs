//! Square crop editor used during photo onboarding.
//!
//! The photo is scaled to cover a fixed square canvas, zoomed, rotated about
//! the canvas centre and flattened into a JPEG data URL.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Side of the square output canvas, in pixels
pub const CANVAS_SIZE: u32 = 1000;
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;
pub const JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum PhotoEditError {
    #[error("Not a base64 data URL")]
    InvalidDataUrl,

    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Clockwise rotation in quarter turns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    #[serde(rename = "0")]
    None,
    #[serde(rename = "90")]
    Quarter,
    #[serde(rename = "180")]
    Half,
    #[serde(rename = "270")]
    ThreeQuarter,
}

impl Rotation {
    /// Nearest quarter turn for any angle in degrees
    pub fn from_degrees(degrees: i32) -> Self {
        match (degrees.rem_euclid(360) + 45) / 90 % 4 {
            1 => Rotation::Quarter,
            2 => Rotation::Half,
            3 => Rotation::ThreeQuarter,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Quarter => 90,
            Rotation::Half => 180,
            Rotation::ThreeQuarter => 270,
        }
    }

    /// One more quarter turn clockwise
    pub fn turn(self) -> Self {
        Self::from_degrees(self.degrees() as i32 + 90)
    }
}

/// Zoom factor, always within `[MIN_ZOOM, MAX_ZOOM]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64")]
pub struct Zoom(f64);

impl From<f64> for Zoom {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl Zoom {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(MIN_ZOOM);
        }
        Self(value.clamp(MIN_ZOOM, MAX_ZOOM))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self(MIN_ZOOM)
    }
}

/// Editor controls for one photo
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EditParams {
    pub rotation: Rotation,
    pub zoom: Zoom,
}

/// Size the source is drawn at on a `size` square before rotation.
///
/// The shorter side always covers the canvas; zoom scales both sides.
pub fn draw_size(width: u32, height: u32, size: u32, zoom: Zoom) -> (f64, f64) {
    let size = f64::from(size);
    let zoom = zoom.value();
    let aspect = f64::from(width) / f64::from(height.max(1));

    if aspect > 1.0 {
        (size * aspect * zoom, size * zoom)
    } else {
        (size * zoom, size / aspect * zoom)
    }
}

/// Part of the source that lands on a `size` square, as `(x, y, width, height)`
/// in source pixels.
///
/// Quarter turns about the canvas centre keep a centred square in place, so
/// the visible part is the same with or without rotation.
pub fn visible_rect(width: u32, height: u32, size: u32, zoom: Zoom) -> (u32, u32, u32, u32) {
    let width = width.max(1);
    let height = height.max(1);
    let (draw_w, _) = draw_size(width, height, size, zoom);
    let side = (f64::from(size) * f64::from(width) / draw_w).round().max(1.0) as u32;

    let w = side.min(width);
    let h = side.min(height);
    ((width - w) / 2, (height - h) / 2, w, h)
}

/// Render the edit onto the square canvas.
///
/// Only the visible part of the source is scaled, so no buffer larger than
/// the canvas is allocated whatever the source aspect ratio.
pub fn render(source: &DynamicImage, params: EditParams) -> RgbImage {
    let (x, y, w, h) = visible_rect(source.width(), source.height(), CANVAS_SIZE, params.zoom);
    let scaled = source
        .crop_imm(x, y, w, h)
        .resize_exact(CANVAS_SIZE, CANVAS_SIZE, FilterType::Lanczos3);

    let rotated = match params.rotation {
        Rotation::None => scaled,
        Rotation::Quarter => scaled.rotate90(),
        Rotation::Half => scaled.rotate180(),
        Rotation::ThreeQuarter => scaled.rotate270(),
    };
    rotated.to_rgb8()
}

/// Split a `data:<mime>;base64,<payload>` URL into mime type and bytes
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), PhotoEditError> {
    let rest = url.strip_prefix("data:").ok_or(PhotoEditError::InvalidDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(PhotoEditError::InvalidDataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(PhotoEditError::InvalidDataUrl)?;

    Ok((mime.to_string(), STANDARD.decode(payload.trim())?))
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Apply the edit to an image data URL and return the JPEG data URL
pub fn edit_data_url(url: &str, params: EditParams) -> Result<String, PhotoEditError> {
    let (_, bytes) = decode_data_url(url)?;
    let source = image::load_from_memory(&bytes)?;
    let canvas = render(&source, params);

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&canvas)?;
    tracing::debug!(
        "Rendered {}x{} photo at {}deg x{:.2} into {} bytes",
        source.width(),
        source.height(),
        params.rotation.degrees(),
        params.zoom.value(),
        jpeg.len()
    );
    Ok(encode_data_url("image/jpeg", &jpeg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_data_url(width: u32, height: u32) -> String {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        });
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        encode_data_url("image/png", bytes.get_ref())
    }

    #[test]
    fn test_zoom_is_clamped() {
        assert_eq!(Zoom::new(0.2).value(), 1.0);
        assert_eq!(Zoom::new(2.5).value(), 2.5);
        assert_eq!(Zoom::new(9.0).value(), 3.0);
        assert_eq!(Zoom::new(f64::NAN).value(), 1.0);
    }

    #[test]
    fn test_rotation_steps() {
        assert_eq!(Rotation::None.turn(), Rotation::Quarter);
        assert_eq!(Rotation::ThreeQuarter.turn(), Rotation::None);
        assert_eq!(Rotation::from_degrees(-90), Rotation::ThreeQuarter);
        assert_eq!(Rotation::from_degrees(450), Rotation::Quarter);
    }

    #[test]
    fn test_draw_size_landscape_and_portrait() {
        assert_eq!(draw_size(2000, 1000, 1000, Zoom::new(1.0)), (2000.0, 1000.0));
        assert_eq!(draw_size(1000, 2000, 1000, Zoom::new(2.0)), (2000.0, 4000.0));
        assert_eq!(draw_size(500, 500, 1000, Zoom::new(1.5)), (1500.0, 1500.0));
    }

    #[test]
    fn test_visible_rect_is_centred_square() {
        assert_eq!(visible_rect(2000, 1000, 1000, Zoom::new(1.0)), (500, 0, 1000, 1000));
        assert_eq!(visible_rect(1000, 2000, 1000, Zoom::new(2.0)), (250, 750, 500, 500));
        assert_eq!(visible_rect(40, 20, 1000, Zoom::new(1.0)), (10, 0, 20, 20));
    }

    #[test]
    fn test_sliver_source_stays_within_canvas_memory() {
        let (_, _, w, h) = visible_rect(1, 4000, CANVAS_SIZE, Zoom::new(3.0));
        assert!(u64::from(w) * u64::from(h) <= u64::from(CANVAS_SIZE) * u64::from(CANVAS_SIZE));

        let url = png_data_url(1, 4000);
        let edited = edit_data_url(
            &url,
            EditParams { rotation: Rotation::Quarter, zoom: Zoom::new(3.0) },
        )
        .unwrap();

        let (_, bytes) = decode_data_url(&edited).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CANVAS_SIZE, CANVAS_SIZE));
    }

    #[test]
    fn test_render_covers_square_canvas() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 20, Rgb([0, 200, 0])));
        let canvas = render(&source, EditParams::default());

        assert_eq!(canvas.dimensions(), (CANVAS_SIZE, CANVAS_SIZE));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([0, 200, 0]));
        assert_eq!(canvas.get_pixel(999, 999), &Rgb([0, 200, 0]));
    }

    #[test]
    fn test_half_turn_swaps_sides() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_fn(20, 20, |x, _| {
            if x < 10 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) }
        }));
        let canvas = render(
            &source,
            EditParams { rotation: Rotation::Half, zoom: Zoom::default() },
        );

        let left = canvas.get_pixel(100, 500);
        assert!(left[2] > 200 && left[0] < 50);
    }

    #[test]
    fn test_edit_data_url_outputs_jpeg() {
        let url = png_data_url(30, 60);
        let edited = edit_data_url(
            &url,
            EditParams { rotation: Rotation::Quarter, zoom: Zoom::new(1.2) },
        )
        .unwrap();

        let (mime, bytes) = decode_data_url(&edited).unwrap();
        assert_eq!(mime, "image/jpeg");
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (CANVAS_SIZE, CANVAS_SIZE));
    }

    #[test]
    fn test_rejects_plain_urls() {
        assert!(matches!(
            decode_data_url("https://example.com/a.png"),
            Err(PhotoEditError::InvalidDataUrl)
        ));
    }
}
