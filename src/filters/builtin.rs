//! Built-in filter variants.
//!
//! | Filter | Behavior | Crate / function |
//! |---|---|---|
//! | [`Thumb`] | fit within bounding box, aspect preserved, never upscales | `DynamicImage::resize` (Lanczos3) |
//! | [`Crop`] | fill + center-crop to exact dimensions | `DynamicImage::resize_to_fill` (Lanczos3) |
//! | [`Resize`] | exact dimensions, aspect ignored | `DynamicImage::resize_exact` (Lanczos3) |
//!
//! All built-ins re-encode in the source format, so a jpg source yields a
//! jpg reform. Identifiers encode the target box, e.g. `thumb_100x100`.

use super::{Filter, FilterError, FilterOutput};
use crate::formats::Format;
use image::DynamicImage;
use image::imageops::FilterType;

/// Scale to fit within a bounding box, preserving aspect ratio.
///
/// Sources already inside the box pass through unscaled — a thumbnail
/// never upscales.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thumb {
    pub width: u32,
    pub height: u32,
}

impl Filter for Thumb {
    fn id(&self) -> String {
        format!("thumb_{}x{}", self.width, self.height)
    }

    fn apply(&self, source: &[u8], format: Format) -> Result<FilterOutput, FilterError> {
        let img = decode(source, format)?;
        let out = if img.width() <= self.width && img.height() <= self.height {
            img
        } else {
            img.resize(self.width, self.height, FilterType::Lanczos3)
        };
        encode(&out, format)
    }
}

/// Fill the target box then center-crop to exact dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub width: u32,
    pub height: u32,
}

impl Filter for Crop {
    fn id(&self) -> String {
        format!("crop_{}x{}", self.width, self.height)
    }

    fn apply(&self, source: &[u8], format: Format) -> Result<FilterOutput, FilterError> {
        let img = decode(source, format)?;
        let out = img.resize_to_fill(self.width, self.height, FilterType::Lanczos3);
        encode(&out, format)
    }
}

/// Resize to exact dimensions, ignoring aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

impl Filter for Resize {
    fn id(&self) -> String {
        format!("resize_{}x{}", self.width, self.height)
    }

    fn apply(&self, source: &[u8], format: Format) -> Result<FilterOutput, FilterError> {
        let img = decode(source, format)?;
        let out = img.resize_exact(self.width, self.height, FilterType::Lanczos3);
        encode(&out, format)
    }
}

fn decode(source: &[u8], format: Format) -> Result<DynamicImage, FilterError> {
    image::load_from_memory_with_format(source, format.image_format())
        .map_err(FilterError::Decode)
}

fn encode(img: &DynamicImage, format: Format) -> Result<FilterOutput, FilterError> {
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), format.image_format())
        .map_err(FilterError::Encode)?;
    Ok(FilterOutput {
        bytes,
        format,
        width: img.width(),
        height: img.height(),
    })
}
