//! Shared test utilities for the image-reform test suite.
//!
//! Synthetic image fixtures (valid JPEG/PNG bytes at known dimensions) and
//! a recording filter for asserting how often the transform actually runs.

use crate::filters::{Filter, FilterError, FilterOutput, Thumb};
use crate::formats::Format;
use image::{ImageEncoder, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};

fn test_pixels(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// A small valid JPEG with the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = test_pixels(width, height);
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// A small valid PNG with the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = test_pixels(width, height);
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// Filter that counts its `apply` invocations and otherwise behaves like a
/// 100x100 [`Thumb`]. Lets cache tests assert "the transform did not run
/// again" instead of inferring it from timing.
pub struct RecordingFilter {
    id: String,
    calls: AtomicUsize,
    inner: Thumb,
}

impl RecordingFilter {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            calls: AtomicUsize::new(0),
            inner: Thumb {
                width: 100,
                height: 100,
            },
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Filter for RecordingFilter {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn apply(&self, source: &[u8], format: Format) -> Result<FilterOutput, FilterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.apply(source, format)
    }
}
