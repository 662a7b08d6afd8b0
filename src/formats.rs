//! The format table: canonical image formats accepted by this crate.
//!
//! This table is definitive — every format the crate will store, transform,
//! or serve appears here, and nowhere else. Each canonical key maps to
//! exactly one pixel-library name and a fixed set of accepted file
//! extensions (case-insensitive, aliases included: `jpeg` → `jpg`,
//! `tif` → `tiff`). Pure lookup, no state.

use image::ImageFormat;

/// Canonical image format keys.
///
/// The variant set matches the decoders/encoders compiled into the `image`
/// crate via this crate's feature selection, so every accepted format can
/// both be read and re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Bmp,
    Jpg,
    Png,
    Gif,
    Tiff,
    Webp,
}

impl Format {
    /// Every accepted format, in table order.
    pub const ALL: [Format; 6] = [
        Format::Bmp,
        Format::Jpg,
        Format::Png,
        Format::Gif,
        Format::Tiff,
        Format::Webp,
    ];

    /// Resolve a file extension to its canonical format.
    ///
    /// Case-insensitive; a leading dot is tolerated. Returns `None` for
    /// extensions outside the accepted table.
    pub fn from_extension(ext: &str) -> Option<Format> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        Format::ALL
            .iter()
            .copied()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }

    /// Accepted file extensions for this format, canonical spelling first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Format::Bmp => &["bmp"],
            Format::Jpg => &["jpg", "jpeg"],
            Format::Png => &["png"],
            Format::Gif => &["gif"],
            Format::Tiff => &["tiff", "tif"],
            Format::Webp => &["webp"],
        }
    }

    /// Canonical file extension (no dot).
    pub fn extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// The pixel library's internal name for this format.
    pub fn library_name(self) -> &'static str {
        match self {
            Format::Bmp => "BMP",
            Format::Jpg => "JPEG",
            Format::Png => "PNG",
            Format::Gif => "GIF",
            Format::Tiff => "TIFF",
            Format::Webp => "WEBP",
        }
    }

    /// Resolve a pixel-library name back to the canonical format.
    ///
    /// Accepts the aliases pixel libraries report for JPEG-family files
    /// (`JPG`, `MPO`).
    pub fn from_library_name(name: &str) -> Option<Format> {
        match name.to_ascii_uppercase().as_str() {
            "BMP" => Some(Format::Bmp),
            "JPEG" | "JPG" | "MPO" => Some(Format::Jpg),
            "PNG" => Some(Format::Png),
            "GIF" => Some(Format::Gif),
            "TIFF" => Some(Format::Tiff),
            "WEBP" => Some(Format::Webp),
            _ => None,
        }
    }

    /// Bridge to the `image` crate's format identifier.
    pub fn image_format(self) -> ImageFormat {
        match self {
            Format::Bmp => ImageFormat::Bmp,
            Format::Jpg => ImageFormat::Jpeg,
            Format::Png => ImageFormat::Png,
            Format::Gif => ImageFormat::Gif,
            Format::Tiff => ImageFormat::Tiff,
            Format::Webp => ImageFormat::WebP,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Longest accepted extension plus one for the dot.
///
/// Used for sizing fixed-width storage of extension suffixes
/// (e.g. `.jpeg` needs 5).
pub fn extensions_maxlen() -> usize {
    Format::ALL
        .iter()
        .flat_map(|f| f.extensions())
        .map(|e| e.len())
        .max()
        .unwrap_or(0)
        + 1
}
