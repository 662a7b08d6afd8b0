//! Persisted record types: source images and their reforms.
//!
//! A [`SourceImage`] describes one uploaded file plus a deletion policy.
//! Derived metadata (dimensions, byte size) is computed lazily from the
//! file through the [`Storage`] collaborator, never stored redundantly —
//! and queries against a missing or unreadable file fail with
//! [`ImageError::SourceFileUnavailable`] rather than returning stale or
//! zero values.
//!
//! A [`Reform`] describes one cached rendition: which image it derives
//! from, the filter identifier that produced it, the resulting dimensions,
//! and the generated file. It is a cache entry, not a log — at most one
//! exists per `(image, filter)` pair, and it is never mutated after
//! creation. Reforms are exclusively owned by their source image and never
//! outlive it (see [`deletion`](crate::deletion)).

use crate::formats::Format;
use crate::store::Storage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    /// The image's backing file is missing or unreadable.
    #[error("source file unavailable: {path}")]
    SourceFileUnavailable { path: String },
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("failed to read image metadata: {0}")]
    Decode(String),
}

impl ImageError {
    pub(crate) fn unavailable(path: impl AsRef<Path>) -> Self {
        Self::SourceFileUnavailable {
            path: path.as_ref().display().to_string(),
        }
    }
}

/// Opaque source-image identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What happens to the image's own backing file when the record is deleted.
///
/// Reforms carry no such policy — they are pure cache artifacts and their
/// files are always removed with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoDelete {
    Yes,
    #[default]
    No,
}

/// A persisted record of one uploaded image file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceImage {
    pub id: ImageId,
    /// Storage-relative path of the backing file. `None` when the record
    /// has no file attached (or it was detached).
    pub src: Option<PathBuf>,
    /// Directory new uploads for this record land in.
    pub upload_dir: String,
    pub title: String,
    pub auto_delete: AutoDelete,
}

/// Default upload directory for source files.
pub const UPLOAD_DIR: &str = "originals";

impl SourceImage {
    pub fn new(id: ImageId, src: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            id,
            src: Some(src.into()),
            upload_dir: UPLOAD_DIR.to_string(),
            title: title.into(),
            auto_delete: AutoDelete::No,
        }
    }

    pub fn with_auto_delete(mut self, auto_delete: AutoDelete) -> Self {
        self.auto_delete = auto_delete;
        self
    }

    /// File name of the backing file, if any.
    pub fn filename(&self) -> Option<&str> {
        self.src.as_deref().and_then(Path::file_name).and_then(|n| n.to_str())
    }

    /// Canonical format from the file extension.
    pub fn format(&self) -> Option<Format> {
        self.src
            .as_deref()
            .and_then(Path::extension)
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension)
    }

    /// Alt text: the title when present, otherwise derived from the
    /// filename stem ("test.jpg" → "test image").
    pub fn alt(&self) -> String {
        if !self.title.is_empty() {
            return self.title.clone();
        }
        let stem = self
            .src
            .as_deref()
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
            .unwrap_or("");
        format!("{stem} image")
    }

    /// Read the backing file's bytes.
    ///
    /// A detached, missing, or unreadable file is a
    /// [`SourceFileUnavailable`](ImageError::SourceFileUnavailable)
    /// condition, never an empty result.
    pub fn read_source(&self, storage: &dyn Storage) -> Result<Vec<u8>, ImageError> {
        let src = self
            .src
            .as_deref()
            .ok_or_else(|| ImageError::unavailable("<unset>"))?;
        storage.read(src).map_err(|_| ImageError::unavailable(src))
    }

    /// Size of the backing file in bytes.
    pub fn bytesize(&self, storage: &dyn Storage) -> Result<u64, ImageError> {
        Ok(self.read_source(storage)?.len() as u64)
    }

    /// Pixel dimensions of the backing file (header read only).
    pub fn dimensions(&self, storage: &dyn Storage) -> Result<(u32, u32), ImageError> {
        let bytes = self.read_source(storage)?;
        let reader = image::ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| ImageError::Decode(e.to_string()))?;
        reader
            .into_dimensions()
            .map_err(|e| ImageError::Decode(e.to_string()))
    }

    pub fn width(&self, storage: &dyn Storage) -> Result<u32, ImageError> {
        Ok(self.dimensions(storage)?.0)
    }

    pub fn height(&self, storage: &dyn Storage) -> Result<u32, ImageError> {
        Ok(self.dimensions(storage)?.1)
    }

    pub fn is_portrait(&self, storage: &dyn Storage) -> Result<bool, ImageError> {
        let (w, h) = self.dimensions(storage)?;
        Ok(h > w)
    }

    pub fn is_landscape(&self, storage: &dyn Storage) -> Result<bool, ImageError> {
        let (w, h) = self.dimensions(storage)?;
        Ok(w >= h)
    }
}

/// One cached rendition of a source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reform {
    pub image_id: ImageId,
    /// Identifier of the filter that produced this rendition; together with
    /// `image_id` it forms the cache key.
    pub filter_id: String,
    /// Storage-relative path of the generated file. For the broken-image
    /// placeholder this is a static asset path instead.
    pub src: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Reform {
    /// An unpersisted placeholder standing in for a reform whose source
    /// file is unavailable.
    ///
    /// Points at a well-known static asset rather than a generated file and
    /// must never be written to the record store or to storage.
    pub fn broken(image_id: ImageId, filter_id: impl Into<String>, asset: impl Into<PathBuf>) -> Self {
        Self {
            image_id,
            filter_id: filter_id.into(),
            src: asset.into(),
            width: 0,
            height: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FsStorage, Storage};
    use crate::test_helpers::jpeg_bytes;
    use tempfile::TempDir;

    fn storage_with_jpeg(width: u32, height: u32) -> (TempDir, FsStorage) {
        let tmp = TempDir::new().unwrap();
        let storage = FsStorage::new(tmp.path());
        storage
            .write(Path::new("originals/test.jpg"), &jpeg_bytes(width, height))
            .unwrap();
        (tmp, storage)
    }

    #[test]
    fn dimensions_from_backing_file() {
        let (_tmp, storage) = storage_with_jpeg(640, 480);
        let image = SourceImage::new(ImageId(1), "originals/test.jpg", "Test image");

        assert_eq!(image.width(&storage).unwrap(), 640);
        assert_eq!(image.height(&storage).unwrap(), 480);
        assert!(image.is_landscape(&storage).unwrap());
        assert!(!image.is_portrait(&storage).unwrap());
    }

    #[test]
    fn bytesize_is_positive() {
        let (_tmp, storage) = storage_with_jpeg(64, 48);
        let image = SourceImage::new(ImageId(1), "originals/test.jpg", "");
        assert!(image.bytesize(&storage).unwrap() > 0);
    }

    #[test]
    fn missing_file_is_source_file_unavailable() {
        let tmp = TempDir::new().unwrap();
        let storage = FsStorage::new(tmp.path());
        let image = SourceImage::new(ImageId(1), "originals/gone.jpg", "");

        assert!(matches!(
            image.bytesize(&storage),
            Err(ImageError::SourceFileUnavailable { .. })
        ));
        assert!(matches!(
            image.dimensions(&storage),
            Err(ImageError::SourceFileUnavailable { .. })
        ));
    }

    #[test]
    fn detached_file_is_source_file_unavailable() {
        let tmp = TempDir::new().unwrap();
        let storage = FsStorage::new(tmp.path());
        let mut image = SourceImage::new(ImageId(1), "originals/test.jpg", "");
        image.src = None;

        assert!(matches!(
            image.read_source(&storage),
            Err(ImageError::SourceFileUnavailable { .. })
        ));
    }

    #[test]
    fn filename_and_format_from_src() {
        let image = SourceImage::new(ImageId(1), "originals/test.JPG", "");
        assert_eq!(image.filename(), Some("test.JPG"));
        assert_eq!(image.format(), Some(Format::Jpg));
    }

    #[test]
    fn alt_falls_back_to_filename_stem() {
        let image = SourceImage::new(ImageId(1), "originals/test.jpg", "");
        assert_eq!(image.alt(), "test image");

        let titled = SourceImage::new(ImageId(2), "originals/test.jpg", "A title");
        assert_eq!(titled.alt(), "A title");
    }

    #[test]
    fn default_upload_dir_and_policy() {
        let image = SourceImage::new(ImageId(1), "originals/test.jpg", "");
        assert_eq!(image.upload_dir, "originals");
        assert_eq!(image.auto_delete, AutoDelete::No);
    }

    #[test]
    fn broken_reform_points_at_the_asset() {
        let reform = Reform::broken(ImageId(7), "thumb_10x10", "image/unfound.png");
        assert_eq!(reform.src, PathBuf::from("image/unfound.png"));
        assert_eq!((reform.width, reform.height), (0, 0));
    }

    #[test]
    fn records_serialize_round_trip() {
        let image = SourceImage::new(ImageId(3), "originals/a.png", "A")
            .with_auto_delete(AutoDelete::Yes);
        let json = serde_json::to_string(&image).unwrap();
        let back: SourceImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, image);

        let reform = Reform {
            image_id: ImageId(3),
            filter_id: "thumb_1x1".to_string(),
            src: PathBuf::from("reforms/3/a-abc123.png"),
            width: 1,
            height: 1,
        };
        let json = serde_json::to_string(&reform).unwrap();
        let back: Reform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reform);
    }
}
