//! Storage and record-store collaborators.
//!
//! Two seams keep the engine testable and backend-agnostic:
//!
//! - [`Storage`] — byte-level file storage (read/write/delete/exists).
//!   [`FsStorage`] is the filesystem implementation, rooted at a directory
//!   so every recorded path stays storage-relative and the whole tree is
//!   relocatable.
//! - [`RecordStore`] — CRUD over [`SourceImage`] and [`Reform`] records.
//!   The store enforces the one invariant the engine cannot live without:
//!   at most one reform per `(image, filter)` pair. A conflicting insert
//!   returns the existing row via [`StoreError::ReformExists`] so the
//!   caller can discard its generated file and adopt the winner.
//!
//! [`MemoryStore`] is the in-process implementation. Its records can be
//! persisted to a versioned JSON manifest; a missing, corrupt, or
//! version-mismatched manifest loads as empty rather than erroring, so a
//! cold cache is always a safe fallback.

use crate::models::{ImageId, Reform, SourceImage};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Byte-level file storage.
pub trait Storage: Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Write bytes, creating parent directories as needed. Returns the
    /// backend's absolute path for the stored file.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<PathBuf>;

    /// Delete a file. A path that is already absent counts as a successful
    /// deletion.
    fn delete(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// Filesystem storage rooted at a directory.
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.absolute(path))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
        let absolute = self.absolute(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&absolute, bytes)?;
        Ok(absolute)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(self.absolute(path)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.absolute(path).exists()
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// A reform for this `(image, filter)` pair already exists. Carries the
    /// winning row; resolved inside the materializer, never surfaced.
    #[error("a reform for image {} with filter '{}' already exists", .0.image_id, .0.filter_id)]
    ReformExists(Reform),
    #[error("image {0} already exists")]
    ImageExists(ImageId),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CRUD over source-image and reform records.
///
/// Implementations must enforce uniqueness of `(image_id, filter_id)` for
/// reforms; that constraint is what turns two racing generations into
/// exactly one authoritative cache entry.
pub trait RecordStore: Sync {
    fn insert_image(&self, image: SourceImage) -> Result<(), StoreError>;
    fn image(&self, id: ImageId) -> Option<SourceImage>;
    fn remove_image(&self, id: ImageId) -> Option<SourceImage>;

    /// Insert a reform, failing with [`StoreError::ReformExists`] when a
    /// row for the same `(image_id, filter_id)` pair is already present.
    fn insert_reform(&self, reform: Reform) -> Result<Reform, StoreError>;
    fn find_reform(&self, id: ImageId, filter_id: &str) -> Option<Reform>;
    /// All reforms owned by the given image.
    fn reforms_for(&self, id: ImageId) -> Vec<Reform>;
    fn remove_reform(&self, id: ImageId, filter_id: &str) -> Option<Reform>;
}

/// Version of the manifest format. Bump to invalidate persisted records
/// when the layout or key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Manifest {
    version: u32,
    images: Vec<SourceImage>,
    reforms: Vec<Reform>,
}

#[derive(Default)]
struct Records {
    images: HashMap<ImageId, SourceImage>,
    reforms: HashMap<(ImageId, String), Reform>,
}

/// In-process record store with optional JSON-manifest persistence.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load records from a manifest file. Returns an empty store if the
    /// file is missing, unparseable, or carries a different version.
    pub fn load(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::new();
        };
        let Ok(manifest) = serde_json::from_str::<Manifest>(&content) else {
            return Self::new();
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::new();
        }
        let records = Records {
            images: manifest.images.into_iter().map(|i| (i.id, i)).collect(),
            reforms: manifest
                .reforms
                .into_iter()
                .map(|r| ((r.image_id, r.filter_id.clone()), r))
                .collect(),
        };
        Self {
            records: Mutex::new(records),
        }
    }

    /// Save all records to a manifest file (deterministic order).
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let records = self.records.lock();
        let mut images: Vec<SourceImage> = records.images.values().cloned().collect();
        images.sort_by_key(|i| i.id);
        let mut reforms: Vec<Reform> = records.reforms.values().cloned().collect();
        reforms.sort_by(|a, b| (a.image_id, &a.filter_id).cmp(&(b.image_id, &b.filter_id)));
        drop(records);

        let manifest = Manifest {
            version: MANIFEST_VERSION,
            images,
            reforms,
        };
        let json = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn image_count(&self) -> usize {
        self.records.lock().images.len()
    }

    pub fn reform_count(&self) -> usize {
        self.records.lock().reforms.len()
    }
}

impl RecordStore for MemoryStore {
    fn insert_image(&self, image: SourceImage) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        if records.images.contains_key(&image.id) {
            return Err(StoreError::ImageExists(image.id));
        }
        records.images.insert(image.id, image);
        Ok(())
    }

    fn image(&self, id: ImageId) -> Option<SourceImage> {
        self.records.lock().images.get(&id).cloned()
    }

    fn remove_image(&self, id: ImageId) -> Option<SourceImage> {
        self.records.lock().images.remove(&id)
    }

    fn insert_reform(&self, reform: Reform) -> Result<Reform, StoreError> {
        let mut records = self.records.lock();
        let key = (reform.image_id, reform.filter_id.clone());
        if let Some(existing) = records.reforms.get(&key) {
            return Err(StoreError::ReformExists(existing.clone()));
        }
        records.reforms.insert(key, reform.clone());
        Ok(reform)
    }

    fn find_reform(&self, id: ImageId, filter_id: &str) -> Option<Reform> {
        self.records
            .lock()
            .reforms
            .get(&(id, filter_id.to_string()))
            .cloned()
    }

    fn reforms_for(&self, id: ImageId) -> Vec<Reform> {
        let records = self.records.lock();
        let mut reforms: Vec<Reform> = records
            .reforms
            .values()
            .filter(|r| r.image_id == id)
            .cloned()
            .collect();
        reforms.sort_by(|a, b| a.filter_id.cmp(&b.filter_id));
        reforms
    }

    fn remove_reform(&self, id: ImageId, filter_id: &str) -> Option<Reform> {
        self.records
            .lock()
            .reforms
            .remove(&(id, filter_id.to_string()))
    }
}
