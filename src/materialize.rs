//! Reform materialization: return a cached rendition or generate one.
//!
//! The [`Materializer`] is the orchestration point of the crate. Given a
//! source image and a filter identifier it:
//!
//! 1. Fails with `SourceFileUnavailable` when the source file is missing
//!    or unreadable — no generation runs against a broken source.
//! 2. Returns the existing reform when a record for `(image, filter)`
//!    exists and its backing file is still on disk (cache hit — the
//!    transform does not run again).
//! 3. Otherwise resolves the filter through the registry, applies it,
//!    writes the result under a path scoped to the source image
//!    (`reforms/<image id>/…`, so one image's renditions can be bulk
//!    removed), and persists the record.
//!
//! ## Racing generations
//!
//! The transform is deliberately not held under a lock: two callers may
//! both miss and both generate. Correctness rests on the record store's
//! `(image, filter)` uniqueness — the loser's insert comes back with the
//! winning row, its freshly generated file is discarded, and the winner is
//! returned. Duplicate generation is wasted work, never a second row.
//!
//! ## Broken-image fallback
//!
//! [`Materializer::get_or_create_or_broken`] is the rendering-layer
//! convenience: on `SourceFileUnavailable` it substitutes an unpersisted
//! [`Reform::broken`] pointing at a well-known static asset instead of
//! failing the whole page. The substitute is never written anywhere.

use crate::filters::FilterError;
use crate::formats::Format;
use crate::models::{ImageError, Reform, SourceImage};
use crate::registry::{FilterRegistry, RegistryError};
use crate::store::{RecordStore, Storage, StoreError};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum ReformError {
    /// Includes `SourceFileUnavailable`; see [`ReformError::is_source_unavailable`].
    #[error(transparent)]
    Image(#[from] ImageError),
    /// Includes `UnknownFilter` for unregistered identifiers.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("filter '{filter}' failed: {source}")]
    Filter {
        filter: String,
        source: FilterError,
    },
    #[error("storage error: {0}")]
    Storage(#[source] std::io::Error),
    #[error("record store error: {0}")]
    Records(#[source] StoreError),
}

impl ReformError {
    /// True when the failure means "the source image has no usable file" —
    /// the one condition the broken-image fallback recovers from.
    pub fn is_source_unavailable(&self) -> bool {
        matches!(
            self,
            ReformError::Image(ImageError::SourceFileUnavailable { .. })
        )
    }
}

/// Resolves a relative static-asset path to an absolute path or URL.
pub trait StaticResolver: Sync {
    fn resolve_static(&self, path: &str) -> String;
}

/// Static asset served in place of a reform whose source file is gone.
pub const BROKEN_IMAGE_ASSET: &str = "image/unfound.png";

/// Pass absolute paths and URLs through unchanged; hand anything relative
/// to the resolver.
pub fn static_aware(resolver: &dyn StaticResolver, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with('/') {
        path.to_string()
    } else {
        resolver.resolve_static(path)
    }
}

/// Orchestrates cache lookup, generation, and persistence of reforms.
pub struct Materializer<'a> {
    storage: &'a dyn Storage,
    records: &'a dyn RecordStore,
    registry: &'a FilterRegistry,
}

impl<'a> Materializer<'a> {
    pub fn new(
        storage: &'a dyn Storage,
        records: &'a dyn RecordStore,
        registry: &'a FilterRegistry,
    ) -> Self {
        Self {
            storage,
            records,
            registry,
        }
    }

    /// Return the cached reform for `(image, filter_id)`, generating and
    /// persisting it first if necessary.
    pub fn get_or_create_reform(
        &self,
        image: &SourceImage,
        filter_id: &str,
    ) -> Result<Reform, ReformError> {
        let src = image
            .src
            .as_deref()
            .ok_or_else(|| ImageError::unavailable("<unset>"))?;
        if !self.storage.exists(src) {
            return Err(ImageError::unavailable(src).into());
        }

        if let Some(existing) = self.records.find_reform(image.id, filter_id) {
            if self.storage.exists(&existing.src) {
                debug!(image = %image.id, filter = filter_id, "reform cache hit");
                return Ok(existing);
            }
            // Backing file vanished out-of-band: the row is stale. Drop it
            // and regenerate.
            warn!(image = %image.id, filter = filter_id, "reform file missing; regenerating");
            self.records.remove_reform(image.id, filter_id);
        }

        let filter = self.registry.resolve(filter_id)?;
        let format = image.format().ok_or_else(|| {
            ImageError::Decode(format!("unrecognized extension: {}", src.display()))
        })?;
        let source_bytes = image.read_source(self.storage)?;

        let output = filter
            .apply(&source_bytes, format)
            .map_err(|source| ReformError::Filter {
                filter: filter_id.to_string(),
                source,
            })?;

        let dest = reform_path(image, filter_id, output.format);
        self.storage
            .write(&dest, &output.bytes)
            .map_err(ReformError::Storage)?;

        let reform = Reform {
            image_id: image.id,
            filter_id: filter_id.to_string(),
            src: dest.clone(),
            width: output.width,
            height: output.height,
        };
        match self.records.insert_reform(reform) {
            Ok(reform) => {
                debug!(
                    image = %image.id,
                    filter = filter_id,
                    path = %reform.src.display(),
                    "reform generated"
                );
                Ok(reform)
            }
            Err(StoreError::ReformExists(winner)) => {
                // Someone else cached it between our miss and our insert.
                // Keep their artifact; discard ours unless both landed on
                // the same (deterministic) path.
                warn!(image = %image.id, filter = filter_id, "lost reform insert race");
                if winner.src != dest {
                    self.storage.delete(&dest).map_err(ReformError::Storage)?;
                }
                Ok(winner)
            }
            Err(e) => Err(ReformError::Records(e)),
        }
    }

    /// Like [`get_or_create_reform`](Self::get_or_create_reform), but a
    /// missing source file yields an unpersisted broken-image placeholder
    /// instead of an error. All other failures propagate.
    pub fn get_or_create_or_broken(
        &self,
        image: &SourceImage,
        filter_id: &str,
        resolver: &dyn StaticResolver,
    ) -> Result<Reform, ReformError> {
        match self.get_or_create_reform(image, filter_id) {
            Err(e) if e.is_source_unavailable() => {
                debug!(image = %image.id, filter = filter_id, "source unavailable; serving broken image");
                Ok(Reform::broken(
                    image.id,
                    filter_id,
                    static_aware(resolver, BROKEN_IMAGE_ASSET),
                ))
            }
            other => other,
        }
    }
}

/// Derived storage path for a reform.
///
/// Scoped under `reforms/<image id>/` so each image's renditions are
/// collocated. The file name carries a short digest of the filter
/// identifier rather than the identifier itself, keeping names
/// filesystem-safe regardless of the identifier alphabet.
fn reform_path(image: &SourceImage, filter_id: &str, format: Format) -> PathBuf {
    let stem = image
        .src
        .as_deref()
        .and_then(Path::file_stem)
        .and_then(|s| s.to_str())
        .unwrap_or("reform");
    PathBuf::from(format!(
        "reforms/{}/{}-{}.{}",
        image.id,
        stem,
        filter_digest(filter_id),
        format.extension()
    ))
}

/// First 8 hex chars of SHA-256 of the filter identifier.
fn filter_digest(filter_id: &str) -> String {
    let digest = Sha256::digest(filter_id.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(8);
    hex
}
