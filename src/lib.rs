//! # Image Reform
//!
//! Source images and their derived renditions ("reforms"), generated on
//! demand by pluggable transformation filters and cached by
//! `(source image, filter identifier)`. Deletion follows a deterministic
//! file-lifecycle protocol: a rendition never outlives its source, and a
//! source file is only ever removed when its record says so.
//!
//! # Architecture: Three Interacting Pieces
//!
//! ```text
//! discover ──populates──▶ FilterRegistry ──resolves──▶ Filter
//!                                │
//! Materializer ──cache lookup────┤
//!      │                         │
//!      ├── RecordStore (rows, uniqueness on (image, filter))
//!      └── Storage     (bytes on disk)
//!
//! deletion ── enforces the lifecycle protocol on record removal
//! ```
//!
//! A caller asks the [`materialize::Materializer`] for "image X rendered
//! with filter F". On a hit the persisted [`models::Reform`] comes back
//! untouched; on a miss the filter identifier is resolved through the
//! [`registry::FilterRegistry`], the transform runs, and the new rendition
//! is written and recorded. The [`deletion`] coordinator runs whenever a
//! record is removed, independent of the read path.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`formats`] | Static format table: canonical keys, extensions, library names |
//! | [`module_path`] | Dotted-path value type for addressing plugin modules |
//! | [`discover`] | Best-effort scan of linked filter modules; triggers self-registration |
//! | [`registry`] | Process-wide identifier → filter mapping |
//! | [`filters`] | The `Filter` capability and built-in variants (Thumb, Crop, Resize) |
//! | [`models`] | `SourceImage` and `Reform` records, lazy file-backed metadata |
//! | [`store`] | `Storage` and `RecordStore` collaborator seams + implementations |
//! | [`materialize`] | Get-or-create orchestration, broken-image fallback |
//! | [`deletion`] | File-lifecycle protocol on record deletion |
//!
//! # Design Decisions
//!
//! ## Filters Are Cache Keys
//!
//! A filter's identifier encodes its parameter set (`thumb_100x100`), so
//! the pair `(image id, filter id)` fully determines a rendition. The
//! registry guarantees one implementation per identifier; the record store
//! guarantees one row per pair. Everything else — racing generations,
//! stale rows, regeneration — reduces to those two uniqueness rules.
//!
//! ## Registry Populated Once, Read Forever
//!
//! Filter registration happens during startup discovery; after that the
//! registry is read-mostly shared state behind a `RwLock`. Discovery is
//! best-effort by design: parents without a filter module are skipped
//! silently, while a broken filter implementation aborts loudly — a
//! missing module is normal, a non-conforming filter is a bug.
//!
//! ## Races Resolved at the Store, Not Around the Transform
//!
//! The image transform is the expensive step and deliberately runs outside
//! any lock. Two concurrent callers may both generate; the record store's
//! uniqueness constraint picks the single authoritative row and the loser
//! discards its file. Wasted CPU on a rare race beats serializing every
//! request through a mutex.

pub mod deletion;
pub mod discover;
pub mod filters;
pub mod formats;
pub mod materialize;
pub mod models;
pub mod module_path;
pub mod registry;
pub mod store;

pub use deletion::{on_reform_deleted, on_source_image_deleted};
pub use discover::{AppRegistry, DiscoverConfig, ProviderSet, StaticApps, discover};
pub use filters::{Crop, Filter, FilterError, FilterOutput, Resize, Thumb};
pub use formats::Format;
pub use materialize::{BROKEN_IMAGE_ASSET, Materializer, ReformError, StaticResolver};
pub use models::{AutoDelete, ImageError, ImageId, Reform, SourceImage};
pub use module_path::{ModulePath, PathError};
pub use registry::{FilterRegistry, RegistryError, registry};
pub use store::{FsStorage, MemoryStore, RecordStore, Storage, StoreError};

#[cfg(test)]
pub(crate) mod test_helpers;
