//! The file-lifecycle protocol: what happens on record deletion.
//!
//! Two rules keep generated files from outliving their source and source
//! files from being wiped against policy:
//!
//! - **Source image deleted** → every owned reform loses its file and its
//!   record, unconditionally. A reform with no live source is meaningless;
//!   its cache key can never legitimately be requested again. Only then is
//!   the image's own file considered: removed under
//!   [`AutoDelete::Yes`], left untouched under [`AutoDelete::No`].
//! - **Reform deleted directly** → its file goes with it. Reforms carry no
//!   keep-the-file policy; they are pure cache artifacts.
//!
//! Deletion is idempotent at the file level: a backing file that is
//! already gone counts as successfully deleted (the [`Storage`] contract),
//! so record removal always completes.

use crate::models::{AutoDelete, ImageError, Reform, SourceImage};
use crate::store::{RecordStore, Storage};
use tracing::debug;

/// Enforce the lifecycle protocol for a deleted source image.
///
/// Call after deciding to delete the record; this removes every owned
/// reform (file then record), applies the image's auto-delete policy to
/// its own file, and finally drops the image record.
pub fn on_source_image_deleted(
    image: &SourceImage,
    records: &dyn RecordStore,
    storage: &dyn Storage,
) -> Result<(), ImageError> {
    for reform in records.reforms_for(image.id) {
        storage.delete(&reform.src)?;
        records.remove_reform(reform.image_id, &reform.filter_id);
        debug!(image = %image.id, filter = %reform.filter_id, "reform removed with its source");
    }

    match image.auto_delete {
        AutoDelete::Yes => {
            if let Some(src) = image.src.as_deref() {
                storage.delete(src)?;
                debug!(image = %image.id, "source file removed (auto-delete)");
            }
        }
        AutoDelete::No => {
            debug!(image = %image.id, "source file preserved (policy)");
        }
    }

    records.remove_image(image.id);
    Ok(())
}

/// Enforce the lifecycle protocol for a directly deleted reform.
pub fn on_reform_deleted(
    reform: &Reform,
    records: &dyn RecordStore,
    storage: &dyn Storage,
) -> Result<(), ImageError> {
    storage.delete(&reform.src)?;
    records.remove_reform(reform.image_id, &reform.filter_id);
    debug!(image = %reform.image_id, filter = %reform.filter_id, "reform removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{Crop, Thumb};
    use crate::materialize::Materializer;
    use crate::models::ImageId;
    use crate::registry::FilterRegistry;
    use crate::store::{FsStorage, MemoryStore};
    use crate::test_helpers::jpeg_bytes;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        storage: FsStorage,
        records: MemoryStore,
        registry: FilterRegistry,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let storage = FsStorage::new(tmp.path());
            storage
                .write(Path::new("originals/test.jpg"), &jpeg_bytes(640, 480))
                .unwrap();
            let registry = FilterRegistry::new();
            registry
                .register(Arc::new(Thumb {
                    width: 100,
                    height: 100,
                }))
                .unwrap();
            registry
                .register(Arc::new(Crop {
                    width: 50,
                    height: 50,
                }))
                .unwrap();
            Self {
                _tmp: tmp,
                storage,
                records: MemoryStore::new(),
                registry,
            }
        }

        fn image(&self, auto_delete: AutoDelete) -> SourceImage {
            let image = SourceImage::new(ImageId(1), "originals/test.jpg", "Test image")
                .with_auto_delete(auto_delete);
            self.records.insert_image(image.clone()).unwrap();
            image
        }

        fn materialize(&self, image: &SourceImage, filter_id: &str) -> Reform {
            Materializer::new(&self.storage, &self.records, &self.registry)
                .get_or_create_reform(image, filter_id)
                .unwrap()
        }
    }

    #[test]
    fn preserving_image_still_removes_reform_files() {
        let fx = Fixture::new();
        let image = fx.image(AutoDelete::No);
        let reform = fx.materialize(&image, "thumb_100x100");
        assert!(fx.storage.exists(&reform.src));

        on_source_image_deleted(&image, &fx.records, &fx.storage).unwrap();

        // reform file and record gone, source file preserved
        assert!(!fx.storage.exists(&reform.src));
        assert_eq!(fx.records.reform_count(), 0);
        assert!(fx.storage.exists(Path::new("originals/test.jpg")));
        assert_eq!(fx.records.image(ImageId(1)), None);
    }

    #[test]
    fn auto_delete_removes_source_and_all_reform_files() {
        let fx = Fixture::new();
        let image = fx.image(AutoDelete::Yes);
        let thumb = fx.materialize(&image, "thumb_100x100");
        let crop = fx.materialize(&image, "crop_50x50");

        on_source_image_deleted(&image, &fx.records, &fx.storage).unwrap();

        assert!(!fx.storage.exists(&thumb.src));
        assert!(!fx.storage.exists(&crop.src));
        assert!(!fx.storage.exists(Path::new("originals/test.jpg")));
        assert_eq!(fx.records.reform_count(), 0);
        assert_eq!(fx.records.image_count(), 0);
    }

    #[test]
    fn deletion_tolerates_already_absent_files() {
        let fx = Fixture::new();
        let image = fx.image(AutoDelete::Yes);
        let reform = fx.materialize(&image, "thumb_100x100");

        // Both files removed out-of-band before the coordinator runs.
        fx.storage.delete(&reform.src).unwrap();
        fx.storage.delete(Path::new("originals/test.jpg")).unwrap();

        on_source_image_deleted(&image, &fx.records, &fx.storage).unwrap();
        assert_eq!(fx.records.reform_count(), 0);
        assert_eq!(fx.records.image_count(), 0);
    }

    #[test]
    fn detached_image_deletes_cleanly() {
        let fx = Fixture::new();
        let mut image = fx.image(AutoDelete::Yes);
        image.src = None;

        on_source_image_deleted(&image, &fx.records, &fx.storage).unwrap();
        assert_eq!(fx.records.image_count(), 0);
    }

    #[test]
    fn direct_reform_deletion_always_removes_the_file() {
        let fx = Fixture::new();
        let image = fx.image(AutoDelete::No);
        let reform = fx.materialize(&image, "thumb_100x100");

        on_reform_deleted(&reform, &fx.records, &fx.storage).unwrap();

        assert!(!fx.storage.exists(&reform.src));
        assert_eq!(fx.records.reform_count(), 0);
        // source untouched by a reform-only deletion
        assert!(fx.storage.exists(Path::new("originals/test.jpg")));
        assert_eq!(fx.records.image_count(), 1);
    }

    #[test]
    fn direct_reform_deletion_is_idempotent() {
        let fx = Fixture::new();
        let image = fx.image(AutoDelete::No);
        let reform = fx.materialize(&image, "thumb_100x100");

        on_reform_deleted(&reform, &fx.records, &fx.storage).unwrap();
        on_reform_deleted(&reform, &fx.records, &fx.storage).unwrap();
        assert_eq!(fx.records.reform_count(), 0);
    }
}
