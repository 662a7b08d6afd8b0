//! The filter capability: transform source bytes into a rendition.
//!
//! A [`Filter`] is a pure function of its inputs — same bytes, same
//! parameters, same result. That purity is what makes filter output safe to
//! cache: the [registry](crate::registry) hands out filters by a stable
//! identifier, and the identifier (which encodes the parameter set) is part
//! of every reform's cache key.
//!
//! The module is split into:
//! - **The capability**: the [`Filter`] trait and [`FilterOutput`]
//! - **Built-ins**: [`Thumb`], [`Crop`], [`Resize`] in [`builtin`]

pub mod builtin;

pub use builtin::{Crop, Resize, Thumb};

use crate::formats::Format;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode reform: {0}")]
    Encode(#[source] image::ImageError),
}

/// Result of applying a filter: encoded bytes plus resulting metadata.
#[derive(Debug, Clone)]
pub struct FilterOutput {
    pub bytes: Vec<u8>,
    pub format: Format,
    pub width: u32,
    pub height: u32,
}

/// A transformation from source image bytes to rendition bytes.
///
/// Implementations carry their own parameters (a `Thumb { width, height }`
/// is one filter; a different box is a different filter) and must be
/// stateless beyond them.
pub trait Filter: Send + Sync {
    /// Stable identifier under which this filter is registered.
    ///
    /// Must encode the parameter set so that equal identifiers imply equal
    /// behavior — the identifier is used verbatim as a cache-key component.
    /// Restricted to `[a-z0-9_.-]`; enforced at registration time.
    fn id(&self) -> String;

    /// Transform source bytes into rendition bytes.
    fn apply(&self, source: &[u8], format: Format) -> Result<FilterOutput, FilterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::jpeg_bytes;

    #[test]
    fn filter_objects_are_usable_through_dyn() {
        let filter: Box<dyn Filter> = Box::new(Thumb {
            width: 10,
            height: 10,
        });
        let out = filter.apply(&jpeg_bytes(40, 20), Format::Jpg).unwrap();
        assert_eq!(out.format, Format::Jpg);
        assert!(out.width <= 10 && out.height <= 10);
    }
}
