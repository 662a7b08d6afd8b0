//! Process-wide filter registry.
//!
//! Maps a stable string identifier to a [`Filter`] implementation. The
//! registry is populated during startup [discovery](crate::discover) and
//! treated as read-only afterwards — `resolve` results are only trustworthy
//! once registration is complete. That init-once lifecycle is a policy, not
//! a lock: the registry itself is safe to mutate at any time, it is the
//! caching contract (a filter identifier must mean the same thing for the
//! lifetime of the registry) that makes late mutation a configuration smell.
//!
//! Re-registering an identifier replaces the previous implementation (last
//! write wins) and logs a warning; see DESIGN.md for the rationale.

use crate::filters::Filter;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown filter: '{0}'")]
    UnknownFilter(String),
    #[error("invalid filter type: {0}")]
    InvalidFilterType(String),
}

/// Mapping from filter identifier to implementation.
///
/// Read-mostly shared state; a `RwLock` keeps `resolve` cheap on the hot
/// path while registrations (startup only) take the write lock.
pub struct FilterRegistry {
    filters: RwLock<HashMap<String, Arc<dyn Filter>>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self {
            filters: RwLock::new(HashMap::new()),
        }
    }

    /// Register a filter under its own identifier.
    ///
    /// Fails with [`RegistryError::InvalidFilterType`] if the identifier
    /// does not satisfy the capability contract (non-empty, `[a-z0-9_.-]`
    /// only — it must be stable and usable as a cache-key component).
    /// Re-registering an identifier replaces the prior implementation.
    pub fn register(&self, filter: Arc<dyn Filter>) -> Result<(), RegistryError> {
        let id = filter.id();
        if !valid_filter_id(&id) {
            return Err(RegistryError::InvalidFilterType(format!(
                "filter identifier '{id}' must be non-empty and contain only [a-z0-9_.-]"
            )));
        }
        let mut filters = self.filters.write();
        if filters.insert(id.clone(), filter).is_some() {
            warn!(filter = %id, "filter identifier re-registered; last registration wins");
        } else {
            debug!(filter = %id, "filter registered");
        }
        Ok(())
    }

    /// Resolve an identifier to its registered implementation.
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn Filter>, RegistryError> {
        self.filters
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownFilter(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.filters.read().contains_key(id)
    }

    /// Registered identifiers, sorted (for diagnostics and error messages).
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.filters.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.read().is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifiers double as cache-key components and filename inputs, so the
/// alphabet is restricted up front rather than sanitized downstream.
fn valid_filter_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'))
}

static REGISTRY: Lazy<FilterRegistry> = Lazy::new(FilterRegistry::new);

/// The process-wide registry.
///
/// Tests that need isolation should construct their own
/// [`FilterRegistry`] instead.
pub fn registry() -> &'static FilterRegistry {
    &REGISTRY
}
