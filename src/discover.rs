//! Best-effort filter-module discovery.
//!
//! Filters self-register by living in a conventionally-named module (e.g.
//! `image_filters`) under each application. At startup, discovery builds
//! the candidate parent list — the explicitly configured parents plus every
//! registered application name — and for each `(parent, module_name)` pair
//! attempts to load `parent.module_name`.
//!
//! Rust links code statically, so "loading a module" cannot be a runtime
//! import. Instead, each discoverable module is declared up front in a
//! [`ProviderSet`]: a mapping from its dotted [`ModulePath`] to an
//! initializer function whose body performs the registration calls that
//! would otherwise sit at module top level. Discovery then walks the
//! candidates against that table.
//!
//! Partial failure is the normal case: most parents do not contain every
//! named submodule, so a candidate absent from the provider set is skipped
//! silently by design. A *registration* failure inside a present candidate
//! is different — it means a broken filter implementation, and discovery
//! aborts loudly rather than silently shipping a partial registry.

use crate::module_path::ModulePath;
use crate::registry::{FilterRegistry, RegistryError};
use tracing::debug;

/// Initializer run when a discoverable module is "loaded".
pub type InitFn = fn(&FilterRegistry) -> Result<(), RegistryError>;

/// Host application registry: names of every registered application.
pub trait AppRegistry: Sync {
    fn app_names(&self) -> Vec<String>;
}

/// `AppRegistry` backed by a fixed list.
pub struct StaticApps(Vec<String>);

impl StaticApps {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

impl AppRegistry for StaticApps {
    fn app_names(&self) -> Vec<String> {
        self.0.clone()
    }
}

/// App-name prefix treated as belonging to the host framework itself.
///
/// With `exclude_framework` set, apps under this prefix are dropped from
/// the candidate list so the framework's own packages are not scanned.
pub const FRAMEWORK_PREFIX: &str = "image_reform";

/// The set of filter modules linked into this process.
///
/// Order is preserved: discovery reports loads in attempt order, and the
/// provider table is the authority on which modules exist at all.
#[derive(Default)]
pub struct ProviderSet {
    providers: Vec<(ModulePath, InitFn)>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a discoverable module. Builder-style.
    pub fn provide(mut self, path: ModulePath, init: InitFn) -> Self {
        self.providers.push((path, init));
        self
    }

    fn get(&self, path: &ModulePath) -> Option<InitFn> {
        self.providers
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, init)| *init)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// What to scan and where.
pub struct DiscoverConfig<'a> {
    /// Conventional submodule names to look for under each parent,
    /// e.g. `["image_filters"]`.
    pub module_names: Vec<String>,
    /// Hardcoded parent paths searched before any registered apps.
    pub parents: Vec<ModulePath>,
    /// Host application registry to extend the parent list with, if any.
    pub apps: Option<&'a dyn AppRegistry>,
    /// Drop app names under [`FRAMEWORK_PREFIX`] from the candidate list.
    pub exclude_framework: bool,
}

impl DiscoverConfig<'_> {
    /// Scan only the given explicit parents.
    pub fn with_parents(module_names: Vec<String>, parents: Vec<ModulePath>) -> Self {
        Self {
            module_names,
            parents,
            apps: None,
            exclude_framework: false,
        }
    }
}

/// Walk every `(parent, module_name)` candidate and run the initializer of
/// each one present in `providers`.
///
/// Returns the successfully loaded module paths in attempt order. Absent
/// candidates are skipped silently; registration failures propagate.
pub fn discover(
    config: &DiscoverConfig<'_>,
    providers: &ProviderSet,
    registry: &FilterRegistry,
) -> Result<Vec<ModulePath>, RegistryError> {
    let mut parents = config.parents.clone();
    if let Some(apps) = config.apps {
        for name in apps.app_names() {
            if config.exclude_framework && name.starts_with(FRAMEWORK_PREFIX) {
                continue;
            }
            // A malformed app name cannot contain a filter module; skip it
            // like any other absent candidate.
            if let Ok(path) = ModulePath::parse(&name) {
                parents.push(path);
            }
        }
    }

    let mut loaded = Vec::new();
    for parent in &parents {
        for name in &config.module_names {
            let candidate = parent.extend(name);
            if let Some(init) = providers.get(&candidate) {
                init(registry)?;
                debug!(module = %candidate, "filter module loaded");
                loaded.push(candidate);
            }
        }
    }
    Ok(loaded)
}
