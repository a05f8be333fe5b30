//! The method registry: a name → descriptor map.
//!
//! The default registry is a process-wide singleton populated with the
//! built-in `"deflate"` and `"gzip"` methods before the first lookup
//! returns. Additional registries can be created explicitly, e.g. for tests
//! that register their own methods. Registration is idempotent: registering
//! a name that already exists succeeds and changes nothing.

use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use crate::error::Result;
use crate::method::Method;

/// A registry of compression methods.
///
/// Lookups may run concurrently; registration is serialized behind a writer
/// lock. Handles hold `&'static Method` references resolved at creation
/// time, so a registry can be dropped while its methods remain usable.
#[derive(Default)]
pub struct Registry {
    methods: RwLock<HashMap<&'static str, &'static Method>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Register a method. Duplicate names are a no-op, not an error.
    pub fn register(&self, method: &'static Method) -> Result<()> {
        let mut methods = self
            .methods
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        methods.entry(method.name).or_insert(method);
        Ok(())
    }

    /// Look up a method by its case-sensitive name.
    pub fn find(&self, name: &str) -> Option<&'static Method> {
        let methods = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        methods.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let methods = self
            .methods
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<&str> = methods.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("methods", &names).finish()
    }
}

static DEFAULT_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The default registry, with the built-in methods already registered.
pub fn default_registry() -> &'static Registry {
    DEFAULT_REGISTRY.get_or_init(|| {
        let registry = Registry::new();
        // Built-in registrations cannot fail; ignore the idempotent results.
        let _ = registry.register(&crate::deflate::METHOD);
        let _ = registry.register(&crate::gzip::METHOD);
        registry
    })
}
