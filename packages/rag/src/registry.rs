//! Explicit registration of [`LanguageProfile`]s by file extension.
//!
//! The registry is constructed, not discovered: callers build it once
//! (typically via [`SymbolResolverRegistry::with_defaults`]) and register
//! any additional profiles before handing it to the orchestrator. There is
//! no package-scope side-effect registration to reason about.

use std::collections::HashMap;

use crate::profile::{self, LanguageProfile};

#[derive(Clone, Default)]
pub struct SymbolResolverRegistry {
    profiles: HashMap<&'static str, LanguageProfile>,
}

impl SymbolResolverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in Go, Rust, Python, and JavaScript/TypeScript profiles.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(profile::go());
        registry.register(profile::rust());
        registry.register(profile::python());
        registry.register(profile::javascript());
        registry
    }

    /// Register `profile` for every extension it covers, overwriting any
    /// existing registration for that extension.
    pub fn register(&mut self, profile: LanguageProfile) {
        for ext in profile.extensions {
            self.profiles.insert(ext, profile.clone());
        }
    }

    /// Look up the profile for `file_path` by its extension.
    #[must_use]
    pub fn resolve(&self, file_path: &str) -> Option<&LanguageProfile> {
        let ext = file_path.rsplit('.').next()?;
        self.profiles.get(ext.to_lowercase().as_str()).or_else(|| {
            self.profiles
                .values()
                .find(|p| p.matches_extension(ext))
        })
    }
}
