//! Explicit type-to-collection registration.
//!
//! [`CollectionRegistry`] maps a lower-cased logical name to the
//! [`CollectionOptions`] registered for it. Registration happens up front,
//! before collections are built; lookups are plain reads.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::options::CollectionOptions;

/// Process-wide mapping from logical name to collection options.
#[derive(Debug, Default)]
pub struct CollectionRegistry {
    entries: RwLock<HashMap<String, CollectionOptions>>,
}

impl CollectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register options for `logical_name`, replacing any previous entry.
    ///
    /// When `options` carries no name, the lower-cased logical name is used,
    /// so registering a type is enough to give its collection a name.
    pub fn register(&self, logical_name: &str, mut options: CollectionOptions) {
        let key = logical_name.to_lowercase();
        if options.name.is_none() {
            options.name = Some(key.clone());
        }
        debug!(logical_name = %key, "registered collection");
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, options);
    }

    /// Look up the options registered for `logical_name` (case-insensitive).
    pub fn resolve(&self, logical_name: &str) -> Option<CollectionOptions> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&logical_name.to_lowercase())
            .cloned()
    }

    /// Sorted list of registered (lower-cased) names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = CollectionRegistry::new();
        registry.register("Users", CollectionOptions::named("users").with_page_size(100));

        let entry = registry.resolve("USERS").expect("registered");
        assert_eq!(entry.page_size, Some(100));
        assert_eq!(registry.names(), ["users"]);
    }

    #[test]
    fn miss_is_none() {
        let registry = CollectionRegistry::new();
        assert!(registry.resolve("nobody").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn unnamed_entry_takes_logical_name() {
        let registry = CollectionRegistry::new();
        registry.register("Invoice", CollectionOptions::default().with_page_size(5));
        assert_eq!(
            registry.resolve("invoice").and_then(|o| o.name).as_deref(),
            Some("invoice")
        );
    }

    #[test]
    fn register_replaces_previous_entry() {
        let registry = CollectionRegistry::new();
        registry.register("a", CollectionOptions::named("first"));
        registry.register("A", CollectionOptions::named("second"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("a").and_then(|o| o.name).as_deref(), Some("second"));
    }
}
