use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::registry::CollectionRegistry;

/// Default listing page size of a collection.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// A partial collection configuration.
///
/// Options come from three layers: system defaults, the registry entry for
/// the collection's logical name, and the caller. Unset fields fall through
/// to the layer below; `tags` and `options` merge key by key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionOptions {
    /// Collection name, substituted for `{{bucketName}}`.
    pub name: Option<String>,
    /// Default page size for listings.
    pub page_size: Option<usize>,
    /// Bucket pattern overriding the process-wide one.
    pub bucket_pattern: Option<String>,
    /// Tags attached to every object the collection writes.
    pub tags: BTreeMap<String, String>,
    /// Arbitrary collection-level options.
    pub options: BTreeMap<String, Value>,
}

impl CollectionOptions {
    /// The system defaults layer.
    pub fn defaults() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            ..Self::default()
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_bucket_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.bucket_pattern = Some(pattern.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Lay `upper` over `self`; values set in `upper` win.
    pub fn overlay(mut self, upper: &CollectionOptions) -> Self {
        if let Some(ref name) = upper.name {
            self.name = Some(name.clone());
        }
        if let Some(page_size) = upper.page_size {
            self.page_size = Some(page_size);
        }
        if let Some(ref pattern) = upper.bucket_pattern {
            self.bucket_pattern = Some(pattern.clone());
        }
        self.tags
            .extend(upper.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.options
            .extend(upper.options.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }
}

/// The effective, immutable configuration of one collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectionConfig {
    /// Collection name; never empty.
    pub name: String,
    /// Logical type tag the collection was bound with.
    pub type_name: String,
    /// Default page size for listings; never zero.
    pub page_size: usize,
    /// Bucket pattern override, if any.
    pub bucket_pattern: Option<String>,
    /// Tags attached to every written object.
    pub tags: BTreeMap<String, String>,
    /// Arbitrary collection-level options.
    pub options: BTreeMap<String, Value>,
}

impl CollectionConfig {
    /// Look up a collection-level option.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

/// Resolve the effective configuration for `logical_name`.
///
/// Precedence, lowest first: [`CollectionOptions::defaults`], the registry
/// entry for `logical_name` (looked up lower-cased; a miss is not an error),
/// then `overrides`.
///
/// Fails with [`ConfigError::MissingName`] if no layer supplies a non-empty
/// name, and with [`ConfigError::InvalidValue`] for a zero page size.
pub fn resolve(
    logical_name: &str,
    registry: &CollectionRegistry,
    overrides: &CollectionOptions,
) -> ConfigResult<CollectionConfig> {
    let registered = registry.resolve(logical_name);
    debug!(
        logical_name,
        registered = registered.is_some(),
        "resolving collection configuration"
    );

    let mut merged = CollectionOptions::defaults();
    if let Some(ref entry) = registered {
        merged = merged.overlay(entry);
    }
    let merged = merged.overlay(overrides);

    let name = merged
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ConfigError::MissingName {
            logical_name: logical_name.to_string(),
        })?;

    let page_size = merged.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        return Err(ConfigError::InvalidValue {
            field: "page_size".into(),
            reason: format!("collection {name:?} must list at least one entry per page"),
        });
    }

    Ok(CollectionConfig {
        name,
        type_name: logical_name.to_string(),
        page_size,
        bucket_pattern: merged.bucket_pattern,
        tags: merged.tags,
        options: merged.options,
    })
}
