//! Behavior units: one free function per collection verb.
//!
//! Each behavior takes the shared [`BehaviorContext`] of a collection,
//! derives the storage key, makes exactly one kind of backend call, and maps
//! the outcome. Behaviors hold no state of their own and never retry.

mod find;
mod read;
mod write;

use std::fmt;
use std::sync::Arc;

use stowage_config::CollectionConfig;
use stowage_store::{BackendError, ObjectBackend};

use crate::error::{Operation, StowageError};
use crate::key::{compose_prefix, to_key};

pub use find::{find, find_all};
pub use read::{exists, head, load};
pub use write::{delete, save};

/// Everything a behavior needs, resolved once when the collection is built.
#[derive(Clone)]
pub struct BehaviorContext {
    backend: Arc<dyn ObjectBackend>,
    config: Arc<CollectionConfig>,
    bucket: Arc<str>,
    prefix: String,
}

impl BehaviorContext {
    pub fn new(
        backend: Arc<dyn ObjectBackend>,
        config: Arc<CollectionConfig>,
        bucket: impl Into<Arc<str>>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            config,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn ObjectBackend> {
        &self.backend
    }

    /// Storage key of `id` in this context.
    pub fn key(&self, id: &str) -> String {
        to_key(id, &self.prefix)
    }

    /// The same context scoped under `child` (appended to the current prefix).
    pub fn scoped(&self, child: &str) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            bucket: Arc::clone(&self.bucket),
            prefix: compose_prefix(&self.prefix, child),
        }
    }

    fn storage_error(&self, operation: Operation, key: &str, source: BackendError) -> StowageError {
        StowageError::Storage {
            operation,
            bucket: self.bucket.to_string(),
            key: key.to_string(),
            source,
        }
    }
}

impl fmt::Debug for BehaviorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorContext")
            .field("collection", &self.config.name)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .finish()
    }
}
