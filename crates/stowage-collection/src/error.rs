use std::fmt;

use stowage_config::ConfigError;
use stowage_store::BackendError;
use thiserror::Error;

/// The collection operation that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Head,
    Exists,
    Load,
    Save,
    Delete,
    Find,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Head => "head",
            Self::Exists => "exists",
            Self::Load => "load",
            Self::Save => "save",
            Self::Delete => "delete",
            Self::Find => "find",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StowageError {
    /// The collection could not be configured. Raised only while building.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Nothing is stored under `key`. Only `load` reports a missing
    /// document as an error.
    #[error("document not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Any backend failure other than a missing object.
    #[error("{operation} failed for {bucket}/{key}: {source}")]
    Storage {
        operation: Operation,
        bucket: String,
        key: String,
        #[source]
        source: BackendError,
    },

    /// The document could not be encoded as JSON.
    #[error("failed to serialize document {key}: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The stored body does not decode into the document type.
    #[error("corrupt document {bucket}/{key}: {source}")]
    CorruptData {
        bucket: String,
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The backend rejected a continuation token. Restart the listing
    /// without a token.
    #[error("continuation token rejected while listing {bucket}/{prefix}: {source}")]
    Pagination {
        bucket: String,
        prefix: String,
        token: String,
        #[source]
        source: BackendError,
    },

    /// A document without an id was saved to a collection with no id
    /// generator.
    #[error("document in collection {collection} has no id and no id generator is configured")]
    MissingId { collection: String },

    /// A `load_many` task panicked or was cancelled.
    #[error("concurrent load failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StowageError {
    /// Returns `true` for [`StowageError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The operation a storage error came from, if any.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Storage { operation, .. } => Some(*operation),
            Self::Pagination { .. } => Some(Operation::Find),
            _ => None,
        }
    }
}

pub type StowageResult<T> = Result<T, StowageError>;
