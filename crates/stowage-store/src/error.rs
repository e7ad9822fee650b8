/// Errors from object backend operations.
///
/// A missing object is not an error at this layer: lookups return `None`
/// and deletes return `false`.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The key cannot be stored by this backend.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The bucket name cannot be used by this backend.
    #[error("invalid bucket name {bucket:?}: {reason}")]
    InvalidBucket { bucket: String, reason: String },

    /// A continuation token was malformed, expired, or issued for another listing.
    #[error("invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    /// Stored metadata could not be decoded.
    #[error("corrupt metadata for {key}: {reason}")]
    Metadata { key: String, reason: String },

    /// The backend cannot serve requests right now.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying storage medium.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Returns `true` if the error is a rejected continuation token.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidContinuationToken(_))
    }
}

/// Result alias for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
