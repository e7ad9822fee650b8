use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BackendError, BackendResult};

/// Custom key-value tags attached to a stored object.
pub type Tags = BTreeMap<String, String>;

/// Page size ceiling used by backends that do not declare their own.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 1000;

/// Backend-reported descriptor of a stored object.
///
/// This is a read-only snapshot of backend state at the time of the call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Body size in bytes.
    pub size: u64,
    /// Time of the last successful write.
    pub last_modified: DateTime<Utc>,
    /// Content hash of the body (hex-encoded BLAKE3).
    pub etag: String,
    /// Custom tags supplied at write time.
    #[serde(default)]
    pub tags: Tags,
}

impl ObjectMetadata {
    /// Describe a body that is being written now.
    pub fn describe(body: &[u8], tags: &Tags) -> Self {
        Self {
            size: body.len() as u64,
            last_modified: Utc::now(),
            etag: content_etag(body),
            tags: tags.clone(),
        }
    }
}

/// Compute the etag for a body.
pub fn content_etag(body: &[u8]) -> String {
    blake3::hash(body).to_hex().to_string()
}

/// One entry of a listing: a key and its metadata, without the body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub metadata: ObjectMetadata,
}

/// Parameters of a single `list_objects` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Only keys starting with this prefix are listed.
    pub prefix: String,
    /// Maximum number of entries to return. `None` means the backend maximum.
    pub page_size: Option<usize>,
    /// Token returned by the previous page, if resuming.
    pub continuation_token: Option<String>,
}

impl ListRequest {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Effective page size for a backend with the given ceiling.
    pub fn effective_page_size(&self, max: usize) -> usize {
        self.page_size.unwrap_or(max).clamp(1, max.max(1))
    }
}

/// One page of a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Entries in lexicographic key order.
    pub items: Vec<ObjectSummary>,
    /// Present iff more entries exist after this page.
    pub next_token: Option<String>,
}

/// Encode the last key of a page as an opaque continuation token.
pub fn encode_token(last_key: &str) -> String {
    hex::encode(last_key.as_bytes())
}

/// Decode a continuation token back into the key it resumes after.
pub fn decode_token(token: &str) -> BackendResult<String> {
    let bytes =
        hex::decode(token).map_err(|e| BackendError::InvalidContinuationToken(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| BackendError::InvalidContinuationToken(e.to_string()))
}

/// Select one page from entries that are already sorted by key.
///
/// Entries outside `request.prefix` or at/before the token position are
/// skipped. A token is only issued when at least one more matching entry
/// follows the page.
pub fn paginate<T>(
    sorted: impl IntoIterator<Item = (String, T)>,
    request: &ListRequest,
    max_page_size: usize,
) -> BackendResult<(Vec<(String, T)>, Option<String>)> {
    let start_after = request
        .continuation_token
        .as_deref()
        .map(decode_token)
        .transpose()?;
    if let Some(ref after) = start_after {
        if !after.starts_with(&request.prefix) {
            return Err(BackendError::InvalidContinuationToken(format!(
                "token does not belong to prefix {:?}",
                request.prefix
            )));
        }
    }

    let limit = request.effective_page_size(max_page_size);
    let mut matching = sorted
        .into_iter()
        .filter(|(key, _)| key.starts_with(&request.prefix))
        .filter(|(key, _)| start_after.as_deref().map_or(true, |after| key.as_str() > after))
        .peekable();

    let mut page = Vec::with_capacity(limit.min(64));
    while page.len() < limit {
        match matching.next() {
            Some(entry) => page.push(entry),
            None => break,
        }
    }

    let next_token = match (matching.peek(), page.last()) {
        (Some(_), Some((last, _))) => Some(encode_token(last)),
        _ => None,
    };
    Ok((page, next_token))
}
