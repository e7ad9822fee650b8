use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendResult;
use crate::object::{ListPage, ListRequest, ObjectMetadata, Tags, DEFAULT_MAX_PAGE_SIZE};

/// Keyed object storage client.
///
/// All implementations must satisfy these invariants:
/// - Every operation except `put_object` is idempotent. `put_object`
///   overwrites whatever is stored under the key.
/// - A missing object is reported as `Ok(None)` / `Ok(false)`, never as `Err`.
/// - Listings return keys in lexicographic order and continuation tokens
///   resume exactly after the last key of the previous page.
/// - Implementations are safe for concurrent use; callers share one handle.
/// - No operation retries internally unless the implementation documents it.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Fetch an object's metadata without its body.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    async fn head_object(&self, bucket: &str, key: &str) -> BackendResult<Option<ObjectMetadata>>;

    /// Fetch an object's body.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Option<Bytes>>;

    /// Store `body` under `key`, replacing any previous object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        tags: &Tags,
    ) -> BackendResult<ObjectMetadata>;

    /// Delete an object. Returns `true` if the object existed.
    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<bool>;

    /// List one page of objects whose keys start with `request.prefix`.
    async fn list_objects(&self, bucket: &str, request: &ListRequest) -> BackendResult<ListPage>;

    /// Largest page a single `list_objects` call returns.
    fn max_page_size(&self) -> usize {
        DEFAULT_MAX_PAGE_SIZE
    }
}
