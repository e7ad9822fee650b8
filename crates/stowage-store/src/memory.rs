use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{BackendError, BackendResult};
use crate::object::{
    paginate, ListPage, ListRequest, ObjectMetadata, ObjectSummary, Tags, DEFAULT_MAX_PAGE_SIZE,
};
use crate::traits::ObjectBackend;

#[derive(Clone, Debug)]
struct StoredEntry {
    body: Bytes,
    metadata: ObjectMetadata,
}

type Bucket = BTreeMap<String, StoredEntry>;

/// In-memory object backend.
///
/// Intended for tests and embedding. Buckets are created on first write and
/// keys are kept in a `BTreeMap` so listings come out in lexicographic order.
pub struct InMemoryBackend {
    buckets: RwLock<HashMap<String, Bucket>>,
    max_page_size: usize,
}

impl InMemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    /// Create a backend that never returns more than `max_page_size` entries per page.
    pub fn with_max_page_size(max_page_size: usize) -> Self {
        Self {
            max_page_size: max_page_size.max(1),
            ..Self::new()
        }
    }

    fn read_lock(&self) -> BackendResult<RwLockReadGuard<'_, HashMap<String, Bucket>>> {
        self.buckets
            .read()
            .map_err(|e| BackendError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write_lock(&self) -> BackendResult<RwLockWriteGuard<'_, HashMap<String, Bucket>>> {
        self.buckets
            .write()
            .map_err(|e| BackendError::Unavailable(format!("lock poisoned: {e}")))
    }

    /// Total number of objects across all buckets.
    pub fn len(&self) -> usize {
        self.read_lock()
            .map(|buckets| buckets.values().map(BTreeMap::len).sum())
            .unwrap_or(0)
    }

    /// Returns `true` if no bucket holds any object.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted keys stored in `bucket`.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.read_lock()
            .map(|buckets| {
                buckets
                    .get(bucket)
                    .map(|b| b.keys().cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Names of all buckets that have been written to.
    pub fn bucket_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read_lock()
            .map(|buckets| buckets.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Remove every bucket and object.
    pub fn clear(&self) {
        if let Ok(mut buckets) = self.write_lock() {
            buckets.clear();
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectBackend for InMemoryBackend {
    async fn head_object(&self, bucket: &str, key: &str) -> BackendResult<Option<ObjectMetadata>> {
        let buckets = self.read_lock()?;
        Ok(buckets
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|entry| entry.metadata.clone()))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Option<Bytes>> {
        let buckets = self.read_lock()?;
        Ok(buckets
            .get(bucket)
            .and_then(|b| b.get(key))
            .map(|entry| entry.body.clone()))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        tags: &Tags,
    ) -> BackendResult<ObjectMetadata> {
        if key.is_empty() {
            return Err(BackendError::InvalidKey {
                key: key.to_string(),
                reason: "key must not be empty".into(),
            });
        }
        let metadata = ObjectMetadata::describe(&body, tags);
        let mut buckets = self.write_lock()?;
        buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredEntry {
                body,
                metadata: metadata.clone(),
            },
        );
        Ok(metadata)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<bool> {
        let mut buckets = self.write_lock()?;
        Ok(buckets
            .get_mut(bucket)
            .map(|b| b.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn list_objects(&self, bucket: &str, request: &ListRequest) -> BackendResult<ListPage> {
        let buckets = self.read_lock()?;
        let Some(entries) = buckets.get(bucket) else {
            // An unknown bucket still has to reject a bad token.
            paginate(std::iter::empty::<(String, ())>(), request, self.max_page_size)?;
            return Ok(ListPage::default());
        };
        let sorted = entries
            .range(request.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&request.prefix))
            .map(|(key, entry)| (key.clone(), entry.metadata.clone()));
        let (page, next_token) = paginate(sorted, request, self.max_page_size)?;
        Ok(ListPage {
            items: page
                .into_iter()
                .map(|(key, metadata)| ObjectSummary { key, metadata })
                .collect(),
            next_token,
        })
    }

    fn max_page_size(&self) -> usize {
        self.max_page_size
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("object_count", &self.len())
            .field("max_page_size", &self.max_page_size)
            .finish()
    }
}
