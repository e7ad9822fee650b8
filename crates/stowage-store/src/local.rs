//! Directory-backed object backend.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/<bucket>/<hex(key)>.obj    object body
//! <root>/<bucket>/<hex(key)>.meta   JSON-encoded ObjectMetadata
//! ```
//!
//! Keys are hex-encoded so that any UTF-8 key maps to a single flat file
//! name. Bodies are written to a temporary file and renamed into place, so a
//! reader never observes a torn body.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{BackendError, BackendResult};
use crate::object::{
    content_etag, paginate, ListPage, ListRequest, ObjectMetadata, ObjectSummary, Tags,
    DEFAULT_MAX_PAGE_SIZE,
};
use crate::traits::ObjectBackend;

/// Longest key (in bytes) that still fits a file name once hex-encoded.
pub const MAX_KEY_BYTES: usize = 120;

const BODY_EXT: &str = "obj";
const META_EXT: &str = "meta";
const TEMP_EXT: &str = "tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object backend storing each bucket as a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalBackend {
    root: PathBuf,
    max_page_size: usize,
}

impl LocalBackend {
    /// Use `root` as the parent directory of all buckets.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }

    pub fn with_max_page_size(mut self, max_page_size: usize) -> Self {
        self.max_page_size = max_page_size.max(1);
        self
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> BackendResult<PathBuf> {
        let invalid = |reason: &str| BackendError::InvalidBucket {
            bucket: bucket.to_string(),
            reason: reason.to_string(),
        };
        if bucket.is_empty() {
            return Err(invalid("bucket name must not be empty"));
        }
        if bucket == "." || bucket == ".." {
            return Err(invalid("bucket name must not be a relative path component"));
        }
        if bucket.contains(['/', '\\', '\0']) {
            return Err(invalid("bucket name must not contain path separators"));
        }
        Ok(self.root.join(bucket))
    }

    fn object_paths(&self, bucket: &str, key: &str) -> BackendResult<ObjectPaths> {
        if key.is_empty() {
            return Err(BackendError::InvalidKey {
                key: key.to_string(),
                reason: "key must not be empty".into(),
            });
        }
        if key.len() > MAX_KEY_BYTES {
            return Err(BackendError::InvalidKey {
                key: key.to_string(),
                reason: format!("key exceeds {MAX_KEY_BYTES} bytes"),
            });
        }
        let dir = self.bucket_dir(bucket)?;
        let stem = hex::encode(key.as_bytes());
        Ok(ObjectPaths {
            body: dir.join(format!("{stem}.{BODY_EXT}")),
            meta: dir.join(format!("{stem}.{META_EXT}")),
            stem,
            dir,
        })
    }

    /// Read the metadata sidecar, rebuilding it from the body if the sidecar
    /// is missing or unreadable.
    async fn read_metadata(&self, key: &str, paths: &ObjectPaths) -> BackendResult<Option<ObjectMetadata>> {
        let body_meta = match fs::metadata(&paths.body).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match fs::read(&paths.meta).await {
            Ok(raw) => match serde_json::from_slice::<ObjectMetadata>(&raw) {
                Ok(meta) => return Ok(Some(meta)),
                Err(e) => warn!(key, error = %e, "unreadable metadata sidecar; rebuilding"),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(key, "missing metadata sidecar; rebuilding")
            }
            Err(e) => return Err(e.into()),
        }

        let body = match fs::read(&paths.body).await {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let last_modified = body_meta
            .modified()
            .map(chrono::DateTime::<chrono::Utc>::from)
            .unwrap_or_else(|_| chrono::Utc::now());
        Ok(Some(ObjectMetadata {
            size: body.len() as u64,
            last_modified,
            etag: content_etag(&body),
            tags: Tags::new(),
        }))
    }

    /// Sorted keys of all objects in `bucket`.
    async fn sorted_keys(&self, bucket: &str) -> BackendResult<Vec<String>> {
        let dir = self.bucket_dir(bucket)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|e| e != BODY_EXT).unwrap_or(true) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match hex::decode(stem).ok().and_then(|b| String::from_utf8(b).ok()) {
                Some(key) => keys.push(key),
                None => warn!(path = %path.display(), "skipping object with undecodable name"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

struct ObjectPaths {
    dir: PathBuf,
    stem: String,
    body: PathBuf,
    meta: PathBuf,
}

impl ObjectPaths {
    /// A temp path unique to this write, so concurrent writers of one key
    /// never rename each other's files.
    fn temp(&self) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{}.{}-{n}.{TEMP_EXT}", self.stem, std::process::id()))
    }
}

/// Move a fully written body and sidecar into place.
///
/// The previous sidecar is removed before the body is replaced, so a failure
/// after that point leaves a body without a sidecar (rebuilt on read) rather
/// than a new body described by stale metadata.
async fn install(
    paths: &ObjectPaths,
    body_temp: &Path,
    body: &[u8],
    meta_temp: &Path,
    meta: &[u8],
) -> io::Result<()> {
    fs::write(body_temp, body).await?;
    fs::write(meta_temp, meta).await?;
    remove_if_exists(&paths.meta).await?;
    fs::rename(body_temp, &paths.body).await?;
    fs::rename(meta_temp, &paths.meta).await
}

/// Remove `path`; returns `false` if it did not exist.
async fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl ObjectBackend for LocalBackend {
    async fn head_object(&self, bucket: &str, key: &str) -> BackendResult<Option<ObjectMetadata>> {
        let paths = self.object_paths(bucket, key)?;
        self.read_metadata(key, &paths).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackendResult<Option<Bytes>> {
        let paths = self.object_paths(bucket, key)?;
        match fs::read(&paths.body).await {
            Ok(body) => Ok(Some(Bytes::from(body))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        tags: &Tags,
    ) -> BackendResult<ObjectMetadata> {
        let paths = self.object_paths(bucket, key)?;
        fs::create_dir_all(&paths.dir).await?;

        let metadata = ObjectMetadata::describe(&body, tags);
        let encoded = serde_json::to_vec(&metadata).map_err(|e| BackendError::Metadata {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let body_temp = paths.temp();
        let meta_temp = paths.temp();
        if let Err(e) = install(&paths, &body_temp, &body, &meta_temp, &encoded).await {
            for temp in [&body_temp, &meta_temp] {
                if let Err(cleanup) = remove_if_exists(temp).await {
                    warn!(path = %temp.display(), error = %cleanup, "failed to remove temp file");
                }
            }
            return Err(e.into());
        }

        debug!(bucket, key, size = metadata.size, "object written");
        Ok(metadata)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> BackendResult<bool> {
        let paths = self.object_paths(bucket, key)?;
        let existed = remove_if_exists(&paths.body).await?;
        remove_if_exists(&paths.meta).await?;
        Ok(existed)
    }

    async fn list_objects(&self, bucket: &str, request: &ListRequest) -> BackendResult<ListPage> {
        let keys = self.sorted_keys(bucket).await?;
        let (page, next_token) = paginate(
            keys.into_iter().map(|k| (k, ())),
            request,
            self.max_page_size,
        )?;

        let mut items = Vec::with_capacity(page.len());
        for (key, ()) in page {
            let paths = self.object_paths(bucket, &key)?;
            // Deleted between the directory scan and now.
            if let Some(metadata) = self.read_metadata(&key, &paths).await? {
                items.push(ObjectSummary { key, metadata });
            }
        }
        Ok(ListPage { items, next_token })
    }

    fn max_page_size(&self) -> usize {
        self.max_page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());
        (dir, backend)
    }

    async fn put(backend: &LocalBackend, key: &str, body: &'static [u8]) -> ObjectMetadata {
        backend
            .put_object("docs", key, Bytes::from_static(body), &Tags::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn put_get_head_round_trip() {
        let (_dir, backend) = backend();
        let tags = Tags::from([("type".to_string(), "user".to_string())]);
        backend
            .put_object("docs", "users/1", Bytes::from_static(b"{\"a\":1}"), &tags)
            .await
            .unwrap();

        let body = backend.get_object("docs", "users/1").await.unwrap().unwrap();
        assert_eq!(&body[..], b"{\"a\":1}");

        let meta = backend.head_object("docs", "users/1").await.unwrap().unwrap();
        assert_eq!(meta.size, 7);
        assert_eq!(meta.tags, tags);
    }

    #[tokio::test]
    async fn missing_object_is_none() {
        let (_dir, backend) = backend();
        assert!(backend.get_object("docs", "x").await.unwrap().is_none());
        assert!(backend.head_object("docs", "x").await.unwrap().is_none());
        assert!(!backend.delete_object("docs", "x").await.unwrap());
    }

    #[tokio::test]
    async fn delete_removes_body_and_sidecar() {
        let (dir, backend) = backend();
        put(&backend, "k", b"x").await;
        assert!(backend.delete_object("docs", "k").await.unwrap());
        assert!(backend.head_object("docs", "k").await.unwrap().is_none());

        let leftovers = std::fs::read_dir(dir.path().join("docs")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn overwrite_replaces_metadata() {
        let (_dir, backend) = backend();
        put(&backend, "k", b"one").await;
        let tags = Tags::from([("rev".to_string(), "2".to_string())]);
        backend
            .put_object("docs", "k", Bytes::from_static(b"second"), &tags)
            .await
            .unwrap();

        let meta = backend.head_object("docs", "k").await.unwrap().unwrap();
        assert_eq!(meta.size, 6);
        assert_eq!(meta.etag, content_etag(b"second"));
        assert_eq!(meta.tags, tags);
        let body = backend.get_object("docs", "k").await.unwrap().unwrap();
        assert_eq!(&body[..], b"second");
    }

    #[tokio::test]
    async fn failed_write_leaves_no_temp_files() {
        let (dir, backend) = backend();
        put(&backend, "k", b"one").await;

        // A directory in place of the body makes the final rename fail.
        let bucket = dir.path().join("docs");
        let body_path = bucket.join(format!("{}.{BODY_EXT}", hex::encode("k")));
        std::fs::remove_file(&body_path).unwrap();
        std::fs::create_dir(&body_path).unwrap();

        let err = backend
            .put_object("docs", "k", Bytes::from_static(b"two"), &Tags::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));

        let temps: Vec<_> = std::fs::read_dir(&bucket)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == TEMP_EXT))
            .collect();
        assert!(temps.is_empty(), "leftover temp files: {temps:?}");
        // The stale sidecar of the first write is gone as well.
        assert!(!bucket.join(format!("{}.{META_EXT}", hex::encode("k"))).exists());
    }

    #[tokio::test]
    async fn listing_is_sorted_and_paginated() {
        let (_dir, backend) = backend();
        for key in ["a/3", "a/1", "b/1", "a/2"] {
            put(&backend, key, b"x").await;
        }

        let first = backend
            .list_objects("docs", &ListRequest::new("a/").with_page_size(2))
            .await
            .unwrap();
        let keys: Vec<_> = first.items.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["a/1", "a/2"]);

        let second = backend
            .list_objects(
                "docs",
                &ListRequest::new("a/")
                    .with_page_size(2)
                    .with_token(first.next_token.unwrap()),
            )
            .await
            .unwrap();
        let keys: Vec<_> = second.items.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, ["a/3"]);
        assert!(second.next_token.is_none());
    }

    #[tokio::test]
    async fn missing_sidecar_is_rebuilt() {
        let (dir, backend) = backend();
        put(&backend, "k", b"hello").await;
        let meta_path = dir
            .path()
            .join("docs")
            .join(format!("{}.{META_EXT}", hex::encode("k")));
        std::fs::remove_file(meta_path).unwrap();

        let meta = backend.head_object("docs", "k").await.unwrap().unwrap();
        assert_eq!(meta.size, 5);
        assert_eq!(meta.etag, content_etag(b"hello"));
    }

    #[tokio::test]
    async fn invalid_bucket_and_key_are_rejected() {
        let (_dir, backend) = backend();
        let err = backend.get_object("../escape", "k").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidBucket { .. }));

        let long_key = "k".repeat(MAX_KEY_BYTES + 1);
        let err = backend.get_object("docs", &long_key).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn list_missing_bucket_is_empty() {
        let (_dir, backend) = backend();
        let page = backend.list_objects("none", &ListRequest::new("")).await.unwrap();
        assert!(page.items.is_empty());
    }
}
