//! Keyed object storage backends for Stowage.
//!
//! This crate defines the narrow client interface that Stowage collections
//! talk to: a flat, bucketed, eventually-consistent object store addressed by
//! string keys, with prefix listing and opaque continuation tokens.
//!
//! # Backends
//!
//! All backends implement the [`ObjectBackend`] trait:
//!
//! - [`InMemoryBackend`] -- `BTreeMap`-based store for tests and embedding
//! - [`LocalBackend`] -- one directory per bucket on the local filesystem
//!
//! # Design Rules
//!
//! 1. A missing object is a normal outcome (`None` / `false`), not an error.
//! 2. Writes overwrite; every other call is idempotent.
//! 3. Listings are lexicographic by key; tokens resume after the last key.
//! 4. Backends never interpret object bodies.
//! 5. No backend call retries on its own.
//! 6. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod local;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{BackendError, BackendResult};
pub use local::LocalBackend;
pub use memory::InMemoryBackend;
pub use object::{
    content_etag, ListPage, ListRequest, ObjectMetadata, ObjectSummary, Tags,
    DEFAULT_MAX_PAGE_SIZE,
};
pub use traits::ObjectBackend;
