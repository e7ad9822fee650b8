//! Typed document collections over keyed object storage.
//!
//! A [`Collection`] maps a serde document type onto one bucket of an
//! [`ObjectBackend`]:
//!
//! 1. Its configuration is resolved once, when it is built: system defaults,
//!    then the registry entry for the type's logical name, then the caller's
//!    options.
//! 2. Its bucket name is rendered from the settings' bucket pattern at the
//!    same time and never re-read.
//! 3. Every id maps to the key `prefix + id`; an id that already carries the
//!    prefix is not prefixed again.
//! 4. Each operation is a stateless behavior that makes one backend call and
//!    maps "not found" and backend failures to [`StowageError`].
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use serde::{Deserialize, Serialize};
//! use stowage_collection::{Collection, Document, FindOptions};
//! use stowage_config::{CollectionOptions, Environment};
//! use stowage_store::InMemoryBackend;
//!
//! #[derive(Serialize, Deserialize)]
//! struct User { id: Option<String>, email: String }
//!
//! impl Document for User {
//!     const COLLECTION: &'static str = "User";
//!     fn id(&self) -> Option<&str> { self.id.as_deref() }
//!     fn set_id(&mut self, id: String) { self.id = Some(id); }
//! }
//!
//! # async fn demo() -> stowage_collection::StowageResult<()> {
//! let env = Environment::default();
//! env.register("user", CollectionOptions::default().with_page_size(100));
//!
//! let users = Collection::<User>::new(&env, Arc::new(InMemoryBackend::new()))?;
//! users.save(User { id: Some("42".into()), email: "a@b.c".into() }).await?;
//! let page = users.find("", &FindOptions::default()).await?;
//! # Ok(()) }
//! ```

pub mod behavior;
mod codec;
pub mod collection;
pub mod document;
pub mod error;
pub mod key;
pub mod reference;

pub use collection::{Collection, CollectionBuilder, MAX_CONCURRENT_LOADS};
pub use document::{ContentHashIds, Document, IdGenerator, UuidV7Ids};
pub use error::{Operation, StowageError, StowageResult};
pub use reference::{FindOptions, Reference, ReferenceList};

// Re-export the types callers need alongside collections.
pub use stowage_config::{CollectionConfig, CollectionOptions, Environment, Settings};
pub use stowage_store::{InMemoryBackend, LocalBackend, ObjectBackend, ObjectMetadata};
