//! Configuration for Stowage collections.
//!
//! This crate owns everything a collection needs to know before it talks to
//! storage:
//!
//! - [`Settings`] -- process-wide base name, stage, region and bucket pattern
//! - [`template`] -- `{{token}}` substitution that turns a pattern into a bucket name
//! - [`CollectionRegistry`] -- explicit logical-name to [`CollectionOptions`] registration
//! - [`resolve`] -- merging defaults, registry entry and caller overrides into a
//!   [`CollectionConfig`]
//! - [`Environment`] -- the settings and registry with a build-time snapshot lifecycle
//! - [`ConfigFile`] -- the TOML form of an environment

pub mod environment;
pub mod error;
pub mod file;
pub mod options;
pub mod registry;
pub mod settings;
pub mod template;

pub use environment::Environment;
pub use error::{ConfigError, ConfigResult};
pub use file::ConfigFile;
pub use options::{resolve, CollectionConfig, CollectionOptions, DEFAULT_PAGE_SIZE};
pub use registry::CollectionRegistry;
pub use settings::{Settings, DEFAULT_BUCKET_PATTERN, DEFAULT_REGION};
pub use template::{fully_qualify, BucketTokens};
