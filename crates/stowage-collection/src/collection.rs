use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use stowage_config::{CollectionConfig, CollectionOptions, Environment};
use stowage_store::{ObjectBackend, ObjectMetadata};
use tokio::task::JoinSet;
use tracing::info;

use crate::behavior::{self, BehaviorContext};
use crate::document::{Document, IdGenerator};
use crate::error::StowageResult;
use crate::reference::{FindOptions, Reference, ReferenceList};

/// Upper bound on loads a single [`Collection::load_many`] call runs at once.
pub const MAX_CONCURRENT_LOADS: usize = 16;

/// A typed view of one bucket (optionally under a key prefix).
///
/// Configuration, bucket name and prefix are fixed when the collection is
/// built. Cloning is cheap and every operation may run concurrently with
/// any other; each call derives its key and makes its own backend round trip.
pub struct Collection<T> {
    ctx: BehaviorContext,
    ids: Option<Arc<dyn IdGenerator>>,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> Collection<T> {
    /// Build the collection registered for `T::COLLECTION`.
    pub fn new(env: &Environment, backend: Arc<dyn ObjectBackend>) -> StowageResult<Self> {
        Self::builder(backend).build(env)
    }

    pub fn builder(backend: Arc<dyn ObjectBackend>) -> CollectionBuilder<T> {
        CollectionBuilder::new(backend)
    }

    // ---- Operations ----

    /// Metadata of `id`, or `None` if it is not stored.
    pub async fn head(&self, id: &str) -> StowageResult<Option<ObjectMetadata>> {
        behavior::head(&self.ctx, id).await
    }

    pub async fn exists(&self, id: &str) -> StowageResult<bool> {
        behavior::exists(&self.ctx, id).await
    }

    /// Load `id`, failing with `NotFound` if it is not stored.
    pub async fn load(&self, id: &str) -> StowageResult<T> {
        behavior::load(&self.ctx, id).await
    }

    /// Store `document`, assigning an id first if it has none.
    pub async fn save(&self, document: T) -> StowageResult<T> {
        behavior::save(&self.ctx, self.ids.as_deref(), document).await
    }

    /// Delete `id`. Returns `true` if something was deleted.
    pub async fn delete(&self, id: &str) -> StowageResult<bool> {
        behavior::delete(&self.ctx, id).await
    }

    /// One page of references under `prefix`.
    pub async fn find(&self, prefix: &str, options: &FindOptions) -> StowageResult<ReferenceList> {
        behavior::find(&self.ctx, prefix, options).await
    }

    /// Every reference under `prefix`, across all pages.
    pub async fn find_all(&self, prefix: &str) -> StowageResult<Vec<Reference>> {
        behavior::find_all(&self.ctx, prefix).await
    }

    /// Load several documents concurrently. Results keep the order of `ids`.
    ///
    /// At most [`MAX_CONCURRENT_LOADS`] loads are in flight at once.
    pub async fn load_many<I, S>(&self, ids: I) -> StowageResult<Vec<T>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pending = ids.into_iter().map(Into::<String>::into);
        let mut tasks = JoinSet::new();
        let mut slots: Vec<Option<T>> = Vec::new();
        loop {
            while tasks.len() < MAX_CONCURRENT_LOADS {
                let Some(id) = pending.next() else { break };
                let index = slots.len();
                slots.push(None);
                let collection = self.clone();
                tasks.spawn(async move { (index, collection.load(&id).await) });
            }
            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (index, loaded) = joined?;
            slots[index] = Some(loaded?);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// A collection of the same type and bucket scoped under `child_prefix`.
    ///
    /// The new prefix is the current prefix followed by `child_prefix`;
    /// nesting is equivalent to one call with the concatenated prefix.
    pub fn sub_collection(&self, child_prefix: &str) -> Self {
        Self {
            ctx: self.ctx.scoped(child_prefix),
            ids: self.ids.clone(),
            _document: PhantomData,
        }
    }

    // ---- Accessors ----

    pub fn bucket_name(&self) -> &str {
        self.ctx.bucket()
    }

    pub fn prefix(&self) -> &str {
        self.ctx.prefix()
    }

    pub fn config(&self) -> &CollectionConfig {
        self.ctx.config()
    }

    /// Storage key `id` maps to in this collection.
    pub fn key_for(&self, id: &str) -> String {
        self.ctx.key(id)
    }
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            ids: self.ids.clone(),
            _document: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("context", &self.ctx)
            .field("generates_ids", &self.ids.is_some())
            .finish()
    }
}

/// Builder for [`Collection`].
pub struct CollectionBuilder<T> {
    backend: Arc<dyn ObjectBackend>,
    logical_name: Option<String>,
    overrides: CollectionOptions,
    prefix: String,
    ids: Option<Arc<dyn IdGenerator>>,
    _document: PhantomData<fn() -> T>,
}

impl<T: Document> CollectionBuilder<T> {
    pub fn new(backend: Arc<dyn ObjectBackend>) -> Self {
        Self {
            backend,
            logical_name: None,
            overrides: CollectionOptions::default(),
            prefix: String::new(),
            ids: None,
            _document: PhantomData,
        }
    }

    /// Bind by this logical name instead of `T::COLLECTION`.
    pub fn named(mut self, logical_name: impl Into<String>) -> Self {
        self.logical_name = Some(logical_name.into());
        self
    }

    /// Caller options, laid over the registry entry.
    pub fn options(mut self, overrides: CollectionOptions) -> Self {
        self.overrides = overrides;
        self
    }

    /// Key prefix for every document of the collection.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Id strategy for documents saved without an id.
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    /// Resolve configuration and bucket name against `env`.
    ///
    /// Settings are read once here; later changes to `env` do not affect the
    /// built collection.
    pub fn build(self, env: &Environment) -> StowageResult<Collection<T>> {
        let logical_name = self
            .logical_name
            .unwrap_or_else(|| T::COLLECTION.to_string());
        let config = env.resolve(&logical_name, &self.overrides)?;
        let settings = env.settings();
        let bucket = settings.bucket_name(&config.name, config.bucket_pattern.as_deref());

        info!(
            collection = %config.name,
            logical_name = %logical_name,
            bucket = %bucket,
            prefix = %self.prefix,
            "collection ready"
        );

        Ok(Collection {
            ctx: BehaviorContext::new(self.backend, Arc::new(config), bucket, self.prefix),
            ids: self.ids,
            _document: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use stowage_config::{ConfigError, Settings};
    use stowage_store::InMemoryBackend;

    use crate::error::StowageError;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: Option<String>,
        text: String,
    }

    impl Document for Note {
        const COLLECTION: &'static str = "Note";

        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_id(&mut self, id: String) {
            self.id = Some(id);
        }
    }

    fn env() -> Environment {
        let env = Environment::new(Settings {
            base_name: "app".into(),
            stage: "test".into(),
            ..Settings::default()
        });
        env.register("note", CollectionOptions::default());
        env
    }

    #[test]
    fn build_resolves_bucket_once() {
        let env = env();
        let notes = Collection::<Note>::new(&env, Arc::new(InMemoryBackend::new())).unwrap();
        assert_eq!(notes.bucket_name(), "app-test-note");

        env.update_settings(|s| s.stage = "prod".into());
        assert_eq!(notes.bucket_name(), "app-test-note");

        let later = Collection::<Note>::new(&env, Arc::new(InMemoryBackend::new())).unwrap();
        assert_eq!(later.bucket_name(), "app-prod-note");
    }

    #[test]
    fn unregistered_type_without_name_fails() {
        let env = Environment::default();
        let err = Collection::<Note>::new(&env, Arc::new(InMemoryBackend::new())).unwrap_err();
        assert!(matches!(
            err,
            StowageError::Configuration(ConfigError::MissingName { .. })
        ));
    }

    #[test]
    fn explicit_name_needs_no_registry() {
        let env = Environment::default();
        let notes = Collection::<Note>::builder(Arc::new(InMemoryBackend::new()))
            .named("scratch")
            .options(CollectionOptions::named("scratch"))
            .build(&env)
            .unwrap();
        assert_eq!(notes.config().name, "scratch");
        assert_eq!(notes.config().type_name, "scratch");
        assert_eq!(notes.bucket_name(), "stowage-dev-scratch");
    }

    #[test]
    fn sub_collections_compose_prefixes() {
        let notes = Collection::<Note>::builder(Arc::new(InMemoryBackend::new()))
            .prefix("tenant-1/")
            .build(&env())
            .unwrap();
        let nested = notes.sub_collection("drafts/").sub_collection("2024/");
        assert_eq!(nested.prefix(), "tenant-1/drafts/2024/");
        assert_eq!(nested.key_for("a"), "tenant-1/drafts/2024/a");
        assert_eq!(nested.key_for("tenant-1/drafts/2024/a"), "tenant-1/drafts/2024/a");
        assert_eq!(nested.bucket_name(), notes.bucket_name());
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let notes = Collection::<Note>::new(&env(), Arc::new(InMemoryBackend::new())).unwrap();
        let saved = notes
            .save(Note {
                id: Some("n1".into()),
                text: "hello".into(),
            })
            .await
            .unwrap();
        assert_eq!(notes.load("n1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn save_without_id_or_generator_fails() {
        let backend = Arc::new(InMemoryBackend::new());
        let notes = Collection::<Note>::new(&env(), backend.clone()).unwrap();
        let err = notes
            .save(Note {
                id: None,
                text: "orphan".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StowageError::MissingId { .. }));
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn generated_ids_are_attached() {
        let notes = Collection::<Note>::builder(Arc::new(InMemoryBackend::new()))
            .id_generator(crate::document::ContentHashIds)
            .build(&env())
            .unwrap();
        let saved = notes
            .save(Note {
                id: None,
                text: "content".into(),
            })
            .await
            .unwrap();
        let id = saved.id.clone().expect("id attached");
        assert_eq!(id.len(), 64);
        assert_eq!(notes.load(&id).await.unwrap().text, "content");
    }

    #[tokio::test]
    async fn load_many_keeps_order() {
        let notes = Collection::<Note>::new(&env(), Arc::new(InMemoryBackend::new())).unwrap();
        for (id, text) in [("a", "first"), ("b", "second"), ("c", "third")] {
            notes
                .save(Note {
                    id: Some(id.into()),
                    text: text.into(),
                })
                .await
                .unwrap();
        }

        let loaded = notes.load_many(["c", "a", "b"]).await.unwrap();
        let texts: Vec<_> = loaded.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, ["third", "first", "second"]);

        let err = notes.load_many(["a", "missing"]).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn debug_format() {
        let notes = Collection::<Note>::new(&env(), Arc::new(InMemoryBackend::new())).unwrap();
        let debug = format!("{notes:?}");
        assert!(debug.contains("app-test-note"));
        assert!(debug.contains("generates_ids"));
    }
}
