use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A typed payload stored in a collection.
///
/// The collection never inspects the payload beyond (de)serializing it and
/// reading its id.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Logical name used to look up the collection's registry entry.
    const COLLECTION: &'static str;

    /// The document id, if one has been assigned.
    fn id(&self) -> Option<&str>;

    /// Attach a generated id.
    fn set_id(&mut self, id: String);
}

/// Strategy for assigning ids to documents saved without one.
///
/// `draft` is the serialized document before the id is attached.
pub trait IdGenerator: Send + Sync {
    fn generate(&self, draft: &[u8]) -> String;
}

/// Time-ordered UUIDv7 ids. Keys sort roughly by creation time.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidV7Ids;

impl IdGenerator for UuidV7Ids {
    fn generate(&self, _draft: &[u8]) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Content-derived ids: the hex BLAKE3 hash of the draft.
///
/// Saving identical content twice addresses the same key.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContentHashIds;

impl IdGenerator for ContentHashIds {
    fn generate(&self, draft: &[u8]) -> String {
        blake3::hash(draft).to_hex().to_string()
    }
}
