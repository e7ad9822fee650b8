use serde::{Deserialize, Serialize};
use stowage_store::ObjectMetadata;

/// Paging parameters of a `find` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Entries per page. Defaults to the collection's page size.
    pub page_size: Option<usize>,
    /// Token from a previous [`ReferenceList`], to resume that listing.
    pub continuation_token: Option<String>,
}

impl FindOptions {
    pub fn page_size(page_size: usize) -> Self {
        Self {
            page_size: Some(page_size),
            continuation_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Options that resume after `list`, keeping its page size.
    ///
    /// Returns `None` when `list` was the last page.
    pub fn after(list: &ReferenceList) -> Option<Self> {
        list.continuation_token.as_ref().map(|token| Self {
            page_size: Some(list.page_size),
            continuation_token: Some(token.clone()),
        })
    }
}

/// A stored object found by a listing, without its body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Full storage key.
    pub key: String,
    /// Id that maps back to `key` in the listing collection: the key with
    /// the collection prefix removed, or the full key when the remainder
    /// starts with the prefix again.
    pub id: String,
    pub metadata: ObjectMetadata,
}

/// One page of a `find`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceList {
    /// References in the backend's key order.
    pub references: Vec<Reference>,
    /// Present iff more references exist after this page.
    pub continuation_token: Option<String>,
    /// The effective (collection-prefixed) listing prefix.
    pub prefix: String,
    /// The page size the backend was asked for.
    pub page_size: usize,
}

impl ReferenceList {
    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Returns `true` if another page follows.
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.id.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.key.as_str())
    }
}

impl IntoIterator for ReferenceList {
    type Item = Reference;
    type IntoIter = std::vec::IntoIter<Reference>;

    fn into_iter(self) -> Self::IntoIter {
        self.references.into_iter()
    }
}
