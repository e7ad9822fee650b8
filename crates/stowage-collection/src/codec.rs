//! JSON encoding of document bodies.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StowageError, StowageResult};

pub(crate) fn encode<T: Serialize>(document: &T, key: &str) -> StowageResult<Bytes> {
    serde_json::to_vec(document)
        .map(Bytes::from)
        .map_err(|source| StowageError::Serialization {
            key: key.to_string(),
            source,
        })
}

pub(crate) fn decode<T: DeserializeOwned>(body: &[u8], bucket: &str, key: &str) -> StowageResult<T> {
    serde_json::from_slice(body).map_err(|source| StowageError::CorruptData {
        bucket: bucket.to_string(),
        key: key.to_string(),
        source,
    })
}
