use stowage_store::ObjectMetadata;
use tracing::debug;

use super::BehaviorContext;
use crate::codec;
use crate::document::Document;
use crate::error::{Operation, StowageError, StowageResult};

/// Metadata of `id`, or `None` if nothing is stored under its key.
pub async fn head(ctx: &BehaviorContext, id: &str) -> StowageResult<Option<ObjectMetadata>> {
    let key = ctx.key(id);
    debug!(bucket = ctx.bucket(), key = %key, "head");
    ctx.backend
        .head_object(ctx.bucket(), &key)
        .await
        .map_err(|e| ctx.storage_error(Operation::Head, &key, e))
}

/// Whether anything is stored under the key of `id`.
pub async fn exists(ctx: &BehaviorContext, id: &str) -> StowageResult<bool> {
    let key = ctx.key(id);
    debug!(bucket = ctx.bucket(), key = %key, "exists");
    ctx.backend
        .head_object(ctx.bucket(), &key)
        .await
        .map(|meta| meta.is_some())
        .map_err(|e| ctx.storage_error(Operation::Exists, &key, e))
}

/// Fetch and decode the document stored under the key of `id`.
pub async fn load<T: Document>(ctx: &BehaviorContext, id: &str) -> StowageResult<T> {
    let key = ctx.key(id);
    debug!(bucket = ctx.bucket(), key = %key, "load");
    let body = ctx
        .backend
        .get_object(ctx.bucket(), &key)
        .await
        .map_err(|e| ctx.storage_error(Operation::Load, &key, e))?
        .ok_or_else(|| StowageError::NotFound {
            bucket: ctx.bucket().to_string(),
            key: key.clone(),
        })?;
    codec::decode(&body, ctx.bucket(), &key)
}
