use tracing::debug;

use super::BehaviorContext;
use crate::codec;
use crate::document::{Document, IdGenerator};
use crate::error::{Operation, StowageError, StowageResult};

/// Encode `document` and store it under the key of its id.
///
/// A document without an id gets one from `ids`; without a generator the
/// save fails with [`StowageError::MissingId`] before anything is written.
pub async fn save<T: Document>(
    ctx: &BehaviorContext,
    ids: Option<&dyn IdGenerator>,
    mut document: T,
) -> StowageResult<T> {
    let assigned = document
        .id()
        .filter(|id| !id.is_empty())
        .map(str::to_string);
    let id = match assigned {
        Some(id) => id,
        None => {
            let generator = ids.ok_or_else(|| StowageError::MissingId {
                collection: ctx.config().name.clone(),
            })?;
            let draft = codec::encode(&document, ctx.prefix())?;
            let id = generator.generate(&draft);
            document.set_id(id.clone());
            id
        }
    };

    let key = ctx.key(&id);
    let body = codec::encode(&document, &key)?;
    debug!(bucket = ctx.bucket(), key = %key, size = body.len(), "save");
    ctx.backend
        .put_object(ctx.bucket(), &key, body, &ctx.config().tags)
        .await
        .map_err(|e| ctx.storage_error(Operation::Save, &key, e))?;
    Ok(document)
}

/// Delete the object under the key of `id`. Returns `true` if one existed.
pub async fn delete(ctx: &BehaviorContext, id: &str) -> StowageResult<bool> {
    let key = ctx.key(id);
    debug!(bucket = ctx.bucket(), key = %key, "delete");
    ctx.backend
        .delete_object(ctx.bucket(), &key)
        .await
        .map_err(|e| ctx.storage_error(Operation::Delete, &key, e))
}
