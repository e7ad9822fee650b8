use stowage_store::ListRequest;
use tracing::debug;

use super::BehaviorContext;
use crate::error::{Operation, StowageError, StowageResult};
use crate::key::strip_key;
use crate::reference::{FindOptions, Reference, ReferenceList};

/// List one page of references under `prefix`.
///
/// `prefix` is composed with the collection prefix the same way ids are.
/// The page size defaults to the collection's and is capped at the
/// backend's maximum. The continuation token is passed through verbatim.
pub async fn find(
    ctx: &BehaviorContext,
    prefix: &str,
    options: &FindOptions,
) -> StowageResult<ReferenceList> {
    let effective_prefix = ctx.key(prefix);
    let page_size = options
        .page_size
        .unwrap_or(ctx.config().page_size)
        .min(ctx.backend.max_page_size())
        .max(1);

    let request = ListRequest {
        prefix: effective_prefix.clone(),
        page_size: Some(page_size),
        continuation_token: options.continuation_token.clone(),
    };
    debug!(
        bucket = ctx.bucket(),
        prefix = %effective_prefix,
        page_size,
        resuming = request.continuation_token.is_some(),
        "find"
    );

    let page = ctx
        .backend
        .list_objects(ctx.bucket(), &request)
        .await
        .map_err(|e| match request.continuation_token {
            Some(ref token) if e.is_invalid_token() => StowageError::Pagination {
                bucket: ctx.bucket().to_string(),
                prefix: effective_prefix.clone(),
                token: token.clone(),
                source: e,
            },
            _ => ctx.storage_error(Operation::Find, &effective_prefix, e),
        })?;

    let references = page
        .items
        .into_iter()
        .map(|summary| Reference {
            id: strip_key(&summary.key, ctx.prefix()).to_string(),
            key: summary.key,
            metadata: summary.metadata,
        })
        .collect();

    Ok(ReferenceList {
        references,
        continuation_token: page.next_token,
        prefix: effective_prefix,
        page_size,
    })
}

/// Follow continuation tokens until the listing under `prefix` is exhausted.
pub async fn find_all(ctx: &BehaviorContext, prefix: &str) -> StowageResult<Vec<Reference>> {
    let mut options = FindOptions::default();
    let mut all = Vec::new();
    loop {
        let page = find(ctx, prefix, &options).await?;
        all.extend(page.references);
        match page.continuation_token {
            Some(token) => options.continuation_token = Some(token),
            None => break,
        }
    }
    debug!(bucket = ctx.bucket(), count = all.len(), "find_all complete");
    Ok(all)
}
