//! Storage key derivation.
//!
//! A key is the collection prefix followed by the document id. Applying the
//! prefix is idempotent: an id that already carries the prefix is used as is.

/// Compute the storage key of `id` under `prefix`.
///
/// # Examples
///
/// ```
/// use stowage_collection::key::to_key;
///
/// assert_eq!(to_key("42", ""), "42");
/// assert_eq!(to_key("42", "users/"), "users/42");
/// assert_eq!(to_key("users/42", "users/"), "users/42");
/// ```
pub fn to_key(id: &str, prefix: &str) -> String {
    if prefix.is_empty() || id.starts_with(prefix) {
        id.to_string()
    } else {
        format!("{prefix}{id}")
    }
}

/// Recover an id for `key` such that `to_key(id, prefix) == key`.
///
/// The prefix is stripped unless the remainder itself starts with `prefix`;
/// `to_key` would leave such a remainder alone, so the full key is the id.
pub fn strip_key<'a>(key: &'a str, prefix: &str) -> &'a str {
    match key.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() && !rest.starts_with(prefix) => rest,
        _ => key,
    }
}

/// Prefix of a sub-collection: plain concatenation, no separator added.
pub fn compose_prefix(parent: &str, child: &str) -> String {
    let mut prefix = String::with_capacity(parent.len() + child.len());
    prefix.push_str(parent);
    prefix.push_str(child);
    prefix
}
