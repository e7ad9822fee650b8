//! Bucket-name templating.
//!
//! A bucket pattern is a string with zero or more `{{token}}` placeholders.
//! Recognized tokens:
//!
//! - `{{stage}}` -- deployment stage (e.g. `dev`, `prod`)
//! - `{{region}}` -- backend region
//! - `{{baseName}}` -- application base name
//! - `{{bucketName}}` -- the collection's own name
//!
//! Substitution is a single left-to-right pass. Substituted values are never
//! rescanned, and unknown or unterminated placeholders are copied verbatim.

/// Values substituted into a bucket pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BucketTokens<'a> {
    pub stage: &'a str,
    pub region: &'a str,
    pub base_name: &'a str,
    pub bucket_name: &'a str,
}

impl<'a> BucketTokens<'a> {
    fn lookup(&self, token: &str) -> Option<&'a str> {
        match token {
            "stage" => Some(self.stage),
            "region" => Some(self.region),
            "baseName" => Some(self.base_name),
            "bucketName" => Some(self.bucket_name),
            _ => None,
        }
    }
}

/// Render a bucket pattern into a fully-qualified bucket name.
///
/// # Examples
///
/// ```
/// use stowage_config::template::{fully_qualify, BucketTokens};
///
/// let tokens = BucketTokens {
///     stage: "prod",
///     region: "us-east-1",
///     base_name: "app",
///     bucket_name: "users",
/// };
/// assert_eq!(fully_qualify("{{baseName}}-{{stage}}-{{bucketName}}", &tokens), "app-prod-users");
/// assert_eq!(fully_qualify("app-prod-users", &tokens), "app-prod-users");
/// assert_eq!(fully_qualify("{{nope}}-x", &tokens), "{{nope}}-x");
/// ```
pub fn fully_qualify(template: &str, tokens: &BucketTokens<'_>) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            // Unterminated: copy the remainder verbatim.
            out.push_str(&rest[open..]);
            return out;
        };

        match tokens.lookup(&after_open[..close]) {
            Some(value) => {
                out.push_str(value);
                rest = &after_open[close + 2..];
            }
            None => {
                // Keep the braces and resume scanning right after them, so a
                // known placeholder nested in junk still resolves.
                out.push_str("{{");
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}
