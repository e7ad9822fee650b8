use serde::{Deserialize, Serialize};

use crate::template::{fully_qualify, BucketTokens};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Bucket pattern used when none is configured.
pub const DEFAULT_BUCKET_PATTERN: &str = "{{baseName}}-{{stage}}-{{bucketName}}";

/// Environment variables read by [`Settings::apply_env`].
pub const ENV_BASE_NAME: &str = "STOWAGE_BASE_NAME";
pub const ENV_STAGE: &str = "STOWAGE_STAGE";
pub const ENV_BUCKET_PATTERN: &str = "STOWAGE_BUCKET_PATTERN";
pub const ENV_REGION: &str = "STOWAGE_REGION";

/// Process-wide values used to build bucket names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Application base name, substituted for `{{baseName}}`.
    pub base_name: String,
    /// Deployment stage, substituted for `{{stage}}`.
    pub stage: String,
    /// Default bucket pattern for collections without their own.
    pub bucket_pattern: String,
    /// Backend region. Falls back to [`DEFAULT_REGION`].
    pub region: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_name: "stowage".into(),
            stage: "dev".into(),
            bucket_pattern: DEFAULT_BUCKET_PATTERN.into(),
            region: None,
        }
    }
}

impl Settings {
    /// The configured region, or [`DEFAULT_REGION`].
    pub fn region_or_default(&self) -> &str {
        self.region
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_REGION)
    }

    /// Render the bucket name of collection `bucket_name`.
    ///
    /// `pattern` overrides [`Settings::bucket_pattern`] when given.
    pub fn bucket_name(&self, bucket_name: &str, pattern: Option<&str>) -> String {
        let tokens = BucketTokens {
            stage: &self.stage,
            region: self.region_or_default(),
            base_name: &self.base_name,
            bucket_name,
        };
        fully_qualify(pattern.unwrap_or(&self.bucket_pattern), &tokens)
    }

    /// Overlay values from the `STOWAGE_*` process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    /// Overlay values from an arbitrary variable source. Empty values are ignored.
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(v) = get(ENV_BASE_NAME) {
            self.base_name = v;
        }
        if let Some(v) = get(ENV_STAGE) {
            self.stage = v;
        }
        if let Some(v) = get(ENV_BUCKET_PATTERN) {
            self.bucket_pattern = v;
        }
        if let Some(v) = get(ENV_REGION) {
            self.region = Some(v);
        }
    }
}
