//! TOML configuration files.
//!
//! ```toml
//! base_name = "shop"
//! stage = "prod"
//! region = "eu-west-1"
//!
//! [collections.users]
//! page_size = 100
//! tags = { owner = "accounts" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::environment::Environment;
use crate::error::{ConfigError, ConfigResult};
use crate::options::CollectionOptions;
use crate::settings::Settings;

/// On-disk form of an [`Environment`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionOptions>,
}

impl ConfigFile {
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file = Self::from_toml_str(&raw)?;
        debug!(
            path = %path.display(),
            collections = file.collections.len(),
            "loaded configuration file"
        );
        Ok(file)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build an environment with these settings and registry entries.
    pub fn into_environment(self) -> Environment {
        let env = Environment::new(self.settings);
        for (name, options) in self.collections {
            env.register(&name, options);
        }
        debug!(collections = ?env.registry().names(), "environment ready");
        env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
base_name = "shop"
stage = "prod"
region = "eu-west-1"

[collections.users]
page_size = 100
tags = { owner = "accounts" }

[collections.Orders]
name = "orders-v2"
bucket_pattern = "{{bucketName}}-{{region}}"
"#;

    #[test]
    fn parses_settings_and_collections() {
        let file = ConfigFile::from_toml_str(SAMPLE).unwrap();
        assert_eq!(file.settings.base_name, "shop");
        assert_eq!(file.settings.stage, "prod");
        assert_eq!(file.settings.region.as_deref(), Some("eu-west-1"));
        // Unset fields keep their defaults.
        assert_eq!(file.settings.bucket_pattern, Settings::default().bucket_pattern);
        assert_eq!(file.collections.len(), 2);
    }

    #[test]
    fn environment_from_file() {
        let env = ConfigFile::from_toml_str(SAMPLE).unwrap().into_environment();
        assert_eq!(env.registry().names(), ["orders", "users"]);
        let users = env.resolve("Users", &CollectionOptions::default()).unwrap();
        assert_eq!(users.name, "users");
        assert_eq!(users.page_size, 100);
        assert_eq!(users.tags.get("owner").map(String::as_str), Some("accounts"));

        let orders = env.resolve("orders", &CollectionOptions::default()).unwrap();
        assert_eq!(orders.name, "orders-v2");
        assert_eq!(
            env.settings().bucket_name(&orders.name, orders.bucket_pattern.as_deref()),
            "orders-v2-eu-west-1"
        );
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let file = ConfigFile::from_toml_str("").unwrap();
        assert_eq!(file, ConfigFile::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let err = ConfigFile::from_toml_str("stage = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stowage.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let file = ConfigFile::load(&path).unwrap();
        assert_eq!(file.settings.stage, "prod");

        let missing = ConfigFile::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }

    #[test]
    fn toml_round_trip_preserves_settings() {
        let file = ConfigFile::from_toml_str(SAMPLE).unwrap();
        let again = ConfigFile::from_toml_str(&file.to_toml_string().unwrap()).unwrap();
        assert_eq!(again.settings, file.settings);
    }
}
