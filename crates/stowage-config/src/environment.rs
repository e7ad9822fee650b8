use std::sync::{PoisonError, RwLock};

use crate::error::ConfigResult;
use crate::options::{resolve, CollectionConfig, CollectionOptions};
use crate::registry::CollectionRegistry;
use crate::settings::Settings;

/// Process-scope configuration: the [`Settings`] and the [`CollectionRegistry`].
///
/// Lifecycle: create once at startup, register collection types and adjust
/// settings, then build collections. A collection snapshots the settings when
/// it is built; later calls to [`Environment::update_settings`] only affect
/// collections built afterwards.
#[derive(Debug, Default)]
pub struct Environment {
    settings: RwLock<Settings>,
    registry: CollectionRegistry,
}

impl Environment {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
            registry: CollectionRegistry::new(),
        }
    }

    /// A snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change settings for collections built from now on.
    pub fn update_settings(&self, update: impl FnOnce(&mut Settings)) {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        update(&mut settings);
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Shorthand for `self.registry().register(..)`.
    pub fn register(&self, logical_name: &str, options: CollectionOptions) {
        self.registry.register(logical_name, options);
    }

    /// Resolve the effective configuration of `logical_name` against this
    /// environment's registry.
    pub fn resolve(
        &self,
        logical_name: &str,
        overrides: &CollectionOptions,
    ) -> ConfigResult<CollectionConfig> {
        resolve(logical_name, &self.registry, overrides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_snapshot_is_detached() {
        let env = Environment::default();
        let before = env.settings();
        env.update_settings(|s| s.stage = "prod".into());

        assert_eq!(before.stage, "dev");
        assert_eq!(env.settings().stage, "prod");
    }

    #[test]
    fn resolve_uses_own_registry() {
        let env = Environment::new(Settings::default());
        env.register("Users", CollectionOptions::default().with_page_size(100));

        let config = env.resolve("users", &CollectionOptions::default()).unwrap();
        assert_eq!(config.name, "users");
        assert_eq!(config.page_size, 100);
    }
}
