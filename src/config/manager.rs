use super::{search::SearchConfig, suggestion::SuggestionConfig, traits::ConfigSection};
use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Environment variables with this prefix override file values,
/// e.g. `SUITEGEN__SEARCH__POPULATION_SIZE=80`
pub const ENV_PREFIX: &str = "SUITEGEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub suggestion: SuggestionConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        self.search.validate()?;
        self.suggestion.validate()?;
        Ok(())
    }
}

fn poisoned<T>(_: T) -> SearchError {
    SearchError::Configuration("configuration lock poisoned".to_string())
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SearchError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| SearchError::Configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;

        *self.config.write().map_err(poisoned)? = config;
        Ok(())
    }

    /// Load an optional file and apply `SUITEGEN__SECTION__FIELD` environment
    /// overrides on top of it.
    pub fn load_layered<P: AsRef<Path>>(&self, path: P) -> Result<(), SearchError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;

        log::info!(
            "Loaded configuration: population {}, budget {}s",
            config.search.population_size,
            config.search.search_budget_secs
        );
        *self.config.write().map_err(poisoned)? = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SearchError> {
        let config = self.config.read().map_err(poisoned)?;
        let toml_str = toml::to_string_pretty(&*config)
            .map_err(|e| SearchError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| SearchError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> Result<AppConfig, SearchError> {
        Ok(self.config.read().map_err(poisoned)?.clone())
    }

    pub fn update<F>(&self, f: F) -> Result<(), SearchError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().map_err(poisoned)?;
        let mut candidate = config.clone();
        f(&mut candidate);
        candidate.validate()?;
        *config = candidate;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("suitegen.toml");

        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.search.population_size = 24;
                c.suggestion.model = "local-model".to_string();
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::new();
        reloaded.load_from_file(&path).unwrap();
        let config = reloaded.get().unwrap();
        assert_eq!(config.search.population_size, 24);
        assert_eq!(config.suggestion.model, "local-model");
    }

    #[test]
    fn test_invalid_update_is_discarded() {
        let manager = ConfigManager::new();
        assert!(manager.update(|c| c.search.crossover_rate = 2.0).is_err());
        assert_eq!(manager.get().unwrap().search.crossover_rate, 0.75);
    }

    #[test]
    fn test_layered_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layered.toml");
        std::fs::write(&path, "[search]\npopulation_size = 16\n").unwrap();

        let manager = ConfigManager::new();
        manager.load_layered(&path).unwrap();
        let config = manager.get().unwrap();
        assert_eq!(config.search.population_size, 16);
        assert_eq!(config.search.stall_threshold, 30);
        assert_eq!(config.suggestion.submit_attempts, 3);
    }
}
