use super::traits::{check_rate, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settings of the language-model assistance: stagnation help, seeding of
/// the initial population and suggested crossover points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    pub stagnation_assistance: bool,
    pub initial_population: bool,
    pub crossover_usage_probability: f64,
    pub endpoint: String,
    pub model: String,
    pub crossover_model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub request_timeout_secs: u64,
    pub max_source_chars: usize,
    pub max_goal_chars: usize,
    pub submit_attempts: usize,
    pub submit_backoff_ms: u64,
    pub compile_attempts: usize,
    pub compile_backoff_ms: u64,
    pub initial_population_rounds: usize,
    pub classpath: String,
    /// Directory where normalized source is written before compiling;
    /// a private temporary directory when absent
    pub scratch_dir: Option<PathBuf>,
    pub artifact_name: String,
    pub criteria: Vec<String>,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            stagnation_assistance: true,
            initial_population: false,
            crossover_usage_probability: 0.0,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            crossover_model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_secs: 120,
            max_source_chars: 35_000,
            max_goal_chars: 5_000,
            submit_attempts: 3,
            submit_backoff_ms: 30_000,
            compile_attempts: 3,
            compile_backoff_ms: 5_000,
            initial_population_rounds: 2,
            classpath: String::new(),
            scratch_dir: None,
            artifact_name: "ClassTest.java".to_string(),
            criteria: vec!["LINE".to_string(), "BRANCH".to_string()],
        }
    }
}

impl SuggestionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn submit_backoff(&self) -> Duration {
        Duration::from_millis(self.submit_backoff_ms)
    }

    pub fn compile_backoff(&self) -> Duration {
        Duration::from_millis(self.compile_backoff_ms)
    }
}

impl ConfigSection for SuggestionConfig {
    fn section_name() -> &'static str {
        "suggestion"
    }

    fn validate(&self) -> Result<(), SearchError> {
        check_rate("Crossover usage probability", self.crossover_usage_probability)?;
        if self.submit_attempts == 0 || self.compile_attempts == 0 {
            return Err(SearchError::Configuration(
                "Submit and compile attempts must be at least 1".to_string(),
            ));
        }
        if self.artifact_name.trim().is_empty() {
            return Err(SearchError::Configuration(
                "Artifact name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Suggestion".to_string(),
            fields: vec![
                FieldManifest::new(
                    "stagnation_assistance",
                    "boolean",
                    serde_json::json!(self.stagnation_assistance),
                    "Ask for tests when offspring keep stalling",
                ),
                FieldManifest::new(
                    "initial_population",
                    "boolean",
                    serde_json::json!(self.initial_population),
                    "Seed generation zero with suggested tests",
                ),
                FieldManifest::new(
                    "crossover_usage_probability",
                    "float",
                    serde_json::json!(self.crossover_usage_probability),
                    "Chance of asking for crossover points",
                )
                .range(0.0, 1.0),
                FieldManifest::new(
                    "model",
                    "string",
                    serde_json::json!(self.model),
                    "Model used for test suggestions",
                ),
                FieldManifest::new(
                    "crossover_model",
                    "string",
                    serde_json::json!(self.crossover_model),
                    "Model used for crossover points",
                ),
                FieldManifest::new(
                    "submit_attempts",
                    "integer",
                    serde_json::json!(self.submit_attempts),
                    "Submissions allowed per round",
                )
                .range(1.0, 10.0),
                FieldManifest::new(
                    "compile_attempts",
                    "integer",
                    serde_json::json!(self.compile_attempts),
                    "Compile attempts allowed per round",
                )
                .range(1.0, 10.0),
                FieldManifest::new(
                    "max_source_chars",
                    "integer",
                    serde_json::json!(self.max_source_chars),
                    "Unit source is truncated to this many characters",
                ),
                FieldManifest::new(
                    "max_goal_chars",
                    "integer",
                    serde_json::json!(self.max_goal_chars),
                    "Goal list is truncated to this many characters",
                ),
            ],
        }
    }
}
