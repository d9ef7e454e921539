use super::traits::{check_rate, ConfigManifest, ConfigSection, FieldManifest};
use crate::error::SearchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub population_size: usize,
    pub crossover_rate: f64,
    /// Consecutive stalled offspring before the suggestion pipeline is asked
    pub stall_threshold: usize,
    /// Fraction of N injected as immigrants every generation
    pub test_insertion_rate: f64,
    pub tournament_size: usize,
    pub search_budget_secs: u64,
    pub max_evaluations: Option<usize>,
    pub max_generations: Option<usize>,
    pub execution_timeout_ms: u64,
    pub seed: Option<u64>,
    pub initial_chromosome_length: usize,
    pub max_chromosome_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            crossover_rate: 0.75,
            stall_threshold: 30,
            test_insertion_rate: 0.1,
            tournament_size: 2,
            search_budget_secs: 60,
            max_evaluations: None,
            max_generations: None,
            execution_timeout_ms: 4000,
            seed: None,
            initial_chromosome_length: 10,
            max_chromosome_length: 40,
        }
    }
}

impl SearchConfig {
    pub fn search_budget(&self) -> Duration {
        Duration::from_secs(self.search_budget_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_millis(self.execution_timeout_ms)
    }

    /// Number of immigrants per generation: ceil(N * insertion rate)
    pub fn immigrant_count(&self) -> usize {
        (self.population_size as f64 * self.test_insertion_rate).ceil() as usize
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn validate(&self) -> Result<(), SearchError> {
        if self.population_size < 2 {
            return Err(SearchError::Configuration(
                "Population size must be at least 2".to_string(),
            ));
        }
        check_rate("Crossover rate", self.crossover_rate)?;
        check_rate("Test insertion rate", self.test_insertion_rate)?;
        if self.tournament_size == 0 {
            return Err(SearchError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        if self.initial_chromosome_length == 0
            || self.max_chromosome_length < self.initial_chromosome_length
        {
            return Err(SearchError::Configuration(format!(
                "Chromosome lengths must satisfy 1 <= initial ({}) <= max ({})",
                self.initial_chromosome_length, self.max_chromosome_length
            )));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Search".to_string(),
            fields: vec![
                FieldManifest::new(
                    "population_size",
                    "integer",
                    serde_json::json!(self.population_size),
                    "Chromosomes kept per generation",
                )
                .range(2.0, 10000.0),
                FieldManifest::new(
                    "crossover_rate",
                    "float",
                    serde_json::json!(self.crossover_rate),
                    "Probability of crossing a selected pair",
                )
                .range(0.0, 1.0),
                FieldManifest::new(
                    "stall_threshold",
                    "integer",
                    serde_json::json!(self.stall_threshold),
                    "Stalled offspring before asking for suggestions",
                ),
                FieldManifest::new(
                    "test_insertion_rate",
                    "float",
                    serde_json::json!(self.test_insertion_rate),
                    "Share of the population injected as immigrants",
                )
                .range(0.0, 1.0),
                FieldManifest::new(
                    "tournament_size",
                    "integer",
                    serde_json::json!(self.tournament_size),
                    "Candidates per selection tournament",
                ),
                FieldManifest::new(
                    "search_budget_secs",
                    "integer",
                    serde_json::json!(self.search_budget_secs),
                    "Wall-clock limit of one run",
                ),
                FieldManifest::new(
                    "max_evaluations",
                    "integer",
                    serde_json::json!(self.max_evaluations),
                    "Optional cap on executed chromosomes",
                ),
                FieldManifest::new(
                    "max_generations",
                    "integer",
                    serde_json::json!(self.max_generations),
                    "Optional cap on generations",
                ),
                FieldManifest::new(
                    "execution_timeout_ms",
                    "integer",
                    serde_json::json!(self.execution_timeout_ms),
                    "Per-execution timeout",
                ),
                FieldManifest::new(
                    "seed",
                    "integer",
                    serde_json::json!(self.seed),
                    "Random seed; entropy when absent",
                ),
                FieldManifest::new(
                    "initial_chromosome_length",
                    "integer",
                    serde_json::json!(self.initial_chromosome_length),
                    "Upper bound on actions of a fresh random chromosome",
                ),
                FieldManifest::new(
                    "max_chromosome_length",
                    "integer",
                    serde_json::json!(self.max_chromosome_length),
                    "Mutation stops inserting beyond this length",
                ),
            ],
        }
    }
}
