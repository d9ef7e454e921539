use thiserror::Error;

use crate::types::GoalId;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Invalid goal graph: {0}")]
    InvalidGoalGraph(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Crossover error: {0}")]
    Crossover(String),

    #[error("Post-processing made goal {goal} uncovered again (distance {distance})")]
    InvariantViolation { goal: GoalId, distance: f64 },

    #[error("Suggestion error: {0}")]
    Suggestion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SearchError>;
