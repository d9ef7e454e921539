// src/engines/metrics/statistics.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters of one suggestion pipeline invocation, merged by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub rounds: usize,
    pub successful_rounds: usize,
    pub submit_attempts: usize,
    pub submit_successes: usize,
    pub compile_attempts: usize,
    pub compile_successes: usize,
    pub malformed_responses: usize,
    pub extracted: usize,
}

impl PipelineStats {
    pub fn merge(&mut self, other: &PipelineStats) {
        self.rounds += other.rounds;
        self.successful_rounds += other.successful_rounds;
        self.submit_attempts += other.submit_attempts;
        self.submit_successes += other.submit_successes;
        self.compile_attempts += other.compile_attempts;
        self.compile_successes += other.compile_successes;
        self.malformed_responses += other.malformed_responses;
        self.extracted += other.extracted;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisorStats {
    pub attempts: usize,
    pub successes: usize,
    pub fallbacks: usize,
}

/// How the initial population was produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedingStats {
    pub suggested: usize,
    pub random: usize,
    pub fell_back_to_random: bool,
}

/// Everything counted during one search run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStatistics {
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub generations: usize,
    pub evaluations: usize,
    pub timeouts: usize,
    pub crossovers: usize,
    pub crossover_failures: usize,
    pub stagnation_rounds: usize,
    pub suggested_added: usize,
    pub immigrants: usize,
    pub pipeline: PipelineStats,
    pub advisor: AdvisorStats,
    pub initial_population: SeedingStats,
}

impl RunStatistics {
    pub fn mark_started(&mut self) {
        self.started_at = Some(Utc::now());
    }

    pub fn mark_finished(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Fold the counters of another run (e.g. a parallel worker) into this one
    pub fn merge(&mut self, other: &RunStatistics) {
        self.started_at = match (self.started_at, other.started_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.finished_at = match (self.finished_at, other.finished_at) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.generations += other.generations;
        self.evaluations += other.evaluations;
        self.timeouts += other.timeouts;
        self.crossovers += other.crossovers;
        self.crossover_failures += other.crossover_failures;
        self.stagnation_rounds += other.stagnation_rounds;
        self.suggested_added += other.suggested_added;
        self.immigrants += other.immigrants;
        self.pipeline.merge(&other.pipeline);
        self.advisor.attempts += other.advisor.attempts;
        self.advisor.successes += other.advisor.successes;
        self.advisor.fallbacks += other.advisor.fallbacks;
        self.initial_population.suggested += other.initial_population.suggested;
        self.initial_population.random += other.initial_population.random;
        self.initial_population.fell_back_to_random |= other.initial_population.fell_back_to_random;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
