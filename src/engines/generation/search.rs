use crate::engines::generation::breeder::Breeder;
use crate::engines::generation::chromosome::Chromosome;
use crate::engines::generation::progress::{ProgressCallback, SilentProgressCallback};
use crate::engines::metrics::RunStatistics;
use crate::error::Result;
use crate::types::GoalId;

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// What a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub covered: Vec<GoalId>,
    pub uncovered: Vec<GoalId>,
    pub champions: BTreeMap<GoalId, Chromosome>,
    pub generations: usize,
    pub statistics: RunStatistics,
}

impl SearchOutcome {
    pub fn coverage(&self) -> f64 {
        let total = self.covered.len() + self.uncovered.len();
        if total == 0 {
            return 1.0;
        }
        self.covered.len() as f64 / total as f64
    }
}

pub struct SearchEngine {
    breeder: Breeder,
}

impl SearchEngine {
    pub fn new(breeder: Breeder) -> Self {
        Self { breeder }
    }

    pub fn breeder(&self) -> &Breeder {
        &self.breeder
    }

    /// Evolve until the budget runs out or no target is left, then verify
    /// the archive.
    pub fn run<C: ProgressCallback>(&mut self, mut callback: C) -> Result<SearchOutcome> {
        self.breeder.start();
        self.breeder.initialize_population();

        let total = self.breeder.goals().graph().len();
        while !self.breeder.is_finished() && self.breeder.goals().has_targets() {
            let generation = self.breeder.generation();
            callback.on_generation_start(generation);

            self.breeder.evolve();

            callback.on_generation_complete(generation, self.breeder.goals().covered_goals().len(), total);
        }

        self.breeder.post_process()?;

        let goals = self.breeder.goals();
        let outcome = SearchOutcome {
            covered: goals.covered_goals().iter().copied().collect(),
            uncovered: goals.uncovered_goals(),
            champions: goals
                .archive()
                .champions()
                .map(|(goal, c)| (goal, c.clone()))
                .collect(),
            generations: self.breeder.generation(),
            statistics: self.breeder.statistics().clone(),
        };

        log::info!(
            "Search finished after {} generations and {} evaluations: {}/{} goals covered",
            outcome.generations,
            outcome.statistics.evaluations,
            outcome.covered.len(),
            total
        );
        callback.on_search_finished(outcome.generations, outcome.covered.len(), total);
        Ok(outcome)
    }
}

/// Run `workers` independent searches in parallel. `build` receives the
/// worker index and must give each worker its own collaborators (e.g. a
/// namespaced scratch space).
pub fn run_workers<F>(workers: usize, build: F) -> Vec<Result<SearchOutcome>>
where
    F: Fn(usize) -> Result<SearchEngine> + Sync,
{
    (0..workers)
        .into_par_iter()
        .map(|worker| {
            let mut engine = build(worker)?;
            log::debug!("Worker {} started", worker);
            engine.run(SilentProgressCallback)
        })
        .collect()
}
