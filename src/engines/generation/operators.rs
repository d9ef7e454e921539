use crate::engines::generation::chromosome::Chromosome;
use crate::engines::generation::pareto::crowded_comparison;
use crate::engines::suggestion::advisor::CrossoverAdvisor;
use crate::engines::metrics::RunStatistics;
use crate::error::{Result, SearchError};
use rand::{Rng, RngCore};

/// Tournament selection: pick best of K random candidates by rank, then crowding distance
pub fn tournament_selection<'a, R: Rng + ?Sized>(
    population: &'a [Chromosome],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Chromosome {
    let mut best_idx = rng.gen_range(0..population.len());

    for _ in 1..tournament_size.max(1) {
        let idx = rng.gen_range(0..population.len());
        let (a, b) = (&population[idx], &population[best_idx]);
        if crowded_comparison(a.rank, a.crowding_distance, b.rank, b.crowding_distance) {
            best_idx = idx;
        }
    }

    &population[best_idx]
}

/// Random split positions at the same relative point of both parents
pub fn random_split_points<R: Rng + ?Sized>(len1: usize, len2: usize, rng: &mut R) -> (usize, usize) {
    let split: f64 = rng.gen();
    let pos1 = ((len1 - 1) as f64 * split).floor() as usize + 1;
    let pos2 = ((len2 - 1) as f64 * split).floor() as usize + 1;
    (pos1, pos2)
}

/// Recombines two offspring in place
pub trait Crossover: Send {
    /// `Err` rejects the pair; the caller skips it
    fn crossover(
        &self,
        offspring1: &mut Chromosome,
        offspring2: &mut Chromosome,
        rng: &mut dyn RngCore,
        stats: &mut RunStatistics,
    ) -> Result<()>;
}

/// Single-point crossover, optionally asking an advisor for the split points
pub struct CrossoverOperator {
    advisor: Option<CrossoverAdvisor>,
}

impl CrossoverOperator {
    pub fn new(advisor: Option<CrossoverAdvisor>) -> Self {
        Self { advisor }
    }
}

impl Crossover for CrossoverOperator {
    /// Cross `offspring1` and `offspring2` in place. Both must keep at least
    /// one action, otherwise the pair is rejected. Parents shorter than two
    /// actions are left alone and not counted.
    fn crossover(
        &self,
        offspring1: &mut Chromosome,
        offspring2: &mut Chromosome,
        rng: &mut dyn RngCore,
        stats: &mut RunStatistics,
    ) -> Result<()> {
        if offspring1.size() < 2 || offspring2.size() < 2 {
            return Ok(());
        }
        stats.crossovers += 1;

        let t1 = offspring1.clone();
        let t2 = offspring2.clone();

        let advised = match &self.advisor {
            Some(advisor) => advisor.suggest(&t1, &t2, rng, &mut stats.advisor),
            None => None,
        };
        let (pos1, pos2) = advised.unwrap_or_else(|| random_split_points(t1.size(), t2.size(), rng));

        offspring1.splice(&t2, pos1, pos2);
        offspring2.splice(&t1, pos2, pos1);

        if offspring1.is_empty() || offspring2.is_empty() {
            return Err(SearchError::Crossover(format!(
                "splice at ({}, {}) produced an empty chromosome",
                pos1, pos2
            )));
        }
        Ok(())
    }
}
