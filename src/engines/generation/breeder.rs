use crate::config::{ConfigSection, SearchConfig};
use crate::engines::execution::ExecutionEngine;
use crate::engines::generation::budget::SearchBudget;
use crate::engines::generation::chromosome::Chromosome;
use crate::engines::generation::factory::ChromosomeFactory;
use crate::engines::generation::goals::{Goal, GoalManager};
use crate::engines::generation::operators::{tournament_selection, Crossover, CrossoverOperator};
use crate::engines::generation::pareto::{
    calculate_crowding_distance, fast_non_dominated_sort, MultiObjectiveIndividual,
};
use crate::engines::metrics::RunStatistics;
use crate::engines::suggestion::{CrossoverAdvisor, SuggestionPipeline};
use crate::error::{Result, SearchError};
use crate::types::{GoalId, Origin};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;

/// Runs generations of the many-objective search: selection, crossover,
/// mutation, stagnation handling and immigrant injection.
///
/// Suggestion support (seeding, stagnation assistance, advised crossover)
/// is optional and injected; without it the breeder is plain DynaMOSA.
pub struct Breeder {
    config: SearchConfig,
    goals: GoalManager,
    engine: Box<dyn ExecutionEngine>,
    factory: Box<dyn ChromosomeFactory>,
    pipeline: Option<SuggestionPipeline>,
    crossover: Box<dyn Crossover>,
    rng: StdRng,
    stats: RunStatistics,
    budget: SearchBudget,
    population: Vec<Chromosome>,
    generation: usize,
    stalls: usize,
    seeding_disabled: bool,
}

impl Breeder {
    /// Fails when `config` does not validate
    pub fn new(
        config: SearchConfig,
        goals: GoalManager,
        engine: Box<dyn ExecutionEngine>,
        factory: Box<dyn ChromosomeFactory>,
    ) -> Result<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let budget = SearchBudget::new(config.search_budget())
            .with_max_evaluations(config.max_evaluations)
            .with_max_generations(config.max_generations);

        Ok(Self {
            config,
            goals,
            engine,
            factory,
            pipeline: None,
            crossover: Box::new(CrossoverOperator::new(None)),
            rng,
            stats: RunStatistics::default(),
            budget,
            population: Vec::new(),
            generation: 0,
            stalls: 0,
            seeding_disabled: false,
        })
    }

    pub fn with_pipeline(mut self, pipeline: SuggestionPipeline) -> Self {
        self.pipeline = Some(pipeline);
        self
    }

    pub fn with_advisor(mut self, advisor: CrossoverAdvisor) -> Self {
        self.crossover = Box::new(CrossoverOperator::new(Some(advisor)));
        self
    }

    pub fn with_crossover(mut self, crossover: Box<dyn Crossover>) -> Self {
        self.crossover = crossover;
        self
    }

    /// Start the clock; evaluation and generation counters restart too
    pub fn start(&mut self) {
        self.budget.start();
        self.stats.mark_started();
    }

    pub fn is_finished(&self) -> bool {
        self.budget.is_finished()
    }

    /// Execute `chromosome` and fold the result into goals and archive
    pub fn calculate_fitness(&mut self, chromosome: &mut Chromosome) {
        let timeout = self.config.execution_timeout();
        let trace = self.goals.calculate_fitness(chromosome, &mut *self.engine, timeout);
        self.stats.evaluations += 1;
        if trace.timed_out {
            self.stats.timeouts += 1;
        }
        self.budget.record_evaluation();
        chromosome.set_changed(false);
    }

    /// Build generation zero: suggested tests when seeding is enabled, topped
    /// up with random chromosomes to exactly N, then evaluated and ranked.
    pub fn initialize_population(&mut self) {
        let n = self.config.population_size;
        let mut population = self.seeded_population(n);
        population.truncate(n);
        self.stats.initial_population.suggested = population.len();

        while population.len() < n {
            population.push(self.factory.random_chromosome(&mut self.rng));
            self.stats.initial_population.random += 1;
        }

        for chromosome in &mut population {
            chromosome.update_age(self.generation);
            self.calculate_fitness(chromosome);
        }

        log::info!(
            "Initial population: {} suggested, {} random; {} of {} goals covered",
            self.stats.initial_population.suggested,
            self.stats.initial_population.random,
            self.goals.covered_goals().len(),
            self.goals.graph().len()
        );

        rank(&mut population, &self.goals.targets());
        self.population = population;
    }

    fn seeded_population(&mut self, n: usize) -> Vec<Chromosome> {
        let Some(pipeline) = &self.pipeline else {
            return Vec::new();
        };
        if !pipeline.config().initial_population || self.seeding_disabled {
            return Vec::new();
        }

        for round in 0..pipeline.config().initial_population_rounds {
            let outcome = pipeline.seed(n);
            self.stats.pipeline.merge(&outcome.stats);
            if !outcome.is_empty() {
                return outcome.chromosomes;
            }
            log::warn!("Seeding round {} produced no chromosomes", round + 1);
        }

        log::warn!("Falling back to random initial population for the rest of the run");
        self.seeding_disabled = true;
        self.stats.initial_population.fell_back_to_random = true;
        Vec::new()
    }

    /// Produce the offspring of one generation, including suggested
    /// chromosomes and immigrants.
    pub fn breed_offspring(&mut self) -> Vec<Chromosome> {
        let n = self.config.population_size;
        let mut offspring = Vec::with_capacity(n + self.config.immigrant_count());

        for _ in 0..n / 2 {
            if self.budget.is_finished() {
                break;
            }

            let parent1 = tournament_selection(&self.population, self.config.tournament_size, &mut self.rng).clone();
            let parent2 = tournament_selection(&self.population, self.config.tournament_size, &mut self.rng).clone();
            let mut offspring1 = parent1.clone();
            let mut offspring2 = parent2.clone();

            if self.rng.gen::<f64>() < self.config.crossover_rate {
                if let Err(e) = self.crossover.crossover(&mut offspring1, &mut offspring2, &mut self.rng, &mut self.stats) {
                    log::debug!("Skipping pair: {}", e);
                    self.stats.crossover_failures += 1;
                    continue;
                }
            }

            offspring1.remove_unused_actions();
            offspring2.remove_unused_actions();

            // evaluating a child may cover goals; compare on the targets as they
            // were before this pair
            let targets = self.goals.targets();
            for (mut child, parent) in [(offspring1, &parent1), (offspring2, &parent2)] {
                self.mutate_offspring(&mut child, parent);
                if child.is_changed() {
                    child.update_age(self.generation);
                    self.calculate_fitness(&mut child);
                }

                if !child.improves_on(parent, &targets) {
                    self.stalls += 1;
                }
                offspring.push(child);
            }

            if self.stalls >= self.config.stall_threshold {
                self.handle_stagnation(&mut offspring);
            }
        }

        self.inject_immigrants(&mut offspring);
        offspring
    }

    fn mutate_offspring(&mut self, offspring: &mut Chromosome, parent: &Chromosome) {
        if !self.factory.mutate(offspring, &mut self.rng) {
            self.factory.mutate(offspring, &mut self.rng);
        }

        if !offspring.has_unit_invocation(self.factory.unit_name()) {
            *offspring = parent.clone();
            self.factory.insert_action(offspring, &mut self.rng);
            offspring.set_origin(Origin::Mutated);
            offspring.set_changed(true);
        }
    }

    /// Ask the pipeline for help on the worst goals. The stall counter is
    /// reset whatever the outcome.
    fn handle_stagnation(&mut self, offspring: &mut Vec<Chromosome>) {
        self.stats.stagnation_rounds += 1;
        log::debug!("{} stalled offspring in generation {}", self.stalls, self.generation);

        let outcome = match &self.pipeline {
            Some(pipeline) if pipeline.config().stagnation_assistance => {
                let targets: Vec<Goal> = self
                    .goals
                    .low_fitness_branches(&self.population)
                    .into_iter()
                    .filter_map(|(id, _)| self.goals.graph().goal(id).cloned())
                    .collect();
                if targets.is_empty() {
                    None
                } else {
                    Some(pipeline.assist(&targets))
                }
            }
            _ => None,
        };

        if let Some(outcome) = outcome {
            self.stats.pipeline.merge(&outcome.stats);
            for mut chromosome in outcome.chromosomes {
                chromosome.update_age(self.generation);
                self.calculate_fitness(&mut chromosome);
                self.stats.suggested_added += 1;
                offspring.push(chromosome);
            }
        }

        self.stalls = 0;
    }

    fn inject_immigrants(&mut self, offspring: &mut Vec<Chromosome>) {
        for _ in 0..self.config.immigrant_count() {
            if self.budget.is_finished() {
                break;
            }

            let fresh = self.goals.archive().is_empty() || self.rng.gen_bool(0.5);
            let mut immigrant = if fresh {
                self.factory.random_chromosome(&mut self.rng)
            } else {
                let champions = self.goals.archive().solutions();
                let mut clone = champions[self.rng.gen_range(0..champions.len())].clone();
                clone.set_changed(false);
                self.factory.mutate(&mut clone, &mut self.rng);
                clone
            };

            if immigrant.is_changed() {
                immigrant.update_age(self.generation);
                self.calculate_fitness(&mut immigrant);
                self.stats.immigrants += 1;
                offspring.push(immigrant);
            }
        }
    }

    /// Breed, then keep the best N of parents and offspring
    pub fn evolve(&mut self) {
        let offspring = self.breed_offspring();

        let mut union = std::mem::take(&mut self.population);
        union.extend(offspring);
        self.population = fill_next_generation(union, &self.goals.targets(), self.config.population_size);

        self.generation += 1;
        self.stats.generations += 1;
        self.budget.record_generation();

        log::debug!(
            "Generation {}: covered {}, current {}, uncovered {}",
            self.generation,
            self.goals.covered_goals().len(),
            self.goals.current_goals().len(),
            self.goals.uncovered_goals().len()
        );
    }

    /// Prune every champion and re-execute it; a champion that no longer
    /// covers its goal is a fatal defect.
    pub fn post_process(&mut self) -> Result<()> {
        let timeout = self.config.execution_timeout();
        let champions: Vec<(GoalId, Chromosome)> = self
            .goals
            .archive()
            .champions()
            .map(|(goal, c)| (goal, c.clone()))
            .collect();

        for (goal, mut champion) in champions {
            champion.remove_unused_actions();
            let trace = self.engine.execute(&champion, timeout);
            let distance = trace.distance(goal);
            if distance != 0.0 {
                return Err(SearchError::InvariantViolation { goal, distance });
            }
            for (id, d) in &trace.distances {
                champion.set_distance(*id, *d);
            }
            champion.set_cached_trace(trace);
            champion.set_changed(false);
            self.goals.archive_mut().replace(goal, champion);
        }

        self.stats.mark_finished();
        Ok(())
    }

    pub fn stall_count(&self) -> usize {
        self.stalls
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[Chromosome] {
        &self.population
    }

    pub fn goals(&self) -> &GoalManager {
        &self.goals
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.stats
    }

    pub fn budget(&self) -> &SearchBudget {
        &self.budget
    }
}

/// Rank `chromosomes` over `targets`; sets rank and crowding distance and
/// returns the fronts as indices.
pub fn rank(chromosomes: &mut [Chromosome], targets: &[GoalId]) -> Vec<Vec<usize>> {
    let mut individuals: Vec<MultiObjectiveIndividual<usize>> = chromosomes
        .iter()
        .enumerate()
        .map(|(i, c)| MultiObjectiveIndividual::new(i, c.objectives(targets)))
        .collect();

    let fronts = fast_non_dominated_sort(&mut individuals);
    for front in &fronts {
        calculate_crowding_distance(&mut individuals, front);
    }

    for individual in &individuals {
        let chromosome = &mut chromosomes[individual.data];
        chromosome.rank = individual.rank;
        chromosome.crowding_distance = individual.crowding_distance;
    }
    fronts
}

/// Select the next population from `union`: whole fronts while they fit,
/// then the most isolated members of the overflowing front. Capacity is
/// `max(n, |front 0|)`, so a first front is never cut.
pub fn fill_next_generation(mut union: Vec<Chromosome>, targets: &[GoalId], n: usize) -> Vec<Chromosome> {
    let fronts = rank(&mut union, targets);
    let capacity = n.max(fronts.first().map_or(0, Vec::len));

    let mut slots: Vec<Option<Chromosome>> = union.into_iter().map(Some).collect();
    let mut next = Vec::with_capacity(capacity);

    for mut front in fronts {
        let remaining = capacity - next.len();
        if remaining == 0 {
            break;
        }
        if front.len() > remaining {
            let crowding = |i: usize| slots[i].as_ref().map_or(0.0, |c| c.crowding_distance);
            front.sort_by(|&a, &b| crowding(b).partial_cmp(&crowding(a)).unwrap_or(Ordering::Equal));
            front.truncate(remaining);
        }
        next.extend(front.into_iter().filter_map(|i| slots[i].take()));
    }
    next
}
