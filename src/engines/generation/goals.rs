use crate::engines::execution::ExecutionEngine;
use crate::engines::generation::archive::Archive;
use crate::engines::generation::chromosome::Chromosome;
use crate::error::{Result, SearchError};
use crate::types::{ExecutionTrace, GoalId, UNREACHED};

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::time::Duration;

/// One coverage objective
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Goal {
    pub id: GoalId,
    pub label: String,
}

impl Goal {
    pub fn new(id: usize, label: impl Into<String>) -> Self {
        Self {
            id: GoalId(id),
            label: label.into(),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Goals plus prerequisite edges; a goal is reachable once all of its
/// prerequisites are covered.
#[derive(Debug, Clone)]
pub struct GoalGraph {
    goals: Vec<Goal>,
    prerequisites: HashMap<GoalId, Vec<GoalId>>,
}

impl GoalGraph {
    /// `edges` are `(goal, prerequisite)` pairs
    pub fn new(goals: Vec<Goal>, edges: &[(GoalId, GoalId)]) -> Result<Self> {
        let known: BTreeSet<GoalId> = goals.iter().map(|g| g.id).collect();
        if known.len() != goals.len() {
            return Err(SearchError::InvalidGoalGraph("duplicate goal id".to_string()));
        }

        let mut prerequisites: HashMap<GoalId, Vec<GoalId>> = HashMap::new();
        for &(goal, prerequisite) in edges {
            if !known.contains(&goal) || !known.contains(&prerequisite) {
                return Err(SearchError::InvalidGoalGraph(format!(
                    "edge {} -> {} references an unknown goal",
                    prerequisite, goal
                )));
            }
            if goal == prerequisite {
                return Err(SearchError::InvalidGoalGraph(format!(
                    "{} lists itself as prerequisite",
                    goal
                )));
            }
            prerequisites.entry(goal).or_default().push(prerequisite);
        }

        Ok(Self { goals, prerequisites })
    }

    /// Graph without dependencies: every goal is active from the start
    pub fn flat(goals: Vec<Goal>) -> Result<Self> {
        Self::new(goals, &[])
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn goal(&self, id: GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    pub fn prerequisites(&self, id: GoalId) -> &[GoalId] {
        self.prerequisites.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

/// Tracks which goals are active and covered and keeps the per-goal archive.
pub struct GoalManager {
    graph: GoalGraph,
    current: BTreeSet<GoalId>,
    covered: BTreeSet<GoalId>,
    archive: Archive,
    timeouts: usize,
}

impl GoalManager {
    pub fn new(graph: GoalGraph) -> Self {
        let current = graph
            .goals()
            .iter()
            .filter(|g| graph.prerequisites(g.id).is_empty())
            .map(|g| g.id)
            .collect();
        Self {
            graph,
            current,
            covered: BTreeSet::new(),
            archive: Archive::new(),
            timeouts: 0,
        }
    }

    /// Execute `chromosome`, record its distances, update coverage and the
    /// archive, and activate goals whose prerequisites became covered.
    pub fn calculate_fitness(
        &mut self,
        chromosome: &mut Chromosome,
        engine: &mut dyn ExecutionEngine,
        timeout: Duration,
    ) -> ExecutionTrace {
        let trace = engine.execute(chromosome, timeout);

        if trace.timed_out {
            self.timeouts += 1;
            log::warn!("Execution timed out after {:?}; no coverage credited", timeout);
        }

        for goal in self.graph.goals() {
            chromosome.set_distance(goal.id, trace.distance(goal.id));
        }

        let mut worklist: Vec<GoalId> = self.current.iter().copied().collect();
        while let Some(goal) = worklist.pop() {
            if chromosome.distance(goal) != 0.0 {
                continue;
            }
            if self.covered.insert(goal) {
                log::debug!("Covered {}", goal);
            }
            self.archive.try_add(goal, chromosome);

            for newly_active in self.activate_reachable() {
                worklist.push(newly_active);
            }
        }

        chromosome.set_cached_trace(trace.clone());
        trace
    }

    /// Activate every inactive goal whose prerequisites are all covered
    fn activate_reachable(&mut self) -> Vec<GoalId> {
        let ready: Vec<GoalId> = self
            .graph
            .goals()
            .iter()
            .map(|g| g.id)
            .filter(|id| !self.current.contains(id))
            .filter(|id| {
                self.graph
                    .prerequisites(*id)
                    .iter()
                    .all(|p| self.covered.contains(p))
            })
            .collect();
        for id in &ready {
            log::debug!("Activated {}", id);
            self.current.insert(*id);
        }
        ready
    }

    /// Active, uncovered goals whose population-best distance is at least the
    /// median of all such bests, worst first.
    pub fn low_fitness_branches(&self, population: &[Chromosome]) -> Vec<(GoalId, f64)> {
        if population.is_empty() {
            return Vec::new();
        }

        let mut bests: Vec<(GoalId, f64)> = self
            .targets()
            .into_iter()
            .map(|goal| {
                let best = population
                    .iter()
                    .map(|c| c.distance(goal))
                    .fold(UNREACHED, f64::min);
                (goal, best)
            })
            .collect();
        if bests.is_empty() {
            return bests;
        }

        bests.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        let median = bests[bests.len() / 2].1;
        bests.retain(|(_, best)| *best >= median);
        bests
    }

    /// Goals whose prerequisites are all covered (covered ones included)
    pub fn current_goals(&self) -> &BTreeSet<GoalId> {
        &self.current
    }

    pub fn covered_goals(&self) -> &BTreeSet<GoalId> {
        &self.covered
    }

    /// Every goal of the graph that is not yet covered
    pub fn uncovered_goals(&self) -> Vec<GoalId> {
        self.graph
            .goals()
            .iter()
            .map(|g| g.id)
            .filter(|id| !self.covered.contains(id))
            .collect()
    }

    /// Active and uncovered: what the ranking optimises
    pub fn targets(&self) -> Vec<GoalId> {
        self.current.difference(&self.covered).copied().collect()
    }

    pub fn has_targets(&self) -> bool {
        self.current.iter().any(|g| !self.covered.contains(g))
    }

    pub fn is_covered(&self, goal: GoalId) -> bool {
        self.covered.contains(&goal)
    }

    pub fn is_current(&self, goal: GoalId) -> bool {
        self.current.contains(&goal)
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    pub(crate) fn archive_mut(&mut self) -> &mut Archive {
        &mut self.archive
    }

    pub fn graph(&self) -> &GoalGraph {
        &self.graph
    }

    pub fn timeouts(&self) -> usize {
        self.timeouts
    }
}
