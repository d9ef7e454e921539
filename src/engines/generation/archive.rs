use crate::engines::generation::chromosome::Chromosome;
use crate::types::GoalId;

use std::collections::BTreeMap;

/// Best known chromosome for every covered goal.
///
/// A champion is only ever replaced by a chromosome that covers the same goal
/// and is strictly shorter. On equal length the incumbent stays.
#[derive(Debug, Default, Clone)]
pub struct Archive {
    champions: BTreeMap<GoalId, Chromosome>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `candidate` as champion for `goal`.
    /// Returns true when it was stored.
    pub fn try_add(&mut self, goal: GoalId, candidate: &Chromosome) -> bool {
        if !candidate.covers(goal) {
            return false;
        }

        match self.champions.get(&goal) {
            Some(current) if current.size() <= candidate.size() => false,
            _ => {
                self.champions.insert(goal, candidate.clone());
                true
            }
        }
    }

    /// Overwrite the champion of an already covered goal.
    /// Used by post-processing after re-verification.
    pub(crate) fn replace(&mut self, goal: GoalId, champion: Chromosome) {
        self.champions.insert(goal, champion);
    }

    pub fn get(&self, goal: GoalId) -> Option<&Chromosome> {
        self.champions.get(&goal)
    }

    pub fn champions(&self) -> impl Iterator<Item = (GoalId, &Chromosome)> {
        self.champions.iter().map(|(g, c)| (*g, c))
    }

    /// All champions, in goal order
    pub fn solutions(&self) -> Vec<&Chromosome> {
        self.champions.values().collect()
    }

    pub fn len(&self) -> usize {
        self.champions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.champions.is_empty()
    }
}
