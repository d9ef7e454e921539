//! Chromosome representation for test-suite search
//!
//! A chromosome is one candidate test: an ordered sequence of [`Action`]s that
//! the execution engine replays against the unit under test. The search never
//! interprets actions itself; it only needs to
//! - copy them around (crossover, cloning parents into offspring)
//! - drop dead definitions that nothing reads
//! - know whether the unit under test is touched at all
//!
//! Fitness is a distance per goal: 0 means covered, larger is further away.
//! Every edit to the action sequence marks the chromosome as changed and
//! drops the cached execution trace, so stale results can never be reused.
use crate::engines::generation::action::Action;
use crate::types::{ExecutionTrace, GoalId, Origin, ValueType, VarId, UNREACHED};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub struct Chromosome {
    actions: Vec<Action>,
    age: usize,
    fitness: HashMap<GoalId, f64>,
    changed: bool,
    origin: Origin,
    pub rank: usize,
    pub crowding_distance: f64,
    next_var: VarId,
    #[serde(skip)]
    cached_trace: Option<ExecutionTrace>,
}

impl Clone for Chromosome {
    fn clone(&self) -> Self {
        Self {
            actions: self.actions.clone(),
            age: self.age,
            fitness: self.fitness.clone(),
            changed: self.changed,
            origin: self.origin,
            rank: self.rank,
            crowding_distance: self.crowding_distance,
            next_var: self.next_var,
            cached_trace: None,
        }
    }
}

impl Default for Chromosome {
    fn default() -> Self {
        Self::new(Origin::Random)
    }
}

impl Chromosome {
    pub fn new(origin: Origin) -> Self {
        Self {
            actions: Vec::new(),
            age: 0,
            fitness: HashMap::new(),
            changed: true,
            origin,
            rank: 0,
            crowding_distance: 0.0,
            next_var: 0,
            cached_trace: None,
        }
    }

    /// Build from an externally produced action list (e.g. carved tests)
    pub fn from_actions(actions: Vec<Action>, origin: Origin) -> Self {
        let next_var = actions
            .iter()
            .filter_map(|a| a.output())
            .max()
            .map_or(0, |v| v + 1);
        Self {
            actions,
            next_var,
            ..Self::new(origin)
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn size(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn age(&self) -> usize {
        self.age
    }

    pub fn update_age(&mut self, generation: usize) {
        self.age = generation;
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = origin;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn set_changed(&mut self, changed: bool) {
        self.changed = changed;
    }

    pub fn fresh_var(&mut self) -> VarId {
        let id = self.next_var;
        self.next_var += 1;
        id
    }

    fn touch(&mut self) {
        self.changed = true;
        self.cached_trace = None;
    }

    pub fn push(&mut self, action: Action) {
        if let Some(out) = action.output() {
            self.next_var = self.next_var.max(out + 1);
        }
        self.actions.push(action);
        self.touch();
    }

    pub fn insert(&mut self, position: usize, action: Action) {
        if let Some(out) = action.output() {
            self.next_var = self.next_var.max(out + 1);
        }
        let position = position.min(self.actions.len());
        self.actions.insert(position, action);
        self.touch();
    }

    /// Mutable access to one action; the chromosome counts as edited
    pub fn action_mut(&mut self, position: usize) -> Option<&mut Action> {
        if position >= self.actions.len() {
            return None;
        }
        self.touch();
        self.actions.get_mut(position)
    }

    /// Remove the action at `position` together with everything that
    /// (transitively) reads its output. Returns the number of removed actions.
    pub fn remove(&mut self, position: usize) -> usize {
        if position >= self.actions.len() {
            return 0;
        }
        let removed = self.actions.remove(position);
        let mut dead: HashSet<VarId> = removed.output().into_iter().collect();
        let mut count = 1;
        let mut i = position;
        while i < self.actions.len() {
            if self.actions[i].inputs().any(|v| dead.contains(&v)) {
                let gone = self.actions.remove(i);
                dead.extend(gone.output());
                count += 1;
            } else {
                i += 1;
            }
        }
        self.touch();
        count
    }

    /// Replace the whole action sequence (e.g. to restore a parent's body)
    pub fn set_actions(&mut self, actions: Vec<Action>) {
        let max_out = actions.iter().filter_map(|a| a.output()).max();
        self.next_var = self.next_var.max(max_out.map_or(0, |v| v + 1));
        self.actions = actions;
        self.touch();
    }

    /// Variables of type `ty` defined strictly before `position`
    pub fn variables_of_type(&self, ty: &ValueType, position: usize) -> Vec<VarId> {
        self.actions
            .iter()
            .take(position)
            .filter(|a| a.output_type().as_ref() == Some(ty))
            .filter_map(|a| a.output())
            .collect()
    }

    pub fn has_unit_invocation(&self, unit: &str) -> bool {
        self.actions.iter().any(|a| a.invokes(unit))
    }

    /// Drop side-effect-free actions whose result nobody reads later.
    /// Repeats until nothing changes; returns whether anything was removed.
    pub fn remove_unused_actions(&mut self) -> bool {
        let size_before = self.actions.len();
        loop {
            let mut to_delete = Vec::new();
            for (pos, action) in self.actions.iter().enumerate() {
                if !action.is_side_effect_free() {
                    continue;
                }
                let Some(out) = action.output() else { continue };
                let referenced = self.actions[pos + 1..].iter().any(|a| a.reads_variable(out));
                if !referenced {
                    to_delete.push(pos);
                }
            }
            if to_delete.is_empty() {
                break;
            }
            for pos in to_delete.into_iter().rev() {
                self.actions.remove(pos);
            }
        }
        let removed = size_before - self.actions.len();
        if removed > 0 {
            log::debug!("Removed {} unused actions", removed);
            self.touch();
        }
        removed > 0
    }

    /// Single-point splice: keep `self[..pos1]` and append `other[pos2..]`.
    ///
    /// Tail variables are renamed into this chromosome's namespace. A read of
    /// a variable that only existed in `other`'s discarded prefix is rebound
    /// to an earlier variable of the same type; when there is none the action
    /// is dropped.
    pub fn splice(&mut self, other: &Chromosome, pos1: usize, pos2: usize) {
        let pos1 = pos1.min(self.actions.len());
        let pos2 = pos2.min(other.actions.len());
        self.actions.truncate(pos1);

        let mut renamed: HashMap<VarId, VarId> = HashMap::new();
        let other_types: HashMap<VarId, ValueType> = other
            .actions
            .iter()
            .filter_map(|a| Some((a.output()?, a.output_type()?)))
            .collect();

        for action in &other.actions[pos2..] {
            let mut mapping: HashMap<VarId, VarId> = HashMap::new();
            let mut resolvable = true;
            for var in action.inputs() {
                if let Some(&new_var) = renamed.get(&var) {
                    mapping.insert(var, new_var);
                    continue;
                }
                let candidate = other_types.get(&var).and_then(|ty| {
                    self.variables_of_type(ty, self.actions.len()).last().copied()
                });
                match candidate {
                    Some(local) => {
                        mapping.insert(var, local);
                    }
                    None => {
                        resolvable = false;
                        break;
                    }
                }
            }
            if !resolvable {
                continue;
            }
            let mut copy = action.clone();
            copy.remap_inputs(|v| mapping.get(&v).copied().unwrap_or(v));
            if let Some(out) = action.output() {
                let fresh = self.fresh_var();
                copy.set_output(fresh);
                renamed.insert(out, fresh);
            }
            self.actions.push(copy);
        }
        self.touch();
    }

    pub fn fitness_values(&self) -> &HashMap<GoalId, f64> {
        &self.fitness
    }

    pub fn set_distance(&mut self, goal: GoalId, distance: f64) {
        self.fitness.insert(goal, distance);
    }

    /// Distance to `goal`; unreached if never measured
    pub fn distance(&self, goal: GoalId) -> f64 {
        self.fitness.get(&goal).copied().unwrap_or(UNREACHED)
    }

    pub fn covers(&self, goal: GoalId) -> bool {
        self.distance(goal) == 0.0
    }

    /// Objective vector over `goals`, in order
    pub fn objectives(&self, goals: &[GoalId]) -> Vec<f64> {
        goals.iter().map(|g| self.distance(*g)).collect()
    }

    /// Sum of normalised distances `d / (d + 1)` over `goals`; lower is
    /// better. Each term lies in [0, 1], so unreached goals count as 1 and
    /// the sum never saturates.
    pub fn aggregate_fitness(&self, goals: &[GoalId]) -> f64 {
        goals.iter().map(|g| normalize(self.distance(*g))).sum()
    }

    /// Whether this chromosome is strictly fitter than `parent` over `goals`:
    /// it covers a goal the parent does not, or has a lower aggregate.
    pub fn improves_on(&self, parent: &Chromosome, goals: &[GoalId]) -> bool {
        goals.iter().any(|g| self.covers(*g) && !parent.covers(*g))
            || self.aggregate_fitness(goals) < parent.aggregate_fitness(goals)
    }

    /// Forget everything learned from previous executions
    pub fn clear_cached_results(&mut self) {
        self.cached_trace = None;
        self.fitness.clear();
    }

    pub fn cached_trace(&self) -> Option<&ExecutionTrace> {
        self.cached_trace.as_ref()
    }

    pub fn set_cached_trace(&mut self, trace: ExecutionTrace) {
        self.cached_trace = Some(trace);
    }
}

fn normalize(distance: f64) -> f64 {
    if distance >= UNREACHED {
        return 1.0;
    }
    distance / (distance + 1.0)
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, action) in self.actions.iter().enumerate() {
            writeln!(f, "{}: {}", i + 1, action)?;
        }
        Ok(())
    }
}
