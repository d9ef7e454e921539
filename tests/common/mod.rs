#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::RngCore;
use suitegen::config::{SearchConfig, SuggestionConfig};
use suitegen::engines::execution::ExecutionEngine;
use suitegen::engines::generation::{
    Action, Chromosome, ChromosomeFactory, Goal, GoalGraph, Operation, UnitSurface,
};
use suitegen::engines::suggestion::{
    CompileRequest, Compiler, Reply, ScratchSpace, SuggestionClient, SuggestionPipeline, UnitUnderTest,
};
use suitegen::types::{ExecutionTrace, GoalId, Origin, ValueType};

pub const UNIT: &str = "Stack";

pub fn stack_surface() -> UnitSurface {
    UnitSurface {
        name: UNIT.to_string(),
        constructors: vec![Operation::constructor(vec![])],
        methods: vec![
            Operation::method("push", vec![ValueType::Int], None),
            Operation::method("pop", vec![], Some(ValueType::Int)),
            Operation::method("peek", vec![], Some(ValueType::Int)),
        ],
    }
}

pub fn flat_goals(count: usize) -> GoalGraph {
    GoalGraph::flat((0..count).map(|i| Goal::new(i, format!("line {}", 10 + i))).collect()).unwrap()
}

pub fn quick_config(population_size: usize) -> SearchConfig {
    SearchConfig {
        population_size,
        seed: Some(7),
        search_budget_secs: 30,
        max_generations: Some(10),
        execution_timeout_ms: 100,
        initial_chromosome_length: 4,
        max_chromosome_length: 20,
        ..Default::default()
    }
}

pub fn unit_calls(chromosome: &Chromosome) -> usize {
    chromosome.actions().iter().filter(|a| a.invokes(UNIT)).count()
}

pub fn single_call_chromosome() -> Chromosome {
    Chromosome::from_actions(
        vec![Action::Construct {
            out: 0,
            target: UNIT.to_string(),
            args: vec![],
        }],
        Origin::Random,
    )
}

/// Goal `k` is at distance `max(0, k + 1 - calls)`, where calls counts the
/// actions touching the unit. Optionally stops covering anything after a
/// number of executions.
pub struct CountingEngine {
    goals: usize,
    executions: Arc<AtomicUsize>,
    broken_after: Option<usize>,
}

impl CountingEngine {
    pub fn new(goals: usize) -> Self {
        Self {
            goals,
            executions: Arc::new(AtomicUsize::new(0)),
            broken_after: None,
        }
    }

    pub fn broken_after(goals: usize, executions: usize) -> Self {
        Self {
            broken_after: Some(executions),
            ..Self::new(goals)
        }
    }

    pub fn executions(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.executions)
    }
}

impl ExecutionEngine for CountingEngine {
    fn execute(&mut self, chromosome: &Chromosome, _timeout: Duration) -> ExecutionTrace {
        let run = self.executions.fetch_add(1, Ordering::SeqCst);
        let broken = matches!(self.broken_after, Some(limit) if run >= limit);
        let calls = unit_calls(chromosome) as f64;

        let mut trace = ExecutionTrace::default();
        for k in 0..self.goals {
            let distance = if broken { 1.0 } else { ((k + 1) as f64 - calls).max(0.0) };
            trace.distances.insert(GoalId(k), distance);
        }
        trace
    }
}

/// Every goal stays at distance 1 forever
pub struct StubbornEngine {
    pub goals: usize,
}

impl ExecutionEngine for StubbornEngine {
    fn execute(&mut self, _chromosome: &Chromosome, _timeout: Duration) -> ExecutionTrace {
        let mut trace = ExecutionTrace::default();
        for k in 0..self.goals {
            trace.distances.insert(GoalId(k), 1.0);
        }
        trace
    }
}

/// Replays fixed traces in order, repeating the last one
pub struct ScriptedEngine {
    traces: VecDeque<ExecutionTrace>,
    last: ExecutionTrace,
}

impl ScriptedEngine {
    pub fn new(traces: Vec<ExecutionTrace>) -> Self {
        Self {
            traces: traces.into(),
            last: ExecutionTrace::default(),
        }
    }
}

impl ExecutionEngine for ScriptedEngine {
    fn execute(&mut self, _chromosome: &Chromosome, _timeout: Duration) -> ExecutionTrace {
        if let Some(trace) = self.traces.pop_front() {
            self.last = trace;
        }
        self.last.clone()
    }
}

pub fn trace(distances: &[(usize, f64)]) -> ExecutionTrace {
    let mut trace = ExecutionTrace::default();
    for &(goal, d) in distances {
        trace.distances.insert(GoalId(goal), d);
    }
    trace
}

/// Factory whose every mutation appends one constructor call
pub struct AppendFactory;

impl ChromosomeFactory for AppendFactory {
    fn unit_name(&self) -> &str {
        UNIT
    }

    fn random_chromosome(&self, _rng: &mut dyn RngCore) -> Chromosome {
        let mut c = single_call_chromosome();
        c.set_changed(true);
        c
    }

    fn mutate(&self, chromosome: &mut Chromosome, rng: &mut dyn RngCore) -> bool {
        self.insert_action(chromosome, rng);
        chromosome.set_origin(Origin::Mutated);
        true
    }

    fn insert_action(&self, chromosome: &mut Chromosome, _rng: &mut dyn RngCore) -> bool {
        let out = chromosome.fresh_var();
        chromosome.push(Action::Construct {
            out,
            target: UNIT.to_string(),
            args: vec![],
        });
        true
    }
}

/// Replays replies in order, then repeats `fallback`
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(reply: Reply) -> Arc<Self> {
        Self::new(Vec::new(), reply)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SuggestionClient for ScriptedClient {
    fn submit(&self, _prompt: &str, _model: &str) -> Reply {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

pub fn fenced(code: &str) -> Reply {
    Reply::Text(format!("Sure:\n```java\n{}\n```\n", code))
}

#[derive(Debug, Clone, Copy)]
pub enum CompileScript {
    Fails,
    Nothing,
    Empty,
    Yields(usize),
}

/// Compiler double that records what it was given
pub struct ScriptedCompiler {
    script: Mutex<VecDeque<CompileScript>>,
    fallback: CompileScript,
    calls: Arc<AtomicUsize>,
    sources: Arc<Mutex<Vec<String>>>,
}

impl ScriptedCompiler {
    pub fn new(script: Vec<CompileScript>, fallback: CompileScript) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: Arc::new(AtomicUsize::new(0)),
            sources: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    pub fn sources(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.sources)
    }
}

impl Compiler for ScriptedCompiler {
    fn compile_and_extract(&self, request: &CompileRequest<'_>) -> anyhow::Result<Option<Vec<Chromosome>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let written = std::fs::read_to_string(request.artifact)?;
        self.sources.lock().unwrap().push(written);

        let step = self.script.lock().unwrap().pop_front().unwrap_or(self.fallback);
        match step {
            CompileScript::Fails => anyhow::bail!("cannot find symbol"),
            CompileScript::Nothing => Ok(None),
            CompileScript::Empty => Ok(Some(Vec::new())),
            CompileScript::Yields(n) => Ok(Some((0..n).map(|_| single_call_chromosome()).collect())),
        }
    }
}

pub fn no_sleep() -> suitegen::engines::suggestion::Sleeper {
    Arc::new(|_: Duration| {})
}

pub fn suggestion_config() -> SuggestionConfig {
    SuggestionConfig {
        classpath: "/tmp/classes".to_string(),
        ..Default::default()
    }
}

pub fn pipeline(
    config: SuggestionConfig,
    client: Arc<ScriptedClient>,
    compiler: ScriptedCompiler,
    worker: usize,
) -> SuggestionPipeline {
    let unit = UnitUnderTest::new("com.example.Stack", "public class Stack { }", "/tmp/classes");
    SuggestionPipeline::new(
        config,
        unit,
        client,
        Box::new(compiler),
        ScratchSpace::namespaced(worker).unwrap(),
    )
    .with_sleeper(no_sleep())
}
