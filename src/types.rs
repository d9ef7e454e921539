use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Distance recorded for a goal the execution never got close to.
pub const UNREACHED: f64 = f64::MAX;

/// Identity of one coverage objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoalId(pub usize);

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "goal#{}", self.0)
    }
}

/// Chromosome-local variable identifier
pub type VarId = usize;

/// Where a chromosome came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    Random,
    Mutated,
    Suggested,
}

/// Static type of a value produced by an action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    Str,
    Object(String),
    Array(Box<ValueType>),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "double"),
            ValueType::Bool => write!(f, "boolean"),
            ValueType::Str => write!(f, "String"),
            ValueType::Object(name) => write!(f, "{}", name),
            ValueType::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

/// Primitive constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Literal {
    pub fn value_type(&self) -> ValueType {
        match self {
            Literal::Int(_) => ValueType::Int,
            Literal::Float(_) => ValueType::Float,
            Literal::Bool(_) => ValueType::Bool,
            Literal::Str(_) => ValueType::Str,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::Bool(v) => write!(f, "{}", v),
            Literal::Str(v) => write!(f, "{:?}", v),
        }
    }
}

/// Result of running one chromosome against the unit under test
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub distances: HashMap<GoalId, f64>,
    pub thrown_faults: Vec<String>,
    pub timed_out: bool,
}

impl ExecutionTrace {
    pub fn distance(&self, goal: GoalId) -> f64 {
        if self.timed_out {
            return UNREACHED;
        }
        self.distances.get(&goal).copied().unwrap_or(UNREACHED)
    }

    pub fn timeout() -> Self {
        Self {
            distances: HashMap::new(),
            thrown_faults: Vec::new(),
            timed_out: true,
        }
    }
}
