pub mod execution;
pub mod generation;
pub mod metrics;
pub mod suggestion;

pub use execution::ExecutionEngine;
