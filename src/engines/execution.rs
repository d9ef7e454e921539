use crate::engines::generation::chromosome::Chromosome;
use crate::types::ExecutionTrace;
use std::time::Duration;

/// Runs a candidate against the unit under test.
///
/// Implementations must return within `timeout` and report a timeout through
/// [`ExecutionTrace::timed_out`] instead of blocking.
pub trait ExecutionEngine: Send {
    fn execute(&mut self, chromosome: &Chromosome, timeout: Duration) -> ExecutionTrace;
}

impl<E: ExecutionEngine + ?Sized> ExecutionEngine for Box<E> {
    fn execute(&mut self, chromosome: &Chromosome, timeout: Duration) -> ExecutionTrace {
        (**self).execute(chromosome, timeout)
    }
}
