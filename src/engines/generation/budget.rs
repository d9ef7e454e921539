use std::time::{Duration, Instant};

/// Stopping condition of a search run.
///
/// Checked cooperatively between units of work; nothing is interrupted
/// mid-evaluation.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    time_limit: Duration,
    max_evaluations: Option<usize>,
    max_generations: Option<usize>,
    started: Option<Instant>,
    evaluations: usize,
    generations: usize,
}

impl SearchBudget {
    pub fn new(time_limit: Duration) -> Self {
        Self {
            time_limit,
            max_evaluations: None,
            max_generations: None,
            started: None,
            evaluations: 0,
            generations: 0,
        }
    }

    pub fn with_max_evaluations(mut self, max: Option<usize>) -> Self {
        self.max_evaluations = max;
        self
    }

    pub fn with_max_generations(mut self, max: Option<usize>) -> Self {
        self.max_generations = max;
        self
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.evaluations = 0;
        self.generations = 0;
    }

    pub fn record_evaluation(&mut self) {
        self.evaluations += 1;
    }

    pub fn record_generation(&mut self) {
        self.generations += 1;
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// A budget that was never started is not finished
    pub fn is_finished(&self) -> bool {
        if self.started.is_none() {
            return false;
        }
        if self.elapsed() >= self.time_limit {
            return true;
        }
        if matches!(self.max_evaluations, Some(max) if self.evaluations >= max) {
            return true;
        }
        matches!(self.max_generations, Some(max) if self.generations >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_finished_before_start() {
        let budget = SearchBudget::new(Duration::ZERO);
        assert!(!budget.is_finished());
    }

    #[test]
    fn test_zero_time_limit_finishes_immediately() {
        let mut budget = SearchBudget::new(Duration::ZERO);
        budget.start();
        assert!(budget.is_finished());
    }

    #[test]
    fn test_evaluation_and_generation_caps() {
        let mut budget = SearchBudget::new(Duration::from_secs(3600)).with_max_evaluations(Some(2));
        budget.start();
        budget.record_evaluation();
        assert!(!budget.is_finished());
        budget.record_evaluation();
        assert!(budget.is_finished());

        let mut budget = SearchBudget::new(Duration::from_secs(3600)).with_max_generations(Some(1));
        budget.start();
        assert!(!budget.is_finished());
        budget.record_generation();
        assert!(budget.is_finished());
    }
}
