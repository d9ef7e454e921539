pub mod statistics;

pub use statistics::{AdvisorStats, PipelineStats, RunStatistics, SeedingStats};
