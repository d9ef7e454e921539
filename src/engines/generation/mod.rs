pub mod action;
pub mod chromosome;
pub mod factory;
pub mod goals;
pub mod archive;
pub mod pareto;
pub mod operators;
pub mod budget;
pub mod breeder;
pub mod search;
pub mod progress;

pub use action::Action;
pub use archive::Archive;
pub use breeder::{fill_next_generation, Breeder};
pub use budget::SearchBudget;
pub use chromosome::Chromosome;
pub use factory::{ChromosomeFactory, Operation, SurfaceFactory, UnitSurface};
pub use goals::{Goal, GoalGraph, GoalManager};
pub use operators::{Crossover, CrossoverOperator};
pub use progress::{ChannelProgressCallback, ConsoleProgressCallback, ProgressCallback, ProgressMessage, SilentProgressCallback};
pub use search::{run_workers, SearchEngine, SearchOutcome};
