pub mod client;
pub mod retry;
pub mod prompt;
pub mod normalize;
pub mod compiler;
pub mod pipeline;
pub mod advisor;

pub use advisor::CrossoverAdvisor;
pub use client::{OpenAiClient, Reply, SuggestionClient};
pub use compiler::{CompileRequest, Compiler, ScratchSpace};
pub use pipeline::{SuggestionOutcome, SuggestionPipeline, UnitUnderTest};
pub use retry::{Attempt, Backoff, RetryPolicy, Sleeper};
