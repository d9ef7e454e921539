use crate::config::SuggestionConfig;
use crate::engines::generation::chromosome::Chromosome;
use crate::engines::generation::goals::Goal;
use crate::engines::metrics::PipelineStats;
use crate::engines::suggestion::client::{Reply, SuggestionClient};
use crate::engines::suggestion::compiler::{CompileRequest, Compiler, ScratchSpace};
use crate::engines::suggestion::normalize::extract_code;
use crate::engines::suggestion::prompt::{goal_prompt, seed_prompt, truncate_chars};
use crate::engines::suggestion::retry::{thread_sleeper, Attempt, Backoff, RetryPolicy, Sleeper};
use crate::error::Result;
use crate::types::Origin;

use std::path::Path;
use std::sync::Arc;

/// The unit the tests are written for, as shown to the language model
#[derive(Debug, Clone)]
pub struct UnitUnderTest {
    pub name: String,
    pub source: String,
    pub classpath: String,
}

impl UnitUnderTest {
    pub fn new(name: impl Into<String>, source: impl Into<String>, classpath: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            classpath: classpath.into(),
        }
    }

    pub fn from_path(name: impl Into<String>, path: impl AsRef<Path>, classpath: impl Into<String>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::new(name, source, classpath))
    }
}

/// Candidates of one round plus what it cost
#[derive(Debug, Default)]
pub struct SuggestionOutcome {
    pub chromosomes: Vec<Chromosome>,
    pub stats: PipelineStats,
}

impl SuggestionOutcome {
    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
}

/// State of one round, dropped when the round ends
struct SuggestionRound {
    prompt: String,
    submissions: usize,
    compiles: usize,
    last_response: Option<String>,
}

impl SuggestionRound {
    fn new(prompt: String) -> Self {
        Self {
            prompt,
            submissions: 0,
            compiles: 0,
            last_response: None,
        }
    }
}

/// Prompt, submit, normalize and compile, with bounded retries at each stage.
///
/// A round issues at most `submit_attempts` submissions and at most
/// `compile_attempts` compile attempts in total. Nothing here is fatal: an
/// exhausted round simply yields no chromosomes.
pub struct SuggestionPipeline {
    config: SuggestionConfig,
    unit: UnitUnderTest,
    client: Arc<dyn SuggestionClient>,
    compiler: Box<dyn Compiler>,
    scratch: ScratchSpace,
    submit_policy: RetryPolicy,
    compile_policy: RetryPolicy,
    sleeper: Sleeper,
}

impl SuggestionPipeline {
    pub fn new(
        config: SuggestionConfig,
        unit: UnitUnderTest,
        client: Arc<dyn SuggestionClient>,
        compiler: Box<dyn Compiler>,
        scratch: ScratchSpace,
    ) -> Self {
        let submit_policy = RetryPolicy::new(
            config.submit_attempts,
            Backoff::Exponential {
                initial: config.submit_backoff(),
                factor: 2,
            },
        );
        let compile_policy = RetryPolicy::new(config.compile_attempts, Backoff::Fixed(config.compile_backoff()));
        Self {
            config,
            unit,
            client,
            compiler,
            scratch,
            submit_policy,
            compile_policy,
            sleeper: thread_sleeper(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn client(&self) -> Arc<dyn SuggestionClient> {
        Arc::clone(&self.client)
    }

    pub fn unit(&self) -> &UnitUnderTest {
        &self.unit
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Ask for tests that cover `goals`
    pub fn assist(&self, goals: &[Goal]) -> SuggestionOutcome {
        if goals.is_empty() {
            return SuggestionOutcome::default();
        }
        log::info!("Requesting suggested tests for {} uncovered goals", goals.len());
        self.run_round(goal_prompt(&self.unit, goals, &self.config))
    }

    /// Ask for `count` tests to seed the initial population
    pub fn seed(&self, count: usize) -> SuggestionOutcome {
        log::info!("Requesting {} suggested tests for the initial population", count);
        self.run_round(seed_prompt(&self.unit, count, &self.config))
    }

    fn run_round(&self, prompt: String) -> SuggestionOutcome {
        let mut round = SuggestionRound::new(prompt);
        let mut stats = PipelineStats {
            rounds: 1,
            ..Default::default()
        };

        let compiled = self
            .compile_policy
            .run_with_sleeper(|attempt| self.attempt(&mut round, &mut stats, attempt), &*self.sleeper);

        let mut chromosomes = compiled.value.unwrap_or_default();
        for chromosome in &mut chromosomes {
            chromosome.clear_cached_results();
            chromosome.set_origin(Origin::Suggested);
            chromosome.set_changed(true);
        }

        if chromosomes.is_empty() {
            log::info!(
                "Suggestion round produced nothing ({} submissions, {} compiles)",
                round.submissions,
                round.compiles
            );
            if let Some(last) = &round.last_response {
                log::debug!("Last reply: {}", truncate_chars(last, 500));
            }
        } else {
            stats.successful_rounds = 1;
            stats.extracted = chromosomes.len();
            log::info!("Suggestion round extracted {} chromosomes", chromosomes.len());
        }

        SuggestionOutcome { chromosomes, stats }
    }

    /// One submit-normalize-compile attempt
    fn attempt(&self, round: &mut SuggestionRound, stats: &mut PipelineStats, attempt: usize) -> Attempt<Vec<Chromosome>> {
        let remaining = self.config.submit_attempts.saturating_sub(round.submissions);
        if remaining == 0 {
            return Attempt::Abort;
        }

        let prompt = &round.prompt;
        let model = &self.config.model;
        let submitted = self.submit_policy.limited_to(remaining).run_with_sleeper(
            |_| match self.client.submit(prompt, model) {
                Reply::Text(text) => Attempt::Success(text),
                Reply::Fail => Attempt::Retry,
            },
            &*self.sleeper,
        );
        round.submissions += submitted.attempts;
        stats.submit_attempts += submitted.attempts;

        let Some(raw) = submitted.value else {
            log::warn!("No reply after {} submissions, giving up this round", round.submissions);
            return Attempt::Abort;
        };
        stats.submit_successes += 1;

        let code = extract_code(&raw);
        round.last_response = Some(raw);
        let Some(code) = code else {
            stats.malformed_responses += 1;
            log::warn!("Reply {} carried no fenced code block", attempt);
            return Attempt::Retry;
        };

        let guard = self.scratch.lock();
        if let Err(e) = self.scratch.clear(&guard) {
            log::warn!("Could not clear scratch space {}: {}", self.scratch.dir().display(), e);
        }
        let artifact = match self.scratch.write_artifact(&guard, &self.config.artifact_name, &code) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("Could not write suggested source: {}", e);
                return Attempt::Retry;
            }
        };

        round.compiles += 1;
        stats.compile_attempts += 1;
        let request = CompileRequest {
            source: &code,
            classpath: &self.unit.classpath,
            artifact: &artifact,
        };

        let failure = match self.compiler.compile_and_extract(&request) {
            Ok(Some(chromosomes)) if !chromosomes.is_empty() => {
                stats.compile_successes += 1;
                return Attempt::Success(chromosomes);
            }
            Ok(_) => "no candidates extracted".to_string(),
            Err(e) => format!("{:#}", e),
        };

        log::warn!("Compile attempt {} failed: {}", round.compiles, failure);
        if let Err(e) = self.scratch.clear(&guard) {
            log::warn!("Could not clean up after failed compile: {}", e);
        }
        Attempt::Retry
    }
}
