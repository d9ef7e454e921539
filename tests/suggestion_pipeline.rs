mod common;

use common::*;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use suitegen::config::{SearchConfig, SuggestionConfig};
use suitegen::engines::generation::{Breeder, Goal, GoalManager};
use suitegen::engines::suggestion::Reply;
use suitegen::types::Origin;

fn goals() -> Vec<Goal> {
    vec![Goal::new(0, "line 12"), Goal::new(1, "line 40")]
}

#[test]
fn test_three_failures_give_up_the_round() {
    let client = ScriptedClient::new(vec![Reply::Fail, Reply::Fail, Reply::Fail], fenced("class ClassTest {}"));
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Yields(2));
    let compiles = compiler.calls();
    let slept = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&slept);
    let pipeline = pipeline(suggestion_config(), client.clone(), compiler, 10)
        .with_sleeper(Arc::new(move |d: Duration| recorder.lock().unwrap().push(d)));

    let outcome = pipeline.assist(&goals());

    assert!(outcome.is_empty());
    assert_eq!(client.calls(), 3);
    assert_eq!(compiles.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.stats.submit_attempts, 3);
    assert_eq!(outcome.stats.successful_rounds, 0);
    // exponential backoff between the three submissions, none after the last
    assert_eq!(
        *slept.lock().unwrap(),
        vec![Duration::from_secs(30), Duration::from_secs(60)]
    );
}

#[test]
fn test_empty_empty_then_candidates() {
    let client = ScriptedClient::always(fenced("public class ClassTest { }"));
    let compiler = ScriptedCompiler::new(
        vec![CompileScript::Empty, CompileScript::Empty, CompileScript::Yields(3)],
        CompileScript::Nothing,
    );
    let compiles = compiler.calls();
    let sources = compiler.sources();
    let pipeline = pipeline(suggestion_config(), client.clone(), compiler, 11);

    let outcome = pipeline.assist(&goals());

    assert_eq!(outcome.chromosomes.len(), 3);
    assert!(outcome.chromosomes.iter().all(|c| c.origin() == Origin::Suggested));
    assert!(outcome.chromosomes.iter().all(|c| c.is_changed()));
    assert_eq!(outcome.stats.successful_rounds, 1);
    assert_eq!(outcome.stats.compile_attempts, 3);
    assert_eq!(outcome.stats.compile_successes, 1);
    assert_eq!(outcome.stats.extracted, 3);
    assert_eq!(compiles.load(Ordering::SeqCst), 3);
    assert_eq!(client.calls(), 3);
    assert!(sources
        .lock()
        .unwrap()
        .iter()
        .all(|s| s == "public class ClassTest { }"));
}

#[test]
fn test_compile_failures_are_bounded() {
    let client = ScriptedClient::always(fenced("class Broken {"));
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Fails);
    let compiles = compiler.calls();
    let pipeline = pipeline(suggestion_config(), client.clone(), compiler, 12);

    let outcome = pipeline.assist(&goals());

    assert!(outcome.is_empty());
    assert_eq!(compiles.load(Ordering::SeqCst), 3);
    assert!(client.calls() <= 3);
    assert_eq!(outcome.stats.compile_successes, 0);
}

#[test]
fn test_submissions_are_shared_across_compile_attempts() {
    // attempt 1 needs two submissions, attempt 2 has one left and it fails
    let client = ScriptedClient::new(
        vec![Reply::Fail, fenced("class A {}"), Reply::Fail],
        fenced("class B {}"),
    );
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Nothing);
    let compiles = compiler.calls();
    let pipeline = pipeline(suggestion_config(), client.clone(), compiler, 13);

    let outcome = pipeline.assist(&goals());

    assert!(outcome.is_empty());
    assert_eq!(client.calls(), 3);
    assert_eq!(compiles.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.stats.submit_attempts, 3);
}

#[test]
fn test_reply_without_fence_skips_compiler() {
    let client = ScriptedClient::always(Reply::Text("I cannot help with that.".into()));
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Yields(1));
    let compiles = compiler.calls();
    let pipeline = pipeline(suggestion_config(), client.clone(), compiler, 14);

    let outcome = pipeline.assist(&goals());

    assert!(outcome.is_empty());
    assert_eq!(compiles.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.stats.malformed_responses, 3);
    assert_eq!(client.calls(), 3);
}

fn stalling_breeder(client: Arc<ScriptedClient>, compiler: ScriptedCompiler, suggestion: SuggestionConfig) -> Breeder {
    let config = SearchConfig {
        population_size: 2,
        stall_threshold: 1,
        crossover_rate: 0.0,
        test_insertion_rate: 0.0,
        ..quick_config(2)
    };
    Breeder::new(
        config,
        GoalManager::new(flat_goals(2)),
        Box::new(StubbornEngine { goals: 2 }),
        Box::new(AppendFactory),
    )
    .unwrap()
    .with_pipeline(pipeline(suggestion, client, compiler, 20))
}

#[test]
fn test_stall_counter_resets_after_failed_assistance() {
    let client = ScriptedClient::always(Reply::Fail);
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Yields(1));
    let mut breeder = stalling_breeder(client.clone(), compiler, suggestion_config());
    breeder.start();
    breeder.initialize_population();

    let offspring = breeder.breed_offspring();

    assert_eq!(breeder.stall_count(), 0);
    assert_eq!(offspring.len(), 2);
    assert_eq!(client.calls(), 3);
    assert_eq!(breeder.statistics().stagnation_rounds, 1);
    assert_eq!(breeder.statistics().pipeline.rounds, 1);
    assert_eq!(breeder.statistics().suggested_added, 0);
}

#[test]
fn test_suggested_chromosomes_join_offspring() {
    let client = ScriptedClient::always(fenced("class ClassTest {}"));
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Yields(3));
    let mut breeder = stalling_breeder(client, compiler, suggestion_config());
    breeder.start();
    breeder.initialize_population();

    let offspring = breeder.breed_offspring();

    assert_eq!(breeder.stall_count(), 0);
    assert_eq!(offspring.len(), 5);
    let suggested = offspring.iter().filter(|c| c.origin() == Origin::Suggested).count();
    assert_eq!(suggested, 3);
    assert!(offspring.iter().all(|c| !c.is_changed()));
    assert_eq!(breeder.statistics().suggested_added, 3);
    assert_eq!(breeder.statistics().pipeline.successful_rounds, 1);
}

#[test]
fn test_disabled_assistance_still_resets_stalls() {
    let client = ScriptedClient::always(fenced("class ClassTest {}"));
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Yields(3));
    let suggestion = SuggestionConfig {
        stagnation_assistance: false,
        ..suggestion_config()
    };
    let mut breeder = stalling_breeder(client.clone(), compiler, suggestion);
    breeder.start();
    breeder.initialize_population();

    let offspring = breeder.breed_offspring();

    assert_eq!(breeder.stall_count(), 0);
    assert_eq!(offspring.len(), 2);
    assert_eq!(client.calls(), 0);
}

#[test]
fn test_initial_population_falls_back_after_two_rounds() {
    let client = ScriptedClient::always(Reply::Fail);
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Yields(1));
    let suggestion = SuggestionConfig {
        initial_population: true,
        ..suggestion_config()
    };
    let mut breeder = stalling_breeder(client.clone(), compiler, suggestion);
    breeder.start();
    breeder.initialize_population();

    assert_eq!(client.calls(), 6);
    assert_eq!(breeder.population().len(), 2);
    assert!(breeder.population().iter().all(|c| c.origin() == Origin::Random));
    let seeding = &breeder.statistics().initial_population;
    assert!(seeding.fell_back_to_random);
    assert_eq!(seeding.random, 2);
    assert_eq!(breeder.statistics().pipeline.rounds, 2);
}

#[test]
fn test_initial_population_seeded_and_truncated() {
    let client = ScriptedClient::always(fenced("class ClassTest {}"));
    let compiler = ScriptedCompiler::new(vec![], CompileScript::Yields(5));
    let suggestion = SuggestionConfig {
        initial_population: true,
        ..suggestion_config()
    };
    let mut breeder = stalling_breeder(client.clone(), compiler, suggestion);
    breeder.start();
    breeder.initialize_population();

    assert_eq!(client.calls(), 1);
    assert_eq!(breeder.population().len(), 2);
    assert!(breeder.population().iter().all(|c| c.origin() == Origin::Suggested));
    assert_eq!(breeder.statistics().initial_population.suggested, 2);
    assert!(!breeder.statistics().initial_population.fell_back_to_random);
}
