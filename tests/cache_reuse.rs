//! Warm-cache reruns: identical ids, identical frontier, zero host calls

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use camino::Utf8PathBuf;
use serde_json::{Value, json};

use common::{
    ConfigEvaluator, StubPassFactory, accuracy_metric, evaluator_config, input_model,
    single_accuracy_signal, temp_dirs,
};
use passforge::{
    AcceleratorSpec, Device, Engine, EngineConfig, LocalSystem, MetricResult, PassDescriptor,
    RunOptions, RunOutput, SearchStrategyConfig,
};

fn cpu_spec() -> AcceleratorSpec {
    AcceleratorSpec::new(Device::Cpu, "CPUExecutionProvider")
}

fn accuracy_by_opt(config: &Value) -> MetricResult {
    match config.get("opt").and_then(Value::as_str) {
        Some("x") => single_accuracy_signal(0.9),
        Some("y") => single_accuracy_signal(0.8),
        _ => single_accuracy_signal(0.5),
    }
}

struct RunArtifacts {
    frontier_ids: Vec<String>,
    all_ids: Vec<String>,
    pass_invocations: usize,
    evaluator_calls: usize,
}

fn run_once(cache_dir: Utf8PathBuf, output_dir: Utf8PathBuf) -> RunArtifacts {
    let opt_factory =
        Arc::new(StubPassFactory::new("Opt").with_space("opt", vec![json!("x"), json!("y")]));
    let invocations = opt_factory.invocations();
    let fuse_factory = Arc::new(StubPassFactory::new("Fuse"));
    let fuse_invocations = fuse_factory.invocations();

    let evaluator = Arc::new(ConfigEvaluator::new(accuracy_by_opt));
    let calls = evaluator.calls();
    let target = Arc::new(
        LocalSystem::new()
            .with_accelerators(vec!["cpu".to_string()])
            .with_evaluator(evaluator),
    );

    let mut engine = Engine::builder(EngineConfig {
        cache_dir,
        search_strategy: Some(SearchStrategyConfig::default()),
        ..EngineConfig::default()
    })
    .target(target)
    .evaluator(evaluator_config(vec![accuracy_metric(None)]))
    .build()
    .unwrap();
    engine.register(PassDescriptor::new(opt_factory)).unwrap();
    engine.register(PassDescriptor::new(fuse_factory)).unwrap();

    let outputs = engine
        .run(
            &input_model(),
            &RunOptions {
                output_dir,
                ..RunOptions::default()
            },
        )
        .unwrap();

    let RunOutput::Search(frontier) = &outputs[&cpu_spec()] else {
        panic!("expected a search output");
    };

    let mut frontier_ids: Vec<String> = frontier.nodes().keys().cloned().collect();
    frontier_ids.sort();
    let mut all_ids: Vec<String> = engine.footprints()[&cpu_spec()].nodes().keys().cloned().collect();
    all_ids.sort();

    RunArtifacts {
        frontier_ids,
        all_ids,
        pass_invocations: invocations.load(Ordering::SeqCst)
            + fuse_invocations.load(Ordering::SeqCst),
        evaluator_calls: calls.load(Ordering::SeqCst),
    }
}

#[test]
fn warm_rerun_reuses_everything() {
    let (_guard, cache_dir, output_dir) = temp_dirs();

    let cold = run_once(cache_dir.clone(), output_dir.clone());
    assert_eq!(cold.pass_invocations, 4);
    assert_eq!(cold.evaluator_calls, 2);

    // Same cache directory, fresh engine and fresh counters.
    let warm = run_once(cache_dir, output_dir);

    assert_eq!(warm.pass_invocations, 0, "host must not be invoked on a warm cache");
    assert_eq!(warm.evaluator_calls, 0, "evaluations must come from the cache");
    assert_eq!(warm.frontier_ids, cold.frontier_ids);
    assert_eq!(warm.all_ids, cold.all_ids);
}

#[test]
fn clean_cache_forces_recomputation() {
    let (_guard, cache_dir, output_dir) = temp_dirs();

    let cold = run_once(cache_dir.clone(), output_dir.clone());
    assert_eq!(cold.pass_invocations, 4);

    let opt_factory =
        Arc::new(StubPassFactory::new("Opt").with_space("opt", vec![json!("x"), json!("y")]));
    let invocations = opt_factory.invocations();
    let evaluator = Arc::new(ConfigEvaluator::new(accuracy_by_opt));
    let target = Arc::new(
        LocalSystem::new()
            .with_accelerators(vec!["cpu".to_string()])
            .with_evaluator(evaluator),
    );

    let mut engine = Engine::builder(EngineConfig {
        cache_dir,
        clean_cache: true,
        search_strategy: Some(SearchStrategyConfig::default()),
        ..EngineConfig::default()
    })
    .target(target)
    .evaluator(evaluator_config(vec![accuracy_metric(None)]))
    .build()
    .unwrap();
    engine.register(PassDescriptor::new(opt_factory)).unwrap();

    engine
        .run(
            &input_model(),
            &RunOptions {
                output_dir,
                ..RunOptions::default()
            },
        )
        .unwrap();

    assert_eq!(invocations.load(Ordering::SeqCst), 2);
}
