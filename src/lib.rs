//! passforge — an optimization search engine for model artifacts
//!
//! Given an input model, an ordered registry of transformation passes, and
//! an evaluator over prioritized metrics, passforge explores the joint
//! configuration space of the pipeline per hardware accelerator, caches
//! every pass run content-addressed on disk, records a provenance
//! footprint, and selects a Pareto frontier (optionally top-K reduced) of
//! output models.
//!
//! This crate is the facade: it re-exports the public surface of the
//! workspace member crates.
//!
//! ```no_run
//! use std::sync::Arc;
//! use passforge::{Engine, EngineConfig, LocalSystem, RunOptions};
//!
//! # fn factory() -> Arc<dyn passforge::PassFactory> { unimplemented!() }
//! # fn main() -> anyhow::Result<()> {
//! let target = Arc::new(LocalSystem::new().with_accelerators(vec!["cpu".into()]));
//! let mut engine = Engine::builder(EngineConfig::default())
//!     .target(target)
//!     .build()?;
//! engine.register(passforge::PassDescriptor::new(factory()))?;
//! let input = passforge::ModelSpec::new("onnx", serde_json::json!({}));
//! let outputs = engine.run(&input, &RunOptions::default())?;
//! # let _ = outputs;
//! # Ok(())
//! # }
//! ```

pub use passforge_cache::{Cache, RunRecord};
pub use passforge_engine::{
    Engine, EngineBuilder, EngineConfig, LocalSystem, PassDescriptor, RunOptions, RunOutput,
};
pub use passforge_footprint::{Footprint, FootprintNode, FootprintNodeMetric};
pub use passforge_hardware::{
    AcceleratorLookup, AcceleratorSpec, CPU_EXECUTION_PROVIDER, Device, resolve_accelerator_specs,
};
pub use passforge_metrics::{
    Goal, GoalKind, Metric, MetricResult, MetricValue, Objective, ObjectiveDict, SubMetric,
    joint_metric_key, rank_by_priority, signal_meets_goals,
};
pub use passforge_model::{Model, ModelSpec, ResourcePath, input_model_id};
pub use passforge_pass_api::{
    EvaluatorConfig, ModelEvaluator, Packager, PackagingConfig, Pass, PassFactory, PassRunError,
    ResourceFetcher, SearchPoint, SearchSpace, System, SystemKind,
};
pub use passforge_search::{
    ExecutionOrder, JointExhaustiveStrategy, SearchAlgorithm, SearchStrategy,
    SearchStrategyConfig, Step, StopReason,
};
pub use passforge_utils::clock::{Clock, ManualClock, SystemClock};
pub use passforge_utils::error::{ConfigError, ForgeError, ForgeResult};
pub use passforge_utils::logging::init_tracing;
