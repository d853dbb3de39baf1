//! The passforge orchestration engine
//!
//! Per accelerator the engine materializes the registered passes, hashes
//! and caches the input model, then either runs the whole pipeline once
//! (no-search mode) or drives a search strategy over the joint pass
//! configuration space. Every pass run goes through the content-addressed
//! cache, every produced model lands in the provenance footprint, and
//! termination selects a Pareto frontier (optionally top-K reduced) per
//! accelerator.

mod config;
mod driver;
mod engine;
mod evaluator;
mod executor;
mod goals;
mod registry;
mod system;

pub use config::{EngineConfig, RunOptions, RunOutput};
pub use engine::{Engine, EngineBuilder};
pub use registry::PassDescriptor;
pub use system::LocalSystem;
