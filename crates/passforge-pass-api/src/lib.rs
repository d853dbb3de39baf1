//! Shared contracts between the passforge engine and its collaborators
//!
//! Passes, execution systems, evaluators, resource fetchers, and packagers
//! are all pluggable. This crate carries the minimal trait surface and the
//! search-space types they exchange, without pulling in the engine itself,
//! so collaborator crates never depend on orchestration internals.

mod error;
mod package;
mod pass;
mod space;
mod system;

pub use error::PassRunError;
pub use package::{Packager, PackagingConfig};
pub use pass::{Pass, PassFactory};
pub use space::{SearchPoint, SearchSpace};
pub use system::{EvaluatorConfig, ModelEvaluator, ResourceFetcher, System, SystemKind};
