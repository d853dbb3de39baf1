//! Model artifacts as the engine sees them
//!
//! The engine never inspects a model's contents. A [`ModelSpec`] is an
//! opaque, serializable description (type, config, resource location) whose
//! identity derives from its serialized form. [`Model`] wraps a spec with
//! the `Pruned` sentinel that marks a dead search branch.

mod resource;
mod spec;

pub use resource::ResourcePath;
pub use spec::ModelSpec;

use anyhow::{Context, Result};
use passforge_utils::hash;

/// A model flowing through the pipeline.
///
/// `Pruned` is a first-class variant, not a missing model: an invalid search
/// point or a contained pass failure produces `Pruned`, which the cache
/// round-trips as an empty-object sidecar so a warm rerun can skip the same
/// dead branch without re-invoking the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Model {
    Real(ModelSpec),
    Pruned,
}

impl Model {
    #[must_use]
    pub const fn is_pruned(&self) -> bool {
        matches!(self, Self::Pruned)
    }

    /// The inner spec, if this branch is still alive.
    #[must_use]
    pub const fn as_spec(&self) -> Option<&ModelSpec> {
        match self {
            Self::Real(spec) => Some(spec),
            Self::Pruned => None,
        }
    }

    /// Sidecar encoding: the spec's JSON for real models, `{}` for pruned.
    pub fn sidecar_json(&self) -> Result<serde_json::Value> {
        match self {
            Self::Real(spec) => spec.to_json(),
            Self::Pruned => Ok(serde_json::json!({})),
        }
    }

    /// Decode a sidecar produced by [`Model::sidecar_json`].
    pub fn from_sidecar_json(value: &serde_json::Value) -> Result<Self> {
        if value.as_object().is_some_and(serde_json::Map::is_empty) {
            return Ok(Self::Pruned);
        }
        ModelSpec::from_json(value).map(Self::Real)
    }
}

impl From<ModelSpec> for Model {
    fn from(spec: ModelSpec) -> Self {
        Self::Real(spec)
    }
}

/// Identity of an input model: the content hash of its serialized form.
pub fn input_model_id(spec: &ModelSpec) -> Result<String> {
    hash::hash_serializable(spec).context("Failed to hash input model")
}
