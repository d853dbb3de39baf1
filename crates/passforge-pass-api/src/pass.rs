use anyhow::Result;
use camino::Utf8Path;

use passforge_hardware::AcceleratorSpec;
use passforge_model::ModelSpec;

use crate::{PassRunError, SearchPoint, SearchSpace};

/// A single transformation stage bound to one accelerator.
///
/// Instances are built per accelerator by a [`PassFactory`]; the factory
/// call is where the search space gets materialized from the fixed config
/// and the `disable_search` flag.
pub trait Pass: Send + Sync {
    /// Type name of the pass. Appears verbatim in derived model ids and
    /// run-cache filenames.
    fn name(&self) -> &str;

    /// The search space exposed for this accelerator. Empty means the pass
    /// runs exactly once with its fixed configuration.
    fn search_space(&self) -> &SearchSpace;

    /// Whether a proposed point is worth running. Invalid points are pruned
    /// without invoking the host.
    fn validate_search_point(&self, point: &SearchPoint) -> bool {
        self.search_space().contains_point(point)
    }

    /// The full pass configuration selected by a point (fixed config merged
    /// with the point's choices).
    fn config_at_search_point(&self, point: &SearchPoint) -> serde_json::Value;

    /// Canonical JSON form of a configuration, used for run-cache keys.
    /// Override when some config fields must not affect cache identity.
    fn serialize_config(&self, config: &serde_json::Value) -> serde_json::Value {
        config.clone()
    }

    /// Whether the output is independent of the accelerator. Agnostic
    /// passes share cache entries across accelerators and elide the
    /// accelerator suffix from their model ids.
    fn is_accelerator_agnostic(&self, accelerator_spec: &AcceleratorSpec) -> bool {
        let _ = accelerator_spec;
        true
    }

    /// Transform `input` into a new model rooted at `output_path`.
    fn run(
        &self,
        input: &ModelSpec,
        output_path: &Utf8Path,
        point: &SearchPoint,
    ) -> Result<ModelSpec, PassRunError>;
}

/// Per-accelerator materialization seam for a registered pass type.
pub trait PassFactory: Send + Sync {
    /// Stable type name; used for registry auto-naming and run-cache
    /// cleanup scoping.
    fn pass_type_name(&self) -> &str;

    /// Build a pass instance for `accelerator_spec`, generating its search
    /// space from the descriptor's fixed config. With `disable_search` the
    /// instance must expose an empty space or fail to build.
    fn build(
        &self,
        accelerator_spec: &AcceleratorSpec,
        fixed_config: &serde_json::Value,
        disable_search: bool,
    ) -> Result<Box<dyn Pass>>;
}
