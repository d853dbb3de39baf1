use anyhow::Result;
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use passforge_footprint::Footprint;
use passforge_hardware::AcceleratorSpec;

/// Configuration for the out-of-scope artifact packager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackagingConfig {
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Bundles ranked output models into distributable artifacts.
pub trait Packager: Send + Sync {
    fn generate_output_artifacts(
        &self,
        config: &PackagingConfig,
        all_footprints: &IndexMap<AcceleratorSpec, Footprint>,
        frontier_footprints: &IndexMap<AcceleratorSpec, Footprint>,
        output_dir: &Utf8Path,
    ) -> Result<()>;
}
