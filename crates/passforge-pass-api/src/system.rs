use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use passforge_hardware::AcceleratorSpec;
use passforge_metrics::{Metric, MetricResult};
use passforge_model::ModelSpec;

use crate::{Pass, PassRunError, SearchPoint};

/// Where a system executes work.
///
/// `Local` and `IsolatedEnv` run on this machine and can be queried for
/// supported execution providers; `Container` runs in a managed sandbox;
/// `Remote` runs elsewhere and must be told its providers explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemKind {
    Local,
    IsolatedEnv,
    Container,
    Remote,
}

impl SystemKind {
    /// Systems that read artifacts straight off this machine's filesystem,
    /// and therefore need remote models materialized first.
    #[must_use]
    pub const fn is_local_like(&self) -> bool {
        matches!(self, Self::Local | Self::IsolatedEnv)
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote)
    }
}

/// An execution system: hosts pass runs and/or evaluates models.
pub trait System: Send + Sync {
    fn system_kind(&self) -> SystemKind;

    /// Device names this system exposes as a target (for example
    /// `["cpu", "gpu"]`). `None` means the system did not declare any.
    fn accelerators(&self) -> Option<Vec<String>> {
        None
    }

    /// Execution providers available on this system. Consulted for
    /// local-like targets when the engine config declares none.
    fn supported_execution_providers(&self) -> Vec<String> {
        vec!["CPUExecutionProvider".to_string()]
    }

    /// Run one pass on this system.
    fn run_pass(
        &self,
        pass: &dyn Pass,
        model: &ModelSpec,
        output_path: &Utf8Path,
        point: &SearchPoint,
    ) -> Result<ModelSpec, PassRunError>;

    /// Evaluate a model against the given metrics.
    fn evaluate_model(
        &self,
        model: &ModelSpec,
        metrics: &[Metric],
        accelerator_spec: &AcceleratorSpec,
    ) -> Result<MetricResult>;
}

/// Declaration of which metrics an evaluation should measure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    pub metrics: Vec<Metric>,
}

impl EvaluatorConfig {
    #[must_use]
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }
}

/// The out-of-scope evaluation runtime a local system delegates to.
pub trait ModelEvaluator: Send + Sync {
    fn evaluate(
        &self,
        model: &ModelSpec,
        metrics: &[Metric],
        accelerator_spec: &AcceleratorSpec,
    ) -> Result<MetricResult>;
}

/// The out-of-scope downloader used to materialize remote model resources
/// into the cache before a local-like system touches them.
pub trait ResourceFetcher: Send + Sync {
    /// Download `remote` into `dest_dir` and return the local path.
    fn fetch(&self, remote: &str, dest_dir: &Utf8Path) -> Result<Utf8PathBuf>;
}
