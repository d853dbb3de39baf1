use anyhow::{Context, Result};
use camino::Utf8Path;
use std::sync::Arc;

use passforge_hardware::AcceleratorSpec;
use passforge_metrics::{Metric, MetricResult};
use passforge_model::ModelSpec;
use passforge_pass_api::{
    ModelEvaluator, Pass, PassRunError, SearchPoint, System, SystemKind,
};

/// The default execution system: runs passes in-process and delegates
/// evaluation to an attached evaluator runtime.
///
/// A bare `LocalSystem` can host passes but will refuse to evaluate; attach
/// a runtime with [`LocalSystem::with_evaluator`] when the engine needs
/// signals from this system.
#[derive(Default)]
pub struct LocalSystem {
    accelerators: Option<Vec<String>>,
    execution_providers: Option<Vec<String>>,
    evaluator: Option<Arc<dyn ModelEvaluator>>,
}

impl LocalSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the device classes this system targets (e.g. `["cpu"]`).
    #[must_use]
    pub fn with_accelerators(mut self, accelerators: Vec<String>) -> Self {
        self.accelerators = Some(accelerators);
        self
    }

    /// Override the execution providers reported as supported.
    #[must_use]
    pub fn with_execution_providers(mut self, providers: Vec<String>) -> Self {
        self.execution_providers = Some(providers);
        self
    }

    /// Attach the evaluation runtime this system dispatches to.
    #[must_use]
    pub fn with_evaluator(mut self, evaluator: Arc<dyn ModelEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }
}

impl System for LocalSystem {
    fn system_kind(&self) -> SystemKind {
        SystemKind::Local
    }

    fn accelerators(&self) -> Option<Vec<String>> {
        self.accelerators.clone()
    }

    fn supported_execution_providers(&self) -> Vec<String> {
        self.execution_providers
            .clone()
            .unwrap_or_else(|| vec!["CPUExecutionProvider".to_string()])
    }

    fn run_pass(
        &self,
        pass: &dyn Pass,
        model: &ModelSpec,
        output_path: &Utf8Path,
        point: &SearchPoint,
    ) -> Result<ModelSpec, PassRunError> {
        pass.run(model, output_path, point)
    }

    fn evaluate_model(
        &self,
        model: &ModelSpec,
        metrics: &[Metric],
        accelerator_spec: &AcceleratorSpec,
    ) -> Result<MetricResult> {
        let evaluator = self
            .evaluator
            .as_ref()
            .context("local system has no evaluator runtime attached")?;
        evaluator.evaluate(model, metrics, accelerator_spec)
    }
}
