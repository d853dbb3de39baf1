//! Evaluation facade: dispatch to the target system with caching

use tracing::debug;

use passforge_hardware::AcceleratorSpec;
use passforge_metrics::MetricResult;
use passforge_model::ModelSpec;
use passforge_pass_api::EvaluatorConfig;
use passforge_utils::error::{ForgeError, ForgeResult};

use crate::engine::Engine;

impl Engine {
    /// Evaluate a model on the target, keyed in the evaluation cache by the
    /// accelerator-suffixed model id.
    ///
    /// Hit and miss both annotate the footprint node; goals-met resolution
    /// happens inside the footprint against the recorded objectives.
    pub(crate) fn evaluate_model(
        &mut self,
        model: &ModelSpec,
        model_id: &str,
        evaluator_config: &EvaluatorConfig,
        accelerator_spec: &AcceleratorSpec,
    ) -> ForgeResult<MetricResult> {
        debug!("evaluating model {model_id}");
        let suffix = format!("-{accelerator_spec}");
        let cache_key = if model_id.ends_with(&suffix) {
            model_id.to_string()
        } else {
            // Accelerator-agnostic model ids still evaluate per accelerator.
            format!("{model_id}{suffix}")
        };

        if let Some(signal) = self.cache.load_evaluation(&cache_key) {
            debug!("loading evaluation from cache");
            self.footprint_mut(accelerator_spec)
                .record_metrics(model_id, signal.clone());
            return Ok(signal);
        }

        let prepared = if self.target.system_kind().is_remote() {
            model.clone()
        } else {
            self.prepare_local_model(model)
                .map_err(ForgeError::Evaluation)?
        };

        let signal = self
            .target
            .evaluate_model(&prepared, &evaluator_config.metrics, accelerator_spec)
            .map_err(ForgeError::Evaluation)?;

        self.cache.cache_evaluation(&cache_key, &signal);
        self.footprint_mut(accelerator_spec)
            .record_metrics(model_id, signal.clone());
        Ok(signal)
    }
}
