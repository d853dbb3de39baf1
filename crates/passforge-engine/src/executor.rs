//! Pass execution with cache lookup and failure containment

use anyhow::anyhow;
use serde_json::json;
use tracing::{debug, error, info, warn};

use passforge_cache::Cache;
use passforge_hardware::AcceleratorSpec;
use passforge_metrics::MetricResult;
use passforge_model::{Model, ModelSpec};
use passforge_pass_api::{PassRunError, SearchPoint};
use passforge_utils::error::{ForgeError, ForgeResult};
use passforge_utils::hash;
use passforge_utils::paths::ensure_dir_all;

use crate::engine::Engine;

/// Result of executing one step's pass chain.
pub(crate) struct StepOutcome {
    pub(crate) should_prune: bool,
    pub(crate) signal: Option<MetricResult>,
    pub(crate) model_ids: Vec<String>,
}

impl Engine {
    /// Run a step's passes in order, then evaluate the terminal model.
    ///
    /// A pruned output anywhere in the chain stops the step; evaluation is
    /// skipped and the strategy is told via `should_prune`.
    pub(crate) fn run_passes(
        &mut self,
        passes: &[(String, SearchPoint)],
        model: ModelSpec,
        model_id: String,
        accelerator_spec: &AcceleratorSpec,
    ) -> ForgeResult<StepOutcome> {
        let mut should_prune = false;
        let mut model_ids = Vec::new();
        let mut current = Model::Real(model);
        let mut current_id = model_id;
        let mut last_pass = String::new();

        for (pass_id, point) in passes {
            last_pass.clone_from(pass_id);
            let Some(input) = current.as_spec().cloned() else {
                break;
            };
            let (output, output_id) =
                self.run_pass(pass_id, point, &input, &current_id, accelerator_spec)?;
            if output.is_pruned() {
                debug!("pruned");
                should_prune = true;
                current = output;
                break;
            }
            current_id = output_id.clone();
            model_ids.push(output_id);
            current = output;
        }

        let signal = if should_prune {
            warn!("skipping evaluation as model was pruned");
            None
        } else {
            match self.evaluator_for_pass(&last_pass) {
                None => {
                    debug!("no evaluator bound to {last_pass}; skipping evaluation");
                    None
                }
                Some(evaluator_config) => {
                    let Some(terminal) = current.as_spec().cloned() else {
                        return Err(ForgeError::Strategy(
                            "terminal model vanished before evaluation".to_string(),
                        ));
                    };
                    let signal = self.evaluate_model(
                        &terminal,
                        &current_id,
                        &evaluator_config,
                        accelerator_spec,
                    )?;
                    debug!("signal: {signal:?}");
                    Some(signal)
                }
            }
        };

        Ok(StepOutcome {
            should_prune,
            signal,
            model_ids,
        })
    }

    /// Run one pass on `input`, going through the run cache.
    ///
    /// Returns the produced (or cache-loaded) model and its id. Failure
    /// containment follows the taxonomy: usage errors always propagate,
    /// execution failures prune under search, anything else prunes under
    /// search and propagates in no-search mode.
    fn run_pass(
        &mut self,
        pass_id: &str,
        point: &SearchPoint,
        input: &ModelSpec,
        input_model_id: &str,
        accelerator_spec: &AcceleratorSpec,
    ) -> ForgeResult<(Model, String)> {
        let item_index = self
            .passes
            .iter()
            .position(|item| item.name == pass_id)
            .ok_or_else(|| {
                ForgeError::Strategy(format!("step names unregistered pass {pass_id}"))
            })?;

        let (pass_name, pass_config, run_accel, point_is_valid, host) = {
            let item = &self.passes[item_index];
            let pass_name = item.pass.name().to_string();
            let pass_config = item
                .pass
                .serialize_config(&item.pass.config_at_search_point(point));
            let run_accel = if item.pass.is_accelerator_agnostic(accelerator_spec) {
                None
            } else {
                Some(accelerator_spec.clone())
            };
            let point_is_valid = item.pass.validate_search_point(point);
            let host = self.host_for_pass(item);
            (pass_name, pass_config, run_accel, point_is_valid, host)
        };
        info!("running pass {pass_name}");

        // Cache probe. A hit with a missing model sidecar degrades to a
        // miss and the pass is produced again under a fresh number.
        if let Some(output_id) =
            self.cache
                .lookup_run(input_model_id, &pass_name, &pass_config, run_accel.as_ref())
        {
            if let Some(output_model) = self.cache.load_model(&output_id) {
                debug!("loading model from cache");
                let model_config = footprint_model_config(&output_model).map_err(ForgeError::Fatal)?;
                self.footprint_mut(accelerator_spec).record_run(
                    &output_id,
                    model_config,
                    input_model_id,
                    &pass_name,
                    pass_config.clone(),
                );
                return Ok((output_model, output_id));
            }
        }

        // Miss: allocate a fresh number and compose the derived id. The
        // accelerator suffix is elided for accelerator-agnostic passes.
        let number = self.cache.allocate_model_number();
        let input_number = Cache::input_number(input_model_id);
        let config_hash = hash::short_hash_json(&pass_config).map_err(ForgeError::Fatal)?;
        let output_id = match &run_accel {
            Some(accel) => format!("{number}_{pass_name}-{input_number}-{config_hash}-{accel}"),
            None => format!("{number}_{pass_name}-{input_number}-{config_hash}"),
        };
        let output_path = self.cache.model_output_dir(&output_id);
        if let Some(model_dir) = output_path.parent() {
            ensure_dir_all(model_dir)?;
        }

        let no_search = self.strategy.is_none();
        let output = if !point_is_valid && !no_search {
            debug!("invalid search point {point:?}, pruned");
            Model::Pruned
        } else {
            let run_result = if host.system_kind().is_remote() {
                host.run_pass(
                    self.passes[item_index].pass.as_ref(),
                    input,
                    &output_path,
                    point,
                )
            } else {
                // Local-like hosts read the artifact off this filesystem;
                // materialize remote resources first.
                self.prepare_local_model(input)
                    .map_err(PassRunError::Other)
                    .and_then(|prepared| {
                        host.run_pass(
                            self.passes[item_index].pass.as_ref(),
                            &prepared,
                            &output_path,
                            point,
                        )
                    })
            };

            match run_result {
                Ok(produced) => Model::Real(produced),
                Err(PassRunError::Usage(e)) => {
                    return Err(ForgeError::Fatal(
                        e.context(format!("pass {pass_name} was driven incorrectly")),
                    ));
                }
                Err(PassRunError::Execution(message)) => {
                    error!("pass {pass_name} execution failed: {message}");
                    if no_search {
                        return Err(ForgeError::Fatal(anyhow!(
                            "pass {pass_name} execution failed: {message}"
                        )));
                    }
                    Model::Pruned
                }
                Err(PassRunError::Other(e)) => {
                    error!("pass {pass_name} run failed: {e:#}");
                    if no_search {
                        return Err(ForgeError::Fatal(e));
                    }
                    Model::Pruned
                }
            }
        };

        self.cache.cache_model(&output, &output_id);
        self.cache.cache_run(
            &pass_name,
            &pass_config,
            input_model_id,
            &output_id,
            run_accel.as_ref(),
        );

        let model_config = footprint_model_config(&output).map_err(ForgeError::Fatal)?;
        self.footprint_mut(accelerator_spec).record_run(
            &output_id,
            model_config,
            input_model_id,
            &pass_name,
            pass_config,
        );

        Ok((output, output_id))
    }
}

fn footprint_model_config(model: &Model) -> anyhow::Result<serde_json::Value> {
    match model {
        Model::Real(spec) => spec.to_json(),
        Model::Pruned => Ok(json!({"is_pruned": true})),
    }
}
