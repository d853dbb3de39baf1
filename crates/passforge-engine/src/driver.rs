//! Search and no-search drivers

use camino::Utf8Path;
use std::cmp::Ordering;
use tracing::{debug, info, warn};

use passforge_footprint::{Footprint, FootprintNode};
use passforge_hardware::AcceleratorSpec;
use passforge_metrics::ObjectiveDict;
use passforge_model::{Model, ModelSpec};
use passforge_search::{JointExhaustiveStrategy, SearchStrategy, SearchStrategyConfig, Step};
use passforge_utils::atomic_write::write_file_atomic;
use passforge_utils::error::{ConfigError, ForgeError, ForgeResult};
use passforge_utils::json::to_string_pretty4;

use crate::config::{RunOutput, output_prefix};
use crate::engine::Engine;

impl Engine {
    /// Drive the configured strategy over this accelerator's search space.
    ///
    /// Returns the Pareto frontier footprint, top-K reduced when the
    /// strategy bounds its output. The full DAG and the frontier are both
    /// flushed to `output_dir` before returning.
    pub(crate) fn run_search(
        &mut self,
        input_model: &ModelSpec,
        input_model_id: &str,
        accelerator_spec: &AcceleratorSpec,
        output_dir: &Utf8Path,
        output_name: Option<&str>,
    ) -> ForgeResult<Footprint> {
        let prefix = output_prefix(output_name, accelerator_spec);

        let last_pass = self
            .passes
            .last()
            .map(|item| item.name.clone())
            .ok_or(ConfigError::NoPassesRegistered)?;
        let evaluator_config = self.evaluator_for_pass(&last_pass).ok_or_else(|| {
            ConfigError::MissingEvaluator {
                context: format!("no evaluator for final pass {last_pass} under search"),
            }
        })?;

        let objectives = self.resolve_objectives(
            input_model,
            input_model_id,
            &evaluator_config.metrics,
            accelerator_spec,
        )?;

        let search_spaces = self.pass_search_spaces();
        let strategy = self.strategy_mut()?;
        strategy
            .initialize(&search_spaces, input_model_id, &objectives)
            .map_err(ForgeError::Fatal)?;
        let output_model_num = strategy.output_model_num();

        let start = self.clock.now();
        let mut iteration = 0usize;
        loop {
            iteration += 1;

            let Some(step) = self.strategy_mut()?.next_step() else {
                break;
            };

            let model = self.resolve_step_model(&step, input_model, input_model_id)?;
            debug!("step {iteration} with search point {:?}", step.search_point);

            let outcome =
                self.run_passes(&step.passes, model, step.model_id.clone(), accelerator_spec)?;

            let elapsed = self.clock.now() - start;
            let strategy = self.strategy_mut()?;
            strategy.record_feedback_signal(
                &step.search_point,
                outcome.signal.as_ref(),
                &outcome.model_ids,
                outcome.should_prune,
            );
            if let Some(reason) =
                strategy.check_exit_criteria(iteration, elapsed, outcome.signal.as_ref())
            {
                info!("stopping search: {reason}");
                break;
            }
        }

        let footprint = self.footprint_mut(accelerator_spec);
        footprint
            .to_file(&output_dir.join(format!("{prefix}footprints.json")))
            .map_err(ForgeError::Fatal)?;

        let mut frontier = footprint.get_pareto_frontier();
        match output_model_num {
            Some(k) if frontier.len() > k => {
                let top = top_ranked_nodes(&frontier, k);
                info!("output top ranked {} models based on metric priorities", top.len());
                frontier.update_nodes(top);
            }
            _ => info!("output all {} models", frontier.len()),
        }

        frontier
            .to_file(&output_dir.join(format!("{prefix}pareto_frontier_footprints.json")))
            .map_err(ForgeError::Fatal)?;

        if self.config.plot_pareto_frontier {
            debug!("pareto frontier plotting delegates to an external plotter; skipping");
        }

        Ok(frontier)
    }

    /// Execute the whole registered pipeline exactly once.
    ///
    /// Any pass with a non-empty search space is a configuration error
    /// here. Output artifacts are materialized for every pass carrying an
    /// output name, with the engine-wide `output_name` overriding the
    /// terminal pass's.
    pub(crate) fn run_no_search(
        &mut self,
        input_model: &ModelSpec,
        input_model_id: &str,
        accelerator_spec: &AcceleratorSpec,
        output_dir: &Utf8Path,
        output_name: Option<&str>,
    ) -> ForgeResult<Option<RunOutput>> {
        for item in &self.passes {
            if !item.pass.search_space().is_empty() {
                return Err(ConfigError::SearchSpaceWithoutStrategy {
                    pass: item.name.clone(),
                }
                .into());
            }
        }

        let last_pass = self
            .passes
            .last()
            .map(|item| item.name.clone())
            .ok_or(ConfigError::NoPassesRegistered)?;
        let objectives = match self.evaluator_for_pass(&last_pass) {
            Some(evaluator_config) => self.resolve_objectives(
                input_model,
                input_model_id,
                &evaluator_config.metrics,
                accelerator_spec,
            )?,
            None => ObjectiveDict::new(),
        };

        // The default strategy over all-empty spaces proposes exactly the
        // one step that covers every pass in registration order.
        let search_spaces = self.pass_search_spaces();
        let mut strategy = JointExhaustiveStrategy::new(SearchStrategyConfig::default());
        strategy
            .initialize(&search_spaces, input_model_id, &objectives)
            .map_err(ForgeError::Fatal)?;
        let step = strategy.next_step().ok_or_else(|| {
            ForgeError::Strategy("no step proposed for the single-shot pipeline".to_string())
        })?;

        let model = self.resolve_step_model(&step, input_model, input_model_id)?;
        debug!("single-shot step with search point {:?}", step.search_point);

        let outcome =
            self.run_passes(&step.passes, model, step.model_id.clone(), accelerator_spec)?;
        if outcome.should_prune {
            // Only reachable through a warm cache that recorded this chain
            // as pruned; there is nothing to materialize.
            warn!("pipeline output was pruned; no output model produced");
            return Ok(None);
        }

        let mut pass_output_names: Vec<Option<String>> = self
            .passes
            .iter()
            .map(|item| {
                item.output_name
                    .as_ref()
                    .map(|name| format!("{name}_{accelerator_spec}"))
            })
            .collect();

        let final_name = if let Some(name) = output_name {
            debug!("engine output_name overrides the final pass output name");
            format!("{name}_{accelerator_spec}")
        } else if let Some(Some(name)) = pass_output_names.last() {
            name.clone()
        } else {
            accelerator_spec.to_string()
        };
        if let Some(last) = pass_output_names.last_mut() {
            *last = Some(final_name.clone());
        }

        let mut output_model_json = None;
        for (name, model_id) in pass_output_names.iter().zip(&outcome.model_ids) {
            let Some(name) = name else { continue };
            let sidecar = self
                .cache
                .save_output_model(model_id, output_dir, &format!("{name}_model"), true)
                .map_err(ForgeError::Fatal)?;
            output_model_json = Some(sidecar);
        }

        if let Some(signal) = &outcome.signal {
            let path = output_dir.join(format!("{final_name}_metrics.json"));
            write_file_atomic(&path, &to_string_pretty4(signal).map_err(ForgeError::Fatal)?)
                .map_err(ForgeError::Fatal)?;
        }

        Ok(output_model_json.map(|model| RunOutput::NoSearch {
            model,
            metrics: outcome.signal,
        }))
    }

    /// Starting model for a step: the in-memory input, or a cache load for
    /// derived ids. A missing or pruned starting model is a strategy bug.
    fn resolve_step_model(
        &self,
        step: &Step,
        input_model: &ModelSpec,
        input_model_id: &str,
    ) -> ForgeResult<ModelSpec> {
        if step.model_id == input_model_id {
            return Ok(input_model.clone());
        }
        match self.cache.load_model(&step.model_id) {
            Some(Model::Real(spec)) => Ok(spec),
            Some(Model::Pruned) => Err(ForgeError::Strategy(format!(
                "step starts from pruned model {}",
                step.model_id
            ))),
            None => Err(ForgeError::Strategy(format!(
                "step starts from unknown model {}",
                step.model_id
            ))),
        }
    }

    fn strategy_mut(&mut self) -> ForgeResult<&mut Box<dyn SearchStrategy>> {
        self.strategy
            .as_mut()
            .ok_or_else(|| ForgeError::Strategy("search driver invoked without a strategy".to_string()))
    }
}

/// Top-K selection over a frontier: stable descending sort on the tuple of
/// direction-adjusted objective values in priority order.
fn top_ranked_nodes(footprint: &Footprint, k: usize) -> Vec<FootprintNode> {
    let mut nodes: Vec<FootprintNode> = footprint.nodes().values().cloned().collect();
    nodes.sort_by(|a, b| {
        let va = footprint.objective_vector(a).unwrap_or_default();
        let vb = footprint.objective_vector(b).unwrap_or_default();
        vb.iter()
            .zip(&va)
            .map(|(y, x)| y.total_cmp(x))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
    nodes.truncate(k);
    nodes
}
