//! Goal resolution: relative goals become absolute thresholds

use indexmap::IndexMap;
use tracing::debug;

use passforge_hardware::AcceleratorSpec;
use passforge_metrics::{Metric, Objective, ObjectiveDict, joint_metric_key, rank_by_priority};
use passforge_model::ModelSpec;
use passforge_utils::error::{ConfigError, ForgeResult};

use crate::engine::Engine;

impl Engine {
    /// Resolve the metrics' goals into the ranked objective dict for one
    /// accelerator, recording it in the footprint.
    ///
    /// Only sub-metrics with positive priority become objectives; the dict
    /// iterates ascending by priority.
    pub(crate) fn resolve_objectives(
        &mut self,
        input_model: &ModelSpec,
        input_model_id: &str,
        metrics: &[Metric],
        accelerator_spec: &AcceleratorSpec,
    ) -> ForgeResult<ObjectiveDict> {
        let goals = self.resolve_goals(input_model, input_model_id, metrics, accelerator_spec)?;

        let mut objectives = ObjectiveDict::new();
        for metric in metrics {
            for sub in &metric.sub_types {
                if sub.priority <= 0 {
                    continue;
                }
                let key = joint_metric_key(&metric.name, &sub.name);
                objectives.insert(
                    key.clone(),
                    Objective {
                        higher_is_better: sub.higher_is_better,
                        goal: goals.get(&key).copied().flatten(),
                        priority: sub.priority,
                    },
                );
            }
        }

        let ranked = rank_by_priority(objectives);
        self.footprint_mut(accelerator_spec)
            .record_objective_dict(ranked.clone());
        Ok(ranked)
    }

    /// Resolve every sub-metric goal to an absolute threshold.
    ///
    /// Threshold-only goal sets short-circuit without touching the
    /// evaluator. Any relative goal triggers exactly one baseline
    /// evaluation of the input model through the engine default evaluator.
    fn resolve_goals(
        &mut self,
        input_model: &ModelSpec,
        input_model_id: &str,
        metrics: &[Metric],
        accelerator_spec: &AcceleratorSpec,
    ) -> ForgeResult<IndexMap<String, Option<f64>>> {
        let needs_baseline = metrics
            .iter()
            .flat_map(|m| &m.sub_types)
            .any(|sub| sub.goal.is_some_and(|g| g.needs_baseline()));

        let mut resolved = IndexMap::new();

        if !needs_baseline {
            for metric in metrics {
                for sub in &metric.sub_types {
                    let key = joint_metric_key(&metric.name, &sub.name);
                    resolved.insert(key, sub.goal.map(|g| g.value));
                }
            }
            debug!("all goals are absolute thresholds; no baseline evaluation needed");
            return Ok(resolved);
        }

        let evaluator = self.evaluator_config.clone().ok_or_else(|| {
            ConfigError::MissingEvaluator {
                context: "a default evaluator is required to resolve relative goals".to_string(),
            }
        })?;

        debug!("computing baseline for goal resolution");
        let baseline =
            self.evaluate_model(input_model, input_model_id, &evaluator, accelerator_spec)?;
        debug!("baseline: {baseline:?}");

        for metric in metrics {
            for sub in &metric.sub_types {
                let key = joint_metric_key(&metric.name, &sub.name);
                let value = match (sub.goal, baseline.value_of(&key)) {
                    (Some(goal), Some(base)) => Some(goal.resolve(base, sub.higher_is_better)),
                    (Some(goal), None) if !goal.needs_baseline() => Some(goal.value),
                    _ => None,
                };
                resolved.insert(key, value);
            }
        }
        debug!("resolved goals: {resolved:?}");
        Ok(resolved)
    }
}
