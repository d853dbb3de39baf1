use anyhow::Result;
use indexmap::IndexMap;
use std::time::Duration;
use tracing::debug;

use passforge_metrics::{MetricResult, ObjectiveDict, signal_meets_goals};
use passforge_pass_api::{SearchPoint, SearchSpace};

use crate::{SearchStrategy, SearchStrategyConfig, Step, StopReason};

/// One flattened search axis: (pass, parameter, choices).
#[derive(Debug, Clone)]
struct Axis {
    pass_name: String,
    param: String,
    choices: Vec<serde_json::Value>,
}

/// The default strategy: exhaustive walk over the joint cross-product of
/// every pass's search space.
///
/// Each step starts from the seed model and covers the full pipeline, so
/// intermediate models are shared through the run cache rather than through
/// strategy state. With no searchable parameters the strategy proposes
/// exactly one step and stops.
#[derive(Debug)]
pub struct JointExhaustiveStrategy {
    config: SearchStrategyConfig,
    seed_model_id: String,
    pass_names: Vec<String>,
    objectives: ObjectiveDict,
    axes: Vec<Axis>,
    /// Odometer over `axes`; `None` once the space is exhausted.
    cursor: Option<Vec<usize>>,
    steps_proposed: usize,
    steps_pruned: usize,
}

impl JointExhaustiveStrategy {
    #[must_use]
    pub fn new(config: SearchStrategyConfig) -> Self {
        Self {
            config,
            seed_model_id: String::new(),
            pass_names: Vec::new(),
            objectives: ObjectiveDict::new(),
            axes: Vec::new(),
            cursor: None,
            steps_proposed: 0,
            steps_pruned: 0,
        }
    }

    fn point_for(&self, indices: &[usize], pass_name: &str) -> SearchPoint {
        let mut point = SearchPoint::new();
        for (axis, &index) in self.axes.iter().zip(indices) {
            if axis.pass_name == pass_name {
                point.insert(axis.param.clone(), axis.choices[index].clone());
            }
        }
        point
    }

    /// Advance the odometer; returns `None` after the last combination.
    fn advance(&self, indices: &[usize]) -> Option<Vec<usize>> {
        let mut next = indices.to_vec();
        for position in (0..self.axes.len()).rev() {
            next[position] += 1;
            if next[position] < self.axes[position].choices.len() {
                return Some(next);
            }
            next[position] = 0;
        }
        None
    }
}

impl SearchStrategy for JointExhaustiveStrategy {
    fn initialize(
        &mut self,
        search_spaces: &[(String, SearchSpace)],
        seed_model_id: &str,
        objectives: &ObjectiveDict,
    ) -> Result<()> {
        self.seed_model_id = seed_model_id.to_string();
        self.objectives = objectives.clone();
        self.pass_names = search_spaces.iter().map(|(name, _)| name.clone()).collect();
        self.axes = search_spaces
            .iter()
            .flat_map(|(pass_name, space)| {
                space.iter().map(|(param, choices)| Axis {
                    pass_name: pass_name.clone(),
                    param: param.clone(),
                    choices: choices.clone(),
                })
            })
            .collect();
        self.cursor = Some(vec![0; self.axes.len()]);
        self.steps_proposed = 0;
        self.steps_pruned = 0;

        let total: usize = self.axes.iter().map(|a| a.choices.len()).product();
        debug!(
            "joint exhaustive search over {} passes, {} points",
            self.pass_names.len(),
            total
        );
        Ok(())
    }

    fn next_step(&mut self) -> Option<Step> {
        let indices = self.cursor.clone()?;

        let passes: Vec<(String, SearchPoint)> = self
            .pass_names
            .iter()
            .map(|pass_name| (pass_name.clone(), self.point_for(&indices, pass_name)))
            .collect();

        self.cursor = self.advance(&indices);
        self.steps_proposed += 1;

        Some(Step::new(self.seed_model_id.clone(), passes))
    }

    fn record_feedback_signal(
        &mut self,
        search_point: &IndexMap<String, SearchPoint>,
        signal: Option<&MetricResult>,
        model_ids: &[String],
        pruned: bool,
    ) {
        if pruned {
            self.steps_pruned += 1;
        }
        debug!(
            "feedback for {search_point:?}: pruned={pruned}, models={}, signal={}",
            model_ids.len(),
            signal.map_or(0, MetricResult::len),
        );
    }

    fn check_exit_criteria(
        &self,
        iteration: usize,
        elapsed: Duration,
        signal: Option<&MetricResult>,
    ) -> Option<StopReason> {
        if let Some(max) = self.config.max_iter_num
            && iteration >= max
        {
            return Some(StopReason::MaxIterations(max));
        }
        if let Some(secs) = self.config.max_time_secs {
            let budget = Duration::from_secs(secs);
            if elapsed >= budget {
                return Some(StopReason::TimeBudgetExceeded(budget));
            }
        }
        if self.config.stop_when_goals_met
            && !self.objectives.is_empty()
            && signal.is_some_and(|s| signal_meets_goals(s, &self.objectives))
        {
            return Some(StopReason::GoalsMet);
        }
        None
    }

    fn output_model_num(&self) -> Option<usize> {
        self.config.output_model_num
    }
}
