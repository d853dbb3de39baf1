use serde::{Deserialize, Serialize};

use crate::{JointExhaustiveStrategy, SearchStrategy};

/// How multi-pass steps are composed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionOrder {
    /// Every step runs the full pipeline from the seed model with one joint
    /// selection across all pass spaces.
    #[default]
    Joint,
}

/// Which algorithm proposes points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchAlgorithm {
    #[default]
    Exhaustive,
}

/// Declarative strategy configuration, deserialized from the engine config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStrategyConfig {
    #[serde(default)]
    pub execution_order: ExecutionOrder,
    #[serde(default)]
    pub search_algorithm: SearchAlgorithm,
    /// Keep only the top K frontier models at termination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_model_num: Option<usize>,
    /// Stop after this many iterations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iter_num: Option<usize>,
    /// Stop once this much wall-clock time has elapsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_time_secs: Option<u64>,
    /// Stop as soon as a step's signal satisfies every goal.
    #[serde(default)]
    pub stop_when_goals_met: bool,
}

impl SearchStrategyConfig {
    /// Build the strategy this configuration describes.
    #[must_use]
    pub fn create_strategy(&self) -> Box<dyn SearchStrategy> {
        match (self.execution_order, self.search_algorithm) {
            (ExecutionOrder::Joint, SearchAlgorithm::Exhaustive) => {
                Box::new(JointExhaustiveStrategy::new(self.clone()))
            }
        }
    }
}
