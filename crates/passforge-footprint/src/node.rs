use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use passforge_metrics::MetricResult;

/// Metric annotation on a footprint node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FootprintNodeMetric {
    pub value: MetricResult,
    /// `+1` / `-1` per objective key, in objective order.
    #[serde(default)]
    pub cmp_direction: IndexMap<String, i8>,
    #[serde(default)]
    pub is_goals_met: bool,
}

/// One model in the provenance DAG.
///
/// Root nodes (input models) carry no parent edge. Pruned children carry
/// `{"is_pruned": true}` as their model config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintNode {
    pub model_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_pass: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_run_config: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<FootprintNodeMetric>,
    pub created_at: DateTime<Utc>,
}

impl FootprintNode {
    #[must_use]
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_config: None,
            parent_model_id: None,
            from_pass: None,
            pass_run_config: None,
            metrics: None,
            created_at: Utc::now(),
        }
    }

    /// Whether this node carries a measured value for every given key.
    #[must_use]
    pub fn has_complete_metrics(&self, objective_keys: &[&str]) -> bool {
        self.metrics
            .as_ref()
            .is_some_and(|m| m.value.covers(objective_keys))
    }

    /// Whether this node records a pruned branch.
    #[must_use]
    pub fn is_pruned(&self) -> bool {
        self.model_config
            .as_ref()
            .and_then(|c| c.get("is_pruned"))
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}
