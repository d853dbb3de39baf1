//! Provenance footprint for optimization runs
//!
//! Every model the engine touches becomes a node in an in-memory DAG keyed
//! by model id, with parent edges naming the pass and configuration that
//! produced it and optional metric annotations from evaluation. At the end
//! of a run the DAG is flushed to disk and the Pareto frontier is computed
//! over nodes with complete metrics.

mod node;
mod pareto;

pub use node::{FootprintNode, FootprintNodeMetric};

use anyhow::{Context, Result};
use camino::Utf8Path;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use passforge_metrics::{MetricResult, ObjectiveDict, signal_meets_goals};
use passforge_utils::atomic_write::write_file_atomic;
use passforge_utils::json::to_string_pretty4;

/// The provenance DAG plus the objective vector it was collected under.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Footprint {
    objective_dict: ObjectiveDict,
    nodes: IndexMap<String, FootprintNode>,
}

impl Footprint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn nodes(&self) -> &IndexMap<String, FootprintNode> {
        &self.nodes
    }

    #[must_use]
    pub fn objective_dict(&self) -> &ObjectiveDict {
        &self.objective_dict
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn record_objective_dict(&mut self, objectives: ObjectiveDict) {
        self.objective_dict = objectives;
    }

    /// Ensure a bare node exists for `model_id` (used for the input model).
    pub fn record_node(&mut self, model_id: &str) {
        self.ensure_node(model_id);
    }

    /// Record the provenance edge for a produced (or cache-loaded) model.
    ///
    /// Graph edges are set once: if the node already carries a parent edge a
    /// later record leaves it untouched, so replays of cached runs cannot
    /// rewrite history.
    pub fn record_run(
        &mut self,
        model_id: &str,
        model_config: serde_json::Value,
        parent_model_id: &str,
        from_pass: &str,
        pass_run_config: serde_json::Value,
    ) {
        let node = self.ensure_node(model_id);
        if node.parent_model_id.is_none() {
            node.model_config = Some(model_config);
            node.parent_model_id = Some(parent_model_id.to_string());
            node.from_pass = Some(from_pass.to_string());
            node.pass_run_config = Some(pass_run_config);
        }
    }

    /// Attach an evaluation signal to a node.
    ///
    /// Metric values are written at most once; a second record for the same
    /// node only refreshes `is_goals_met` against the current objectives.
    pub fn record_metrics(&mut self, model_id: &str, signal: MetricResult) {
        let goals_met = signal_meets_goals(&signal, &self.objective_dict);
        let cmp_direction: IndexMap<String, i8> = self
            .objective_dict
            .iter()
            .map(|(key, objective)| (key.clone(), if objective.higher_is_better { 1 } else { -1 }))
            .collect();

        let node = self.ensure_node(model_id);
        match node.metrics.as_mut() {
            Some(existing) => existing.is_goals_met = goals_met,
            None => {
                node.metrics = Some(FootprintNodeMetric {
                    value: signal,
                    cmp_direction,
                    is_goals_met: goals_met,
                });
            }
        }
    }

    /// The most recently inserted node (terminal model in no-search mode).
    #[must_use]
    pub fn get_last_node(&self) -> Option<&FootprintNode> {
        self.nodes.values().last()
    }

    /// Replace the node set, keeping the objective dict (top-K reduction).
    pub fn update_nodes(&mut self, nodes: Vec<FootprintNode>) {
        self.nodes = nodes
            .into_iter()
            .map(|n| (n.model_id.clone(), n))
            .collect();
    }

    /// Serialize the DAG to a JSON file (4-space indent).
    pub fn to_file(&self, path: &Utf8Path) -> Result<()> {
        let rendered = to_string_pretty4(self)?;
        write_file_atomic(path, &rendered)
            .with_context(|| format!("Failed to write footprint: {path}"))
    }

    /// Load a footprint previously written by [`Footprint::to_file`].
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_std_path())
            .with_context(|| format!("Failed to read footprint: {path}"))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse footprint: {path}"))
    }

    fn ensure_node(&mut self, model_id: &str) -> &mut FootprintNode {
        self.nodes
            .entry(model_id.to_string())
            .or_insert_with(|| FootprintNode::new(model_id))
    }
}
