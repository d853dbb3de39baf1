//! Pareto frontier computation over footprint nodes

use tracing::debug;

use crate::{Footprint, FootprintNode};

impl Footprint {
    /// Nodes not dominated by any other node with complete metrics.
    ///
    /// A dominates B iff for every objective the direction-adjusted value of
    /// A is at least B's, and strictly greater for at least one. Nodes
    /// lacking a value for any objective are excluded from candidacy but
    /// remain in the full graph.
    #[must_use]
    pub fn get_pareto_frontier(&self) -> Self {
        let objective_keys: Vec<&str> = self.objective_dict().keys().map(String::as_str).collect();

        let candidates: Vec<&FootprintNode> = self
            .nodes()
            .values()
            .filter(|n| n.has_complete_metrics(&objective_keys))
            .collect();

        let frontier: Vec<FootprintNode> = candidates
            .iter()
            .filter(|node| !candidates.iter().any(|other| self.dominates(other, node)))
            .map(|n| (*n).clone())
            .collect();

        debug!(
            "pareto frontier holds {} of {} candidate nodes",
            frontier.len(),
            candidates.len()
        );

        let mut result = Self::new();
        result.record_objective_dict(self.objective_dict().clone());
        result.update_nodes(frontier);
        result
    }

    /// Direction-adjusted objective values for a node, in objective order.
    ///
    /// Returns `None` when the node lacks a value for any objective.
    #[must_use]
    pub fn objective_vector(&self, node: &FootprintNode) -> Option<Vec<f64>> {
        let metrics = node.metrics.as_ref()?;
        self.objective_dict()
            .iter()
            .map(|(key, objective)| {
                metrics
                    .value
                    .value_of(key)
                    .map(|v| objective.cmp_direction() * v)
            })
            .collect()
    }

    fn dominates(&self, a: &FootprintNode, b: &FootprintNode) -> bool {
        if a.model_id == b.model_id {
            return false;
        }
        let (Some(va), Some(vb)) = (self.objective_vector(a), self.objective_vector(b)) else {
            return false;
        };
        let all_geq = va.iter().zip(&vb).all(|(x, y)| x >= y);
        let any_gt = va.iter().zip(&vb).any(|(x, y)| x > y);
        all_geq && any_gt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use passforge_metrics::{MetricResult, MetricValue, Objective, ObjectiveDict};

    fn two_objective_dict() -> ObjectiveDict {
        let mut dict = IndexMap::new();
        dict.insert(
            "latency-avg".to_string(),
            Objective {
                higher_is_better: false,
                goal: None,
                priority: 1,
            },
        );
        dict.insert(
            "accuracy-top1".to_string(),
            Objective {
                higher_is_better: true,
                goal: None,
                priority: 2,
            },
        );
        dict
    }

    fn signal(latency: f64, accuracy: f64) -> MetricResult {
        let mut result = MetricResult::new();
        result.insert(
            "latency-avg",
            MetricValue {
                value: latency,
                priority: 1,
                higher_is_better: false,
            },
        );
        result.insert(
            "accuracy-top1",
            MetricValue {
                value: accuracy,
                priority: 2,
                higher_is_better: true,
            },
        );
        result
    }

    fn footprint_with(nodes: &[(&str, f64, f64)]) -> Footprint {
        let mut footprint = Footprint::new();
        footprint.record_objective_dict(two_objective_dict());
        for (id, latency, accuracy) in nodes {
            footprint.record_node(id);
            footprint.record_metrics(id, signal(*latency, *accuracy));
        }
        footprint
    }

    #[test]
    fn dominated_nodes_are_excluded() {
        // "slow" is strictly worse on both objectives.
        let footprint = footprint_with(&[("fast", 2.0, 0.9), ("slow", 5.0, 0.8)]);

        let frontier = footprint.get_pareto_frontier();

        assert_eq!(frontier.len(), 1);
        assert!(frontier.nodes().contains_key("fast"));
    }

    #[test]
    fn trade_offs_survive_on_the_frontier() {
        // Faster-but-less-accurate and slower-but-more-accurate both stay.
        let footprint = footprint_with(&[("fast", 2.0, 0.80), ("accurate", 5.0, 0.95)]);

        let frontier = footprint.get_pareto_frontier();

        assert_eq!(frontier.len(), 2);
    }

    #[test]
    fn equal_nodes_do_not_dominate_each_other() {
        let footprint = footprint_with(&[("a", 2.0, 0.9), ("b", 2.0, 0.9)]);

        let frontier = footprint.get_pareto_frontier();

        assert_eq!(frontier.len(), 2);
    }

    #[test]
    fn nodes_without_metrics_are_not_candidates() {
        let mut footprint = footprint_with(&[("evaluated", 2.0, 0.9)]);
        footprint.record_node("never-evaluated");

        let frontier = footprint.get_pareto_frontier();

        assert_eq!(frontier.len(), 1);
        assert!(frontier.nodes().contains_key("evaluated"));
        // The full graph still holds the unevaluated node.
        assert_eq!(footprint.len(), 2);
    }

    #[test]
    fn frontier_is_self_consistent() {
        let footprint = footprint_with(&[
            ("a", 2.0, 0.80),
            ("b", 3.0, 0.85),
            ("c", 4.0, 0.90),
            ("dominated", 5.0, 0.70),
        ]);

        let frontier = footprint.get_pareto_frontier();

        assert_eq!(frontier.len(), 3);
        assert!(!frontier.nodes().contains_key("dominated"));
        // Recomputing over the frontier changes nothing.
        assert_eq!(frontier.get_pareto_frontier().len(), 3);
    }
}
