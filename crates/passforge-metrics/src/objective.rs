use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::MetricResult;

/// One resolved objective: direction, optional absolute goal, priority.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub higher_is_better: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
    pub priority: i32,
}

impl Objective {
    /// Comparison multiplier: `+1` when higher values win, `-1` otherwise.
    #[must_use]
    pub const fn cmp_direction(&self) -> f64 {
        if self.higher_is_better { 1.0 } else { -1.0 }
    }
}

/// Ordered map of joint metric key → objective.
///
/// Iteration order is part of the contract: ascending priority, which is
/// also the tuple order used by top-K ranking.
pub type ObjectiveDict = IndexMap<String, Objective>;

/// Sort an objective dict ascending by priority, preserving relative order
/// of equal priorities.
#[must_use]
pub fn rank_by_priority(objectives: ObjectiveDict) -> ObjectiveDict {
    let mut entries: Vec<(String, Objective)> = objectives.into_iter().collect();
    entries.sort_by_key(|(_, o)| o.priority);
    entries.into_iter().collect()
}

/// Whether a signal satisfies every goal-carrying objective.
///
/// Objectives without goals never fail; objectives missing from the signal
/// always do.
#[must_use]
pub fn signal_meets_goals(signal: &MetricResult, objectives: &ObjectiveDict) -> bool {
    objectives.iter().all(|(key, objective)| {
        let Some(goal) = objective.goal else {
            return true;
        };
        match signal.value_of(key) {
            Some(value) => objective.cmp_direction() * value >= objective.cmp_direction() * goal,
            None => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricValue;

    fn signal(entries: &[(&str, f64, bool)]) -> MetricResult {
        entries
            .iter()
            .map(|(key, value, higher)| {
                (
                    (*key).to_string(),
                    MetricValue {
                        value: *value,
                        priority: 1,
                        higher_is_better: *higher,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn rank_by_priority_sorts_ascending() {
        let mut objectives = ObjectiveDict::new();
        objectives.insert(
            "accuracy-top1".to_string(),
            Objective {
                higher_is_better: true,
                goal: None,
                priority: 2,
            },
        );
        objectives.insert(
            "latency-avg".to_string(),
            Objective {
                higher_is_better: false,
                goal: None,
                priority: 1,
            },
        );

        let ranked = rank_by_priority(objectives);
        let keys: Vec<&String> = ranked.keys().collect();
        assert_eq!(keys, ["latency-avg", "accuracy-top1"]);
    }

    #[test]
    fn goals_respect_direction() {
        let mut objectives = ObjectiveDict::new();
        objectives.insert(
            "accuracy-top1".to_string(),
            Objective {
                higher_is_better: true,
                goal: Some(0.75),
                priority: 1,
            },
        );
        objectives.insert(
            "latency-avg".to_string(),
            Objective {
                higher_is_better: false,
                goal: Some(5.0),
                priority: 2,
            },
        );

        let passing = signal(&[("accuracy-top1", 0.80, true), ("latency-avg", 4.0, false)]);
        assert!(signal_meets_goals(&passing, &objectives));

        let slow = signal(&[("accuracy-top1", 0.80, true), ("latency-avg", 6.0, false)]);
        assert!(!signal_meets_goals(&slow, &objectives));
    }

    #[test]
    fn goalless_objectives_always_pass() {
        let mut objectives = ObjectiveDict::new();
        objectives.insert(
            "accuracy-top1".to_string(),
            Objective {
                higher_is_better: true,
                goal: None,
                priority: 1,
            },
        );
        let empty = MetricResult::new();
        assert!(signal_meets_goals(&empty, &objectives));
    }

    #[test]
    fn missing_metric_fails_a_goal() {
        let mut objectives = ObjectiveDict::new();
        objectives.insert(
            "accuracy-top1".to_string(),
            Objective {
                higher_is_better: true,
                goal: Some(0.5),
                priority: 1,
            },
        );
        let empty = MetricResult::new();
        assert!(!signal_meets_goals(&empty, &objectives));
    }
}
