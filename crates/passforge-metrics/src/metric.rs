use serde::{Deserialize, Serialize};

/// A named metric with one or more sub-metrics.
///
/// Sub-metrics are the unit of comparison: `latency` may expose `avg` and
/// `p90`, each with its own priority and direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub sub_types: Vec<SubMetric>,
}

impl Metric {
    #[must_use]
    pub fn new(name: impl Into<String>, sub_types: Vec<SubMetric>) -> Self {
        Self {
            name: name.into(),
            sub_types,
        }
    }
}

/// One measurable value under a metric.
///
/// Priority 0 (or below) marks the sub-metric informational: it is recorded
/// in results but never becomes an objective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMetric {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_higher_is_better")]
    pub higher_is_better: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
}

const fn default_higher_is_better() -> bool {
    true
}

/// A target for a sub-metric, either absolute or relative to a baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "type")]
    pub kind: GoalKind,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalKind {
    Threshold,
    MaxDegradation,
    MinImprovement,
    PercentMaxDegradation,
    PercentMinImprovement,
}

impl Goal {
    /// Resolve this goal into an absolute threshold.
    ///
    /// `baseline` is the input model's measured value for the sub-metric;
    /// it is only consulted for relative goal kinds. The sign multiplier
    /// `m` is `+1` when higher values are better, `-1` otherwise, so
    /// "degradation" always moves against the metric's direction.
    #[must_use]
    pub fn resolve(&self, baseline: f64, higher_is_better: bool) -> f64 {
        let m = if higher_is_better { 1.0 } else { -1.0 };
        match self.kind {
            GoalKind::Threshold => self.value,
            GoalKind::MaxDegradation => baseline - m * self.value,
            GoalKind::MinImprovement => baseline + m * self.value,
            GoalKind::PercentMaxDegradation => baseline * (1.0 - m * self.value / 100.0),
            GoalKind::PercentMinImprovement => baseline * (1.0 + m * self.value / 100.0),
        }
    }

    /// Whether resolving this goal requires a baseline evaluation.
    #[must_use]
    pub const fn needs_baseline(&self) -> bool {
        !matches!(self.kind, GoalKind::Threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_ignores_the_baseline() {
        let goal = Goal {
            kind: GoalKind::Threshold,
            value: 0.9,
        };
        assert_eq!(goal.resolve(0.1, true), 0.9);
        assert!(!goal.needs_baseline());
    }

    #[test]
    fn max_degradation_walks_down_for_higher_is_better() {
        // baseline accuracy 0.80, allow 0.05 degradation -> floor 0.75
        let goal = Goal {
            kind: GoalKind::MaxDegradation,
            value: 0.05,
        };
        assert!((goal.resolve(0.80, true) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn max_degradation_walks_up_for_lower_is_better() {
        // baseline latency 10ms, allow 2ms degradation -> ceiling 12ms
        let goal = Goal {
            kind: GoalKind::MaxDegradation,
            value: 2.0,
        };
        assert!((goal.resolve(10.0, false) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn min_improvement_moves_with_the_direction() {
        let goal = Goal {
            kind: GoalKind::MinImprovement,
            value: 0.02,
        };
        assert!((goal.resolve(0.80, true) - 0.82).abs() < 1e-9);
        assert!((goal.resolve(10.0, false) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn percent_goals_scale_the_baseline() {
        let degradation = Goal {
            kind: GoalKind::PercentMaxDegradation,
            value: 10.0,
        };
        assert!((degradation.resolve(0.80, true) - 0.72).abs() < 1e-9);

        let improvement = Goal {
            kind: GoalKind::PercentMinImprovement,
            value: 25.0,
        };
        assert!((improvement.resolve(10.0, false) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn goal_kind_serializes_kebab_case() {
        let goal = Goal {
            kind: GoalKind::PercentMaxDegradation,
            value: 5.0,
        };
        let json = serde_json::to_value(goal).unwrap();
        assert_eq!(json["type"], "percent-max-degradation");
    }
}
