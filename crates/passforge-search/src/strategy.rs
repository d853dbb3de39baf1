use anyhow::Result;
use indexmap::IndexMap;
use std::fmt;
use std::time::Duration;

use passforge_metrics::{MetricResult, ObjectiveDict};
use passforge_pass_api::{SearchPoint, SearchSpace};

use crate::Step;

/// Why a strategy ended the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    MaxIterations(usize),
    TimeBudgetExceeded(Duration),
    GoalsMet,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxIterations(n) => write!(f, "reached iteration limit of {n}"),
            Self::TimeBudgetExceeded(budget) => {
                write!(f, "exceeded time budget of {}s", budget.as_secs())
            }
            Self::GoalsMet => write!(f, "all metric goals met"),
        }
    }
}

/// A pluggable proposer of search steps.
///
/// The driver guarantees ordering: `initialize` first, then alternating
/// `next_step` / `record_feedback_signal` calls, with `check_exit_criteria`
/// between steps. Feedback for step N lands before `next_step` is asked for
/// step N+1, so the strategy always sees a consistent history.
pub trait SearchStrategy: Send {
    /// Bind the strategy to this accelerator's search spaces, the seed
    /// model, and the resolved objectives.
    fn initialize(
        &mut self,
        search_spaces: &[(String, SearchSpace)],
        seed_model_id: &str,
        objectives: &ObjectiveDict,
    ) -> Result<()>;

    /// Propose the next step, or `None` when the space is exhausted.
    fn next_step(&mut self) -> Option<Step>;

    /// Feed back the outcome of the latest step. `signal` is absent when
    /// the step was pruned or evaluation was skipped.
    fn record_feedback_signal(
        &mut self,
        search_point: &IndexMap<String, SearchPoint>,
        signal: Option<&MetricResult>,
        model_ids: &[String],
        pruned: bool,
    );

    /// Decide whether to end the search after a completed step.
    fn check_exit_criteria(
        &self,
        iteration: usize,
        elapsed: Duration,
        signal: Option<&MetricResult>,
    ) -> Option<StopReason>;

    /// Bound on how many frontier models to keep at termination, if any.
    fn output_model_num(&self) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_reasons_render_for_the_log() {
        assert_eq!(
            StopReason::MaxIterations(10).to_string(),
            "reached iteration limit of 10"
        );
        assert_eq!(
            StopReason::TimeBudgetExceeded(Duration::from_secs(60)).to_string(),
            "exceeded time budget of 60s"
        );
        assert_eq!(StopReason::GoalsMet.to_string(), "all metric goals met");
    }
}
