use thiserror::Error;

/// Failure modes of a single pass invocation, as seen by the executor.
///
/// The variant decides containment:
///
/// - `Execution` — the pass itself failed on this input/configuration. The
///   executor contains it: the step's output becomes pruned and the search
///   continues. Fatal only in no-search mode.
/// - `Usage` — the pass was driven incorrectly (missing config key, wrong
///   value type, unloadable dependency). Always propagates; retrying would
///   mask a bug.
/// - `Other` — anything unexpected. Contained under search, propagated when
///   search is disabled so a single-shot pipeline surfaces its errors.
#[derive(Error, Debug)]
pub enum PassRunError {
    #[error("pass execution failed: {0}")]
    Execution(String),

    #[error("invalid pass usage: {0}")]
    Usage(#[source] anyhow::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PassRunError {
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(anyhow::anyhow!(message.into()))
    }

    #[must_use]
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}
