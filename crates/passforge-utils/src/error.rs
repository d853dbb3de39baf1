use thiserror::Error;

/// Library-level error type returned by passforge operations.
///
/// Errors fall into the engine's taxonomy:
///
/// | Category | Behavior |
/// |----------|----------|
/// | `Config` | Invalid engine or pass configuration; raised immediately |
/// | `Strategy` | A search strategy violated its contract; always propagates |
/// | `Fatal` | Programmer error surfaced by a collaborator; always propagates |
/// | `Io` | Filesystem failure outside the cache (cache I/O is contained) |
///
/// Pass execution failures are not represented here: they are contained to a
/// pruned model by the executor and never escape as errors under search.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("search strategy contract violation: {0}")]
    Strategy(String),

    #[error("fatal error: {0}")]
    Fatal(#[source] anyhow::Error),

    #[error("evaluation failed: {0}")]
    Evaluation(#[source] anyhow::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ForgeError {
    /// Whether this error must propagate through the per-accelerator loop
    /// instead of being downgraded to a warning.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Strategy(_) | Self::Fatal(_))
    }
}

/// Configuration errors detected before or during engine setup.
///
/// These are never recoverable: the run aborts before any pass executes on
/// the offending accelerator.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no valid accelerator specified for target system")]
    NoValidAccelerator,

    #[error("remote target system requires execution providers to be specified")]
    RemoteProvidersRequired,

    #[error("no evaluator provided: {context}")]
    MissingEvaluator { context: String },

    #[error("pass {pass} has a search space but search is disabled")]
    SearchSpaceWithoutStrategy { pass: String },

    #[error("pass with name {name} already registered")]
    DuplicatePassName { name: String },

    #[error("unknown device: {device}")]
    UnknownDevice { device: String },

    #[error("no passes registered")]
    NoPassesRegistered,
}

pub type ForgeResult<T> = Result<T, ForgeError>;
