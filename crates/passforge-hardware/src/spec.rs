use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Device;

/// A `(device, execution provider)` pair scoping one optimization run.
///
/// The `Display` form `<DEVICE>-<ExecutionProvider>` is part of the on-disk
/// contract: it appears unchanged in derived model ids, run-cache filenames,
/// evaluation-cache keys, and output file prefixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AcceleratorSpec {
    pub device: Device,
    pub execution_provider: String,
}

impl AcceleratorSpec {
    #[must_use]
    pub fn new(device: Device, execution_provider: impl Into<String>) -> Self {
        Self {
            device,
            execution_provider: execution_provider.into(),
        }
    }
}

impl fmt::Display for AcceleratorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.device, self.execution_provider)
    }
}
