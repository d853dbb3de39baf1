use std::sync::Arc;

use passforge_pass_api::{EvaluatorConfig, PassFactory, System};
use passforge_utils::error::{ConfigError, ForgeResult};

/// Declaration of one pass in the pipeline.
///
/// Descriptors are registered in execution order; per-accelerator instances
/// are built from them at setup time via the factory.
#[derive(Clone)]
pub struct PassDescriptor {
    pub(crate) factory: Arc<dyn PassFactory>,
    pub(crate) fixed_config: serde_json::Value,
    pub(crate) disable_search: bool,
    pub(crate) name: Option<String>,
    pub(crate) host: Option<Arc<dyn System>>,
    pub(crate) evaluator: Option<EvaluatorConfig>,
    pub(crate) clean_run_cache: bool,
    pub(crate) output_name: Option<String>,
}

impl PassDescriptor {
    #[must_use]
    pub fn new(factory: Arc<dyn PassFactory>) -> Self {
        Self {
            factory,
            fixed_config: serde_json::json!({}),
            disable_search: false,
            name: None,
            host: None,
            evaluator: None,
            clean_run_cache: false,
            output_name: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, fixed_config: serde_json::Value) -> Self {
        self.fixed_config = fixed_config;
        self
    }

    /// Freeze the pass to its fixed configuration even when a search
    /// strategy is active.
    #[must_use]
    pub fn with_disabled_search(mut self) -> Self {
        self.disable_search = true;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn System>) -> Self {
        self.host = Some(host);
        self
    }

    #[must_use]
    pub fn with_evaluator(mut self, evaluator: EvaluatorConfig) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Drop this pass type's cached runs at engine initialization.
    #[must_use]
    pub fn with_clean_run_cache(mut self) -> Self {
        self.clean_run_cache = true;
        self
    }

    /// Materialize this pass's output under the given name in no-search
    /// mode.
    #[must_use]
    pub fn with_output_name(mut self, output_name: impl Into<String>) -> Self {
        self.output_name = Some(output_name.into());
        self
    }
}

impl std::fmt::Debug for PassDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassDescriptor")
            .field("pass_type", &self.factory.pass_type_name())
            .field("name", &self.name)
            .field("disable_search", &self.disable_search)
            .field("clean_run_cache", &self.clean_run_cache)
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

/// Ordered pass declarations. Iteration order is the execution order of
/// no-search mode and the step order under search.
#[derive(Debug, Default)]
pub(crate) struct PassRegistry {
    entries: Vec<(String, PassDescriptor)>,
}

impl PassRegistry {
    /// Register a descriptor, auto-naming it `<TypeName>`, `<TypeName>_1`,
    /// … when no explicit name is given.
    pub(crate) fn register(&mut self, descriptor: PassDescriptor) -> ForgeResult<()> {
        let name = match &descriptor.name {
            Some(name) => {
                if self.contains(name) {
                    return Err(ConfigError::DuplicatePassName { name: name.clone() }.into());
                }
                name.clone()
            }
            None => {
                let base = descriptor.factory.pass_type_name().to_string();
                let mut candidate = base.clone();
                let mut id = 1;
                while self.contains(&candidate) {
                    candidate = format!("{base}_{id}");
                    id += 1;
                }
                candidate
            }
        };
        self.entries.push((name, descriptor));
        Ok(())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &(String, PassDescriptor)> {
        self.entries.iter()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
