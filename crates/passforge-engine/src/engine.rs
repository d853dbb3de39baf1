use anyhow::Context;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use passforge_cache::Cache;
use passforge_footprint::Footprint;
use passforge_hardware::{AcceleratorSpec, CPU_EXECUTION_PROVIDER, resolve_accelerator_specs};
use passforge_model::{Model, ModelSpec, ResourcePath, input_model_id};
use passforge_pass_api::{
    EvaluatorConfig, Packager, Pass, ResourceFetcher, System,
};
use passforge_search::SearchStrategy;
use passforge_utils::clock::{Clock, SystemClock};
use passforge_utils::error::{ConfigError, ForgeError, ForgeResult};
use passforge_utils::json::to_string_pretty4;
use passforge_utils::paths::ensure_dir_all;

use crate::config::{EngineConfig, RunOptions, RunOutput, output_prefix};
use crate::registry::{PassDescriptor, PassRegistry};
use crate::system::LocalSystem;

/// A registered pass materialized for one accelerator.
pub(crate) struct PassItem {
    pub(crate) name: String,
    pub(crate) pass: Box<dyn Pass>,
    pub(crate) host: Option<Arc<dyn System>>,
    pub(crate) evaluator: Option<EvaluatorConfig>,
    pub(crate) output_name: Option<String>,
}

/// The orchestration engine.
///
/// Construct via [`Engine::builder`], register passes in execution order,
/// then call [`Engine::run`]. The engine owns its cache directory for the
/// duration of the run and drives one accelerator at a time.
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) cache: Cache,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) host: Arc<dyn System>,
    pub(crate) target: Arc<dyn System>,
    pub(crate) evaluator_config: Option<EvaluatorConfig>,
    pub(crate) strategy: Option<Box<dyn SearchStrategy>>,
    pub(crate) fetcher: Option<Arc<dyn ResourceFetcher>>,
    pub(crate) packager: Option<Arc<dyn Packager>>,
    pub(crate) accelerator_specs: Vec<AcceleratorSpec>,
    pub(crate) registry: PassRegistry,
    pub(crate) passes: Vec<PassItem>,
    pub(crate) footprints: IndexMap<AcceleratorSpec, Footprint>,
    initialized: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("accelerator_specs", &self.accelerator_specs)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

impl Engine {
    #[must_use]
    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    /// Accelerator specs resolved for the target system, in run order.
    #[must_use]
    pub fn accelerator_specs(&self) -> &[AcceleratorSpec] {
        &self.accelerator_specs
    }

    /// Full provenance footprints collected so far, per accelerator.
    #[must_use]
    pub fn footprints(&self) -> &IndexMap<AcceleratorSpec, Footprint> {
        &self.footprints
    }

    /// Register a pass declaration. Order of registration is execution
    /// order.
    pub fn register(&mut self, descriptor: PassDescriptor) -> ForgeResult<()> {
        self.registry.register(descriptor)
    }

    /// Clean caches as configured and prepare counters. Runs once, before
    /// the first accelerator.
    fn initialize(&mut self) -> ForgeResult<()> {
        if self.config.clean_cache {
            self.cache.clean().map_err(ForgeError::Fatal)?;
            // Reopen to reset the model-number floor along with the disk.
            self.cache =
                Cache::new(self.config.cache_dir.clone()).map_err(ForgeError::Fatal)?;
        }
        if self.config.clean_evaluation_cache {
            self.cache.clean_evaluations().map_err(ForgeError::Fatal)?;
        }
        for (_, descriptor) in self.registry.iter() {
            if descriptor.clean_run_cache {
                self.cache
                    .clean_pass_runs(descriptor.factory.pass_type_name())
                    .map_err(ForgeError::Fatal)?;
            }
        }
        self.initialized = true;
        Ok(())
    }

    /// Run the registered pipeline on `input_model` across every resolved
    /// accelerator.
    ///
    /// Fatal errors (configuration, strategy contract violations,
    /// programmer errors surfaced by passes) propagate immediately. Any
    /// other failure is contained to its accelerator: it is logged as a
    /// warning and the returned map simply omits that accelerator.
    pub fn run(
        &mut self,
        input_model: &ModelSpec,
        options: &RunOptions,
    ) -> ForgeResult<IndexMap<AcceleratorSpec, RunOutput>> {
        if !self.initialized {
            self.initialize()?;
        }

        let output_dir = if options.output_dir.as_str().is_empty() {
            Utf8PathBuf::from(".")
        } else {
            options.output_dir.clone()
        };
        ensure_dir_all(&output_dir)?;

        let mut outputs = IndexMap::new();
        let mut pf_footprints: IndexMap<AcceleratorSpec, Footprint> = IndexMap::new();

        for spec in self.accelerator_specs.clone() {
            match self.run_accelerator(input_model, &spec, options, &output_dir) {
                Ok(Some((output, frontier))) => {
                    if let Some(frontier) = frontier {
                        pf_footprints.insert(spec.clone(), frontier);
                    }
                    outputs.insert(spec, output);
                }
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("failed to run passforge on {spec}: {e:#}"),
            }
        }

        if let Some(packaging_config) = &options.packaging_config {
            if let Some(packager) = &self.packager {
                let total: usize = pf_footprints.values().map(Footprint::len).sum();
                info!("packaging {total} top ranked models as artifacts");
                packager
                    .generate_output_artifacts(
                        packaging_config,
                        &self.footprints,
                        &pf_footprints,
                        &output_dir,
                    )
                    .map_err(ForgeError::Fatal)?;
            } else {
                warn!("packaging config provided but no packager wired, skipping");
            }
        } else {
            info!("no packaging config provided, skipping artifact packaging");
        }

        Ok(outputs)
    }

    fn run_accelerator(
        &mut self,
        input_model: &ModelSpec,
        accelerator_spec: &AcceleratorSpec,
        options: &RunOptions,
        output_dir: &Utf8PathBuf,
    ) -> ForgeResult<Option<(RunOutput, Option<Footprint>)>> {
        self.setup_passes(accelerator_spec)?;

        // Hash and cache the input eagerly so every derived id has a root.
        let input_id = input_model_id(input_model).map_err(ForgeError::Fatal)?;
        self.cache
            .cache_model(&Model::Real(input_model.clone()), &input_id);
        self.footprint_mut(accelerator_spec).record_node(&input_id);

        if options.evaluation_only {
            let evaluator = self.evaluator_config.clone().ok_or_else(|| {
                ConfigError::MissingEvaluator {
                    context: "evaluation-only run requires an engine evaluator".to_string(),
                }
            })?;
            let signal =
                self.evaluate_model(input_model, &input_id, &evaluator, accelerator_spec)?;

            let prefix = output_prefix(options.output_name.as_deref(), accelerator_spec);
            let path = output_dir.join(format!("{prefix}metrics.json"));
            passforge_utils::atomic_write::write_file_atomic(
                &path,
                &to_string_pretty4(&signal).map_err(ForgeError::Fatal)?,
            )
            .map_err(ForgeError::Fatal)?;

            return Ok(Some((RunOutput::Metrics(signal), None)));
        }

        if self.strategy.is_some() {
            let frontier = self.run_search(
                input_model,
                &input_id,
                accelerator_spec,
                output_dir,
                options.output_name.as_deref(),
            )?;
            Ok(Some((RunOutput::Search(frontier.clone()), Some(frontier))))
        } else {
            let output = self.run_no_search(
                input_model,
                &input_id,
                accelerator_spec,
                output_dir,
                options.output_name.as_deref(),
            )?;
            match output {
                Some(output) => {
                    // Packaging wants a per-accelerator "frontier"; in
                    // no-search mode that is the terminal model alone.
                    let footprint = self.footprint_mut(accelerator_spec);
                    let mut terminal = Footprint::new();
                    terminal.record_objective_dict(footprint.objective_dict().clone());
                    if let Some(last) = footprint.get_last_node() {
                        terminal.update_nodes(vec![last.clone()]);
                    }
                    Ok(Some((output, Some(terminal))))
                }
                None => Ok(None),
            }
        }
    }

    /// Build per-accelerator pass instances from the registry.
    pub(crate) fn setup_passes(&mut self, accelerator_spec: &AcceleratorSpec) -> ForgeResult<()> {
        self.passes.clear();
        if self.registry.is_empty() {
            return Err(ConfigError::NoPassesRegistered.into());
        }
        for (name, descriptor) in self.registry.iter() {
            let pass = descriptor
                .factory
                .build(
                    accelerator_spec,
                    &descriptor.fixed_config,
                    descriptor.disable_search,
                )
                .map_err(ForgeError::Fatal)?;

            if self.strategy.is_none() && !pass.search_space().is_empty() {
                return Err(ConfigError::SearchSpaceWithoutStrategy { pass: name.clone() }.into());
            }

            self.passes.push(PassItem {
                name: name.clone(),
                pass,
                host: descriptor.host.clone(),
                evaluator: descriptor.evaluator.clone(),
                output_name: descriptor.output_name.clone(),
            });
        }
        debug!(
            "materialized {} passes for {accelerator_spec}",
            self.passes.len()
        );
        Ok(())
    }

    /// Ordered `(pass name, search space)` pairs for the current
    /// accelerator.
    pub(crate) fn pass_search_spaces(
        &self,
    ) -> Vec<(String, passforge_pass_api::SearchSpace)> {
        self.passes
            .iter()
            .map(|item| (item.name.clone(), item.pass.search_space().clone()))
            .collect()
    }

    pub(crate) fn footprint_mut(&mut self, accelerator_spec: &AcceleratorSpec) -> &mut Footprint {
        self.footprints
            .entry(accelerator_spec.clone())
            .or_default()
    }

    pub(crate) fn pass_item(&self, pass_name: &str) -> Option<&PassItem> {
        self.passes.iter().find(|item| item.name == pass_name)
    }

    /// The host a pass runs on: its own, else the engine default.
    pub(crate) fn host_for_pass(&self, item: &PassItem) -> Arc<dyn System> {
        item.host.clone().unwrap_or_else(|| self.host.clone())
    }

    /// The evaluator bound to a pass: its own, else the engine default.
    pub(crate) fn evaluator_for_pass(&self, pass_name: &str) -> Option<EvaluatorConfig> {
        self.pass_item(pass_name)
            .and_then(|item| item.evaluator.clone())
            .or_else(|| self.evaluator_config.clone())
    }

    /// Materialize a remote model resource into the cache so a local-like
    /// system can read it off the filesystem.
    pub(crate) fn prepare_local_model(&self, model: &ModelSpec) -> anyhow::Result<ModelSpec> {
        if !model.needs_materialization() {
            debug!("model path is absent, local, or a name; no materialization needed");
            return Ok(model.clone());
        }
        let Some(ResourcePath::Remote(remote)) = model.model_resource_path() else {
            return Ok(model.clone());
        };
        let fetcher = self
            .fetcher
            .as_ref()
            .context("model resource is remote but no resource fetcher is wired")?;
        debug!("downloading remote model resource into the cache");
        let local = fetcher.fetch(remote, self.cache.resources_dir())?;
        let mut rehomed = model.clone();
        rehomed.set_local_model_path(local);
        Ok(rehomed)
    }
}

/// Builder for [`Engine`].
///
/// Host and target default to a bare [`LocalSystem`]; the clock defaults to
/// the system clock. The search strategy resolves in precedence order:
/// explicit strategy, then `config.search_strategy`, else search is
/// disabled and the engine runs single-shot pipelines.
pub struct EngineBuilder {
    config: EngineConfig,
    host: Option<Arc<dyn System>>,
    target: Option<Arc<dyn System>>,
    evaluator: Option<EvaluatorConfig>,
    strategy: Option<Box<dyn SearchStrategy>>,
    clock: Option<Arc<dyn Clock>>,
    fetcher: Option<Arc<dyn ResourceFetcher>>,
    packager: Option<Arc<dyn Packager>>,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            host: None,
            target: None,
            evaluator: None,
            strategy: None,
            clock: None,
            fetcher: None,
            packager: None,
        }
    }

    #[must_use]
    pub fn host(mut self, host: Arc<dyn System>) -> Self {
        self.host = Some(host);
        self
    }

    #[must_use]
    pub fn target(mut self, target: Arc<dyn System>) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn evaluator(mut self, evaluator: EvaluatorConfig) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: Box<dyn SearchStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn resource_fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    #[must_use]
    pub fn packager(mut self, packager: Arc<dyn Packager>) -> Self {
        self.packager = Some(packager);
        self
    }

    /// Resolve accelerators, open the cache, and assemble the engine.
    pub fn build(self) -> ForgeResult<Engine> {
        let host = self.host.unwrap_or_else(|| Arc::new(LocalSystem::new()));
        let target = self.target.unwrap_or_else(|| Arc::new(LocalSystem::new()));

        let strategy = match self.strategy {
            Some(strategy) => Some(strategy),
            None => self
                .config
                .search_strategy
                .as_ref()
                .map(|cfg| cfg.create_strategy()),
        };

        let evaluator_config = self.evaluator.or_else(|| self.config.evaluator.clone());

        let execution_providers = match &self.config.execution_providers {
            Some(providers) => providers.clone(),
            None if target.system_kind().is_remote() => {
                return Err(ConfigError::RemoteProvidersRequired.into());
            }
            None if target.system_kind().is_local_like() => {
                target.supported_execution_providers()
            }
            None => vec![CPU_EXECUTION_PROVIDER.to_string()],
        };

        let devices = target.accelerators().unwrap_or_else(|| {
            warn!("no accelerators declared for target system, using CPU");
            vec!["cpu".to_string()]
        });

        let accelerator_specs = resolve_accelerator_specs(&devices, &execution_providers)?;

        let cache = Cache::new(self.config.cache_dir.clone()).map_err(ForgeError::Fatal)?;

        Ok(Engine {
            cache,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            host,
            target,
            evaluator_config,
            strategy,
            fetcher: self.fetcher,
            packager: self.packager,
            accelerator_specs,
            registry: PassRegistry::default(),
            passes: Vec::new(),
            footprints: IndexMap::new(),
            config: self.config,
            initialized: false,
        })
    }
}
