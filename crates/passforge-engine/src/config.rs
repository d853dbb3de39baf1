use camino::Utf8PathBuf;
use serde::{Deserialize, Deserializer};

use passforge_footprint::Footprint;
use passforge_metrics::MetricResult;
use passforge_pass_api::{EvaluatorConfig, PackagingConfig};
use passforge_search::SearchStrategyConfig;

/// Engine configuration, deserializable from a JSON document.
///
/// `search_strategy` accepts an object, `true` (defaults), or `false`/null
/// to disable search entirely.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache_dir: Utf8PathBuf,
    pub clean_cache: bool,
    pub clean_evaluation_cache: bool,
    #[serde(deserialize_with = "search_strategy_field")]
    pub search_strategy: Option<SearchStrategyConfig>,
    pub execution_providers: Option<Vec<String>>,
    pub evaluator: Option<EvaluatorConfig>,
    pub plot_pareto_frontier: bool,
    /// Opaque payload handed through to remote systems.
    pub remote_client_config: Option<serde_json::Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_dir: Utf8PathBuf::from(".passforge-cache"),
            clean_cache: false,
            clean_evaluation_cache: false,
            search_strategy: None,
            execution_providers: None,
            evaluator: None,
            plot_pareto_frontier: false,
            remote_client_config: None,
        }
    }
}

fn search_strategy_field<'de, D>(deserializer: D) -> Result<Option<SearchStrategyConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Toggle(bool),
        Config(SearchStrategyConfig),
    }

    Ok(match Option::<Field>::deserialize(deserializer)? {
        None | Some(Field::Toggle(false)) => None,
        Some(Field::Toggle(true)) => Some(SearchStrategyConfig::default()),
        Some(Field::Config(config)) => Some(config),
    })
}

/// Per-invocation inputs to [`crate::Engine::run`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub packaging_config: Option<PackagingConfig>,
    pub output_dir: Utf8PathBuf,
    pub output_name: Option<String>,
    pub evaluation_only: bool,
}

/// What one accelerator produced.
#[derive(Debug, Clone)]
pub enum RunOutput {
    /// Evaluation-only invocation: the input model's signal.
    Metrics(MetricResult),
    /// No-search pipeline: the saved output model sidecar plus its signal,
    /// when an evaluator was configured.
    NoSearch {
        model: serde_json::Value,
        metrics: Option<MetricResult>,
    },
    /// Search run: the (possibly top-K reduced) Pareto frontier.
    Search(Footprint),
}

/// Output filename prefix for one accelerator.
#[must_use]
pub(crate) fn output_prefix(
    output_name: Option<&str>,
    accelerator_spec: &passforge_hardware::AcceleratorSpec,
) -> String {
    match output_name {
        Some(name) => format!("{name}_{accelerator_spec}_"),
        None => format!("{accelerator_spec}_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_search() {
        let config = EngineConfig::default();
        assert!(config.search_strategy.is_none());
        assert!(!config.clean_cache);
    }

    #[test]
    fn search_strategy_false_disables_search() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"search_strategy": false}"#).unwrap();
        assert!(config.search_strategy.is_none());
    }

    #[test]
    fn search_strategy_true_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"search_strategy": true}"#).unwrap();
        assert_eq!(config.search_strategy, Some(SearchStrategyConfig::default()));
    }

    #[test]
    fn search_strategy_object_is_parsed() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"search_strategy": {"output_model_num": 3, "max_iter_num": 10}}"#,
        )
        .unwrap();
        let strategy = config.search_strategy.unwrap();
        assert_eq!(strategy.output_model_num, Some(3));
        assert_eq!(strategy.max_iter_num, Some(10));
    }

    #[test]
    fn prefix_includes_output_name_when_set() {
        use passforge_hardware::{AcceleratorSpec, Device};
        let spec = AcceleratorSpec::new(Device::Cpu, "CPUExecutionProvider");
        assert_eq!(
            output_prefix(Some("final"), &spec),
            "final_CPU-CPUExecutionProvider_"
        );
        assert_eq!(output_prefix(None, &spec), "CPU-CPUExecutionProvider_");
    }
}
