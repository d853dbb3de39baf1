//! Shared fixtures for engine integration tests
//!
//! A configurable stub pass that merges its search point into the model
//! config, a table-driven evaluator keyed off that config, and helpers to
//! assemble an engine against a temp cache.

// Not every test binary uses every fixture.
#![allow(dead_code)]

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use tempfile::TempDir;

use passforge::{
    AcceleratorSpec, EvaluatorConfig, Goal, Metric, MetricResult, MetricValue, ModelEvaluator,
    ModelSpec, Pass, PassFactory, PassRunError, SearchPoint, SearchSpace, SubMetric,
};

/// A pass that carries its configuration into the output model config.
///
/// The produced model's config is the input config merged with the chosen
/// search point, so evaluators can score models by what was applied to
/// them. Host invocations are counted through the shared counter.
pub struct StubPass {
    type_name: String,
    space: SearchSpace,
    fixed_config: Value,
    fail_on: Option<(String, Value)>,
    invocations: Arc<AtomicUsize>,
}

impl Pass for StubPass {
    fn name(&self) -> &str {
        &self.type_name
    }

    fn search_space(&self) -> &SearchSpace {
        &self.space
    }

    fn config_at_search_point(&self, point: &SearchPoint) -> Value {
        let mut config = self
            .fixed_config
            .as_object()
            .cloned()
            .unwrap_or_default();
        for (param, value) in point {
            config.insert(param.clone(), value.clone());
        }
        Value::Object(config)
    }

    fn run(
        &self,
        input: &ModelSpec,
        output_path: &Utf8Path,
        point: &SearchPoint,
    ) -> Result<ModelSpec, PassRunError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);

        if let Some((param, bad_value)) = &self.fail_on
            && point.get(param) == Some(bad_value)
        {
            return Err(PassRunError::Execution(format!(
                "{} cannot handle {param}={bad_value}",
                self.type_name
            )));
        }

        fs::create_dir_all(output_path.as_std_path())
            .map_err(|e| PassRunError::Other(e.into()))?;
        fs::write(output_path.join("model.bin").as_std_path(), b"artifact")
            .map_err(|e| PassRunError::Other(e.into()))?;

        let mut config = input.config.as_object().cloned().unwrap_or_default();
        if let Value::Object(applied) = self.config_at_search_point(point) {
            config.extend(applied);
        }

        let mut produced = ModelSpec::new("onnx", Value::Object(config));
        produced.set_local_model_path(output_path.to_owned());
        Ok(produced)
    }
}

/// Factory for [`StubPass`] instances.
pub struct StubPassFactory {
    type_name: String,
    space: SearchSpace,
    fail_on: Option<(String, Value)>,
    invocations: Arc<AtomicUsize>,
}

impl StubPassFactory {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            space: SearchSpace::new(),
            fail_on: None,
            invocations: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_space(mut self, param: &str, choices: Vec<Value>) -> Self {
        self.space.insert(param, choices);
        self
    }

    /// Raise a pass-execution failure whenever `param` is chosen as `value`.
    pub fn failing_on(mut self, param: &str, value: Value) -> Self {
        self.fail_on = Some((param.to_string(), value));
        self
    }

    /// Shared host-invocation counter for cache-reuse assertions.
    pub fn invocations(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.invocations)
    }
}

impl PassFactory for StubPassFactory {
    fn pass_type_name(&self) -> &str {
        &self.type_name
    }

    fn build(
        &self,
        _accelerator_spec: &AcceleratorSpec,
        fixed_config: &Value,
        disable_search: bool,
    ) -> Result<Box<dyn Pass>> {
        let space = if disable_search {
            SearchSpace::new()
        } else {
            self.space.clone()
        };
        Ok(Box::new(StubPass {
            type_name: self.type_name.clone(),
            space,
            fixed_config: fixed_config.clone(),
            fail_on: self.fail_on.clone(),
            invocations: Arc::clone(&self.invocations),
        }))
    }
}

/// Evaluator that scores a model by a closure over its config.
pub struct ConfigEvaluator {
    score: Box<dyn Fn(&Value) -> MetricResult + Send + Sync>,
    calls: Arc<AtomicUsize>,
}

impl ConfigEvaluator {
    pub fn new(score: impl Fn(&Value) -> MetricResult + Send + Sync + 'static) -> Self {
        Self {
            score: Box::new(score),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ModelEvaluator for ConfigEvaluator {
    fn evaluate(
        &self,
        model: &ModelSpec,
        _metrics: &[Metric],
        _accelerator_spec: &AcceleratorSpec,
    ) -> Result<MetricResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.score)(&model.config))
    }
}

/// `accuracy` metric with one prioritized `top1` sub-metric.
pub fn accuracy_metric(goal: Option<Goal>) -> Metric {
    Metric::new(
        "accuracy",
        vec![SubMetric {
            name: "top1".to_string(),
            priority: 1,
            higher_is_better: true,
            goal,
        }],
    )
}

/// `latency-avg` (priority 1, lower is better) plus `accuracy-top1`
/// (priority 2, higher is better).
pub fn latency_then_accuracy_metrics() -> Vec<Metric> {
    vec![
        Metric::new(
            "latency",
            vec![SubMetric {
                name: "avg".to_string(),
                priority: 1,
                higher_is_better: false,
                goal: None,
            }],
        ),
        Metric::new(
            "accuracy",
            vec![SubMetric {
                name: "top1".to_string(),
                priority: 2,
                higher_is_better: true,
                goal: None,
            }],
        ),
    ]
}

pub fn single_accuracy_signal(value: f64) -> MetricResult {
    let mut signal = MetricResult::new();
    signal.insert(
        "accuracy-top1",
        MetricValue {
            value,
            priority: 1,
            higher_is_better: true,
        },
    );
    signal
}

pub fn evaluator_config(metrics: Vec<Metric>) -> EvaluatorConfig {
    EvaluatorConfig::new(metrics)
}

/// Fresh input model; its config is an empty object so applied pass
/// settings are easy to spot downstream.
pub fn input_model() -> ModelSpec {
    ModelSpec::new("onnx", json!({}))
}

/// Temp workspace: `(guard, cache_dir, output_dir)`.
pub fn temp_dirs() -> (TempDir, Utf8PathBuf, Utf8PathBuf) {
    let dir = TempDir::new().unwrap();
    let cache_dir = Utf8PathBuf::try_from(dir.path().join("cache")).unwrap();
    let output_dir = Utf8PathBuf::try_from(dir.path().join("out")).unwrap();
    (dir, cache_dir, output_dir)
}

pub const CPU_SPEC_STR: &str = "CPU-CPUExecutionProvider";
