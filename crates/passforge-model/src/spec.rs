use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::ResourcePath;

/// Opaque description of a model artifact.
///
/// The engine holds these by value, hashes their serialized form for
/// identity, and hands them to hosts and evaluators. `config` carries
/// whatever the concrete model type needs; the engine never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub model_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<ResourcePath>,
}

impl ModelSpec {
    #[must_use]
    pub fn new(model_type: impl Into<String>, config: serde_json::Value) -> Self {
        Self {
            model_type: model_type.into(),
            config,
            model_path: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: ResourcePath) -> Self {
        self.model_path = Some(path);
        self
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).context("Failed to serialize model spec")
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone()).context("Failed to deserialize model spec")
    }

    #[must_use]
    pub const fn model_resource_path(&self) -> Option<&ResourcePath> {
        self.model_path.as_ref()
    }

    /// Re-home the model onto a local path after its resource has been
    /// materialized into the cache.
    pub fn set_local_model_path(&mut self, path: Utf8PathBuf) {
        self.model_path = Some(ResourcePath::Local(path));
    }

    /// Whether the artifact must be downloaded before a local host can use
    /// it. Path-less, local, and name-addressed models need no
    /// materialization.
    #[must_use]
    pub fn needs_materialization(&self) -> bool {
        match &self.model_path {
            None => false,
            Some(path) => !path.is_local() && !path.is_string_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_all_fields() {
        let spec = ModelSpec::new("onnx", json!({"opset": 17}))
            .with_path(ResourcePath::Local(Utf8PathBuf::from("/models/base.onnx")));

        let json = spec.to_json().unwrap();
        let back = ModelSpec::from_json(&json).unwrap();

        assert_eq!(back, spec);
    }

    #[test]
    fn pathless_model_needs_no_materialization() {
        let spec = ModelSpec::new("onnx", json!({}));
        assert!(!spec.needs_materialization());
    }

    #[test]
    fn remote_model_needs_materialization_until_rehomed() {
        let mut spec = ModelSpec::new("onnx", json!({}))
            .with_path(ResourcePath::Remote("https://models.example/m".to_string()));
        assert!(spec.needs_materialization());

        spec.set_local_model_path(Utf8PathBuf::from("/cache/resources/m"));

        assert!(!spec.needs_materialization());
        assert!(spec.model_resource_path().unwrap().is_local());
    }

    #[test]
    fn name_addressed_model_needs_no_materialization() {
        let spec = ModelSpec::new("hub", json!({}))
            .with_path(ResourcePath::Name("resnet50".to_string()));
        assert!(!spec.needs_materialization());
    }
}
