//! Pass-run records: the idempotence index of the cache
//!
//! One JSON file per executed `(pass, input, config, accelerator?)` tuple
//! mapping to the produced output model id. A hit here is what lets a warm
//! rerun skip the host entirely.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::error;

use passforge_hardware::AcceleratorSpec;
use passforge_utils::atomic_write::write_file_atomic;
use passforge_utils::hash;
use passforge_utils::json::to_string_pretty4;

use crate::Cache;

/// Body of a run record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub pass_name: String,
    pub pass_config: serde_json::Value,
    pub input_model_id: String,
    pub output_model_id: String,
}

impl Cache {
    /// `runs/<PassName>-<InputNumber>-<ConfigHash>[-<AcceleratorSpec>].json`
    ///
    /// Accelerator-agnostic passes pass `None` and share one record across
    /// accelerators.
    #[must_use]
    pub fn run_record_path(
        &self,
        pass_name: &str,
        input_model_id: &str,
        pass_config: &serde_json::Value,
        accelerator_spec: Option<&AcceleratorSpec>,
    ) -> Utf8PathBuf {
        let input_number = Self::input_number(input_model_id);
        let config_hash = hash::short_hash_json(pass_config).unwrap_or_default();
        let file_name = match accelerator_spec {
            Some(spec) => format!("{pass_name}-{input_number}-{config_hash}-{spec}.json"),
            None => format!("{pass_name}-{input_number}-{config_hash}.json"),
        };
        self.runs_dir.join(file_name)
    }

    /// Record a completed run. Failures are logged and swallowed.
    pub fn cache_run(
        &self,
        pass_name: &str,
        pass_config: &serde_json::Value,
        input_model_id: &str,
        output_model_id: &str,
        accelerator_spec: Option<&AcceleratorSpec>,
    ) {
        let record = RunRecord {
            pass_name: pass_name.to_string(),
            pass_config: pass_config.clone(),
            input_model_id: input_model_id.to_string(),
            output_model_id: output_model_id.to_string(),
        };
        let path = self.run_record_path(pass_name, input_model_id, pass_config, accelerator_spec);
        let result =
            to_string_pretty4(&record).and_then(|rendered| write_file_atomic(&path, &rendered));
        if let Err(e) = result {
            error!("failed to cache run {pass_name} for {input_model_id}: {e:#}");
        }
    }

    /// Look up a previous run. Any read or parse failure is a miss.
    #[must_use]
    pub fn lookup_run(
        &self,
        input_model_id: &str,
        pass_name: &str,
        pass_config: &serde_json::Value,
        accelerator_spec: Option<&AcceleratorSpec>,
    ) -> Option<String> {
        let path = self.run_record_path(pass_name, input_model_id, pass_config, accelerator_spec);
        if !path.exists() {
            return None;
        }
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(e) => {
                error!("failed to load run record {path}: {e}");
                return None;
            }
        };
        match serde_json::from_str::<RunRecord>(&content) {
            Ok(record) => Some(record.output_model_id),
            Err(e) => {
                error!("failed to parse run record {path}: {e}");
                None
            }
        }
    }
}
