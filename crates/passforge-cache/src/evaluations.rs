//! Evaluation signal cache

use serde::{Deserialize, Serialize};
use std::fs;
use tracing::error;

use camino::Utf8PathBuf;
use passforge_metrics::MetricResult;
use passforge_utils::atomic_write::write_file_atomic;
use passforge_utils::json::to_string_pretty4;

use crate::Cache;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EvaluationRecord {
    model_id: String,
    signal: MetricResult,
}

impl Cache {
    /// `evaluations/<ModelId-with-accelerator>.json`
    #[must_use]
    pub fn evaluation_record_path(&self, model_id: &str) -> Utf8PathBuf {
        self.evaluations_dir.join(format!("{model_id}.json"))
    }

    /// Record an evaluation signal. Failures are logged and swallowed.
    pub fn cache_evaluation(&self, model_id: &str, signal: &MetricResult) {
        let record = EvaluationRecord {
            model_id: model_id.to_string(),
            signal: signal.clone(),
        };
        let path = self.evaluation_record_path(model_id);
        let result =
            to_string_pretty4(&record).and_then(|rendered| write_file_atomic(&path, &rendered));
        if let Err(e) = result {
            error!("failed to cache evaluation for {model_id}: {e:#}");
        }
    }

    /// Load a cached evaluation signal. Any failure is a miss.
    #[must_use]
    pub fn load_evaluation(&self, model_id: &str) -> Option<MetricResult> {
        let path = self.evaluation_record_path(model_id);
        if !path.exists() {
            return None;
        }
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(e) => {
                error!("failed to load evaluation {path}: {e}");
                return None;
            }
        };
        match serde_json::from_str::<EvaluationRecord>(&content) {
            Ok(record) => Some(record.signal),
            Err(e) => {
                error!("failed to parse evaluation {path}: {e}");
                None
            }
        }
    }
}
