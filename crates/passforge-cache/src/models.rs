//! Model sidecar storage and output materialization

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::{debug, error};

use passforge_model::{Model, ModelSpec, ResourcePath};
use passforge_utils::atomic_write::write_file_atomic;
use passforge_utils::json::to_string_pretty4;
use passforge_utils::paths::ensure_dir_all;

use crate::Cache;

impl Cache {
    /// `models/<ModelId>.json`
    #[must_use]
    pub fn model_sidecar_path(&self, model_id: &str) -> Utf8PathBuf {
        self.models_dir().join(format!("{model_id}.json"))
    }

    /// `models/<ModelId>/output_model` — where a pass roots its artifact.
    #[must_use]
    pub fn model_output_dir(&self, model_id: &str) -> Utf8PathBuf {
        self.models_dir().join(model_id).join("output_model")
    }

    /// Write a model sidecar. Pruned models encode as `{}`.
    ///
    /// Failures are logged and swallowed: a missing sidecar only costs a
    /// recomputation on the next run.
    pub fn cache_model(&self, model: &Model, model_id: &str) {
        let result = model
            .sidecar_json()
            .and_then(|json| to_string_pretty4(&json))
            .and_then(|rendered| write_file_atomic(&self.model_sidecar_path(model_id), &rendered));
        if let Err(e) = result {
            error!("failed to cache model {model_id}: {e:#}");
        }
    }

    /// Read a model back from its sidecar.
    ///
    /// Returns `None` on any read or parse failure (logged, never raised),
    /// which callers treat as a cache miss.
    #[must_use]
    pub fn load_model(&self, model_id: &str) -> Option<Model> {
        let path = self.model_sidecar_path(model_id);
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no cached sidecar for {model_id}");
                return None;
            }
            Err(e) => {
                error!("failed to load model {model_id}: {e}");
                return None;
            }
        };
        let json: serde_json::Value = match serde_json::from_str(&content) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to parse model sidecar {model_id}: {e}");
                return None;
            }
        };
        match Model::from_sidecar_json(&json) {
            Ok(model) => Some(model),
            Err(e) => {
                error!("failed to rehydrate model {model_id}: {e:#}");
                None
            }
        }
    }

    /// Materialize a cached model into `output_dir` as `<output_name>.json`
    /// plus, when the artifact lives inside this cache, a copied
    /// `<output_name>/` directory. The returned sidecar JSON carries the
    /// rewritten local path.
    pub fn save_output_model(
        &self,
        model_id: &str,
        output_dir: &Utf8Path,
        output_name: &str,
        overwrite: bool,
    ) -> Result<serde_json::Value> {
        let model = self
            .load_model(model_id)
            .with_context(|| format!("Model {model_id} is not in the cache"))?;
        let Model::Real(mut spec) = model else {
            bail!("Model {model_id} was pruned; nothing to save");
        };

        ensure_dir_all(output_dir)
            .with_context(|| format!("Failed to create output dir: {output_dir}"))?;

        let sidecar_dest = output_dir.join(format!("{output_name}.json"));
        let artifact_dest = output_dir.join(output_name);
        if !overwrite && (sidecar_dest.exists() || artifact_dest.exists()) {
            bail!("Output {output_name} already exists in {output_dir}");
        }

        if let Some(ResourcePath::Local(artifact_path)) = spec.model_resource_path().cloned()
            && artifact_path.starts_with(self.models_dir())
            && artifact_path.exists()
        {
            if artifact_dest.exists() {
                fs::remove_dir_all(artifact_dest.as_std_path())
                    .with_context(|| format!("Failed to replace output dir: {artifact_dest}"))?;
            }
            copy_dir_all(&artifact_path, &artifact_dest)?;
            spec.set_local_model_path(artifact_dest.clone());
            debug!("copied model artifact to {artifact_dest}");
        }

        let sidecar_json = spec.to_json()?;
        write_file_atomic(&sidecar_dest, &to_string_pretty4(&sidecar_json)?)
            .with_context(|| format!("Failed to write output sidecar: {sidecar_dest}"))?;

        Ok(sidecar_json)
    }
}

fn copy_dir_all(src: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    ensure_dir_all(dest).with_context(|| format!("Failed to create directory: {dest}"))?;
    for entry in fs::read_dir(src.as_std_path())
        .with_context(|| format!("Failed to list directory: {src}"))?
    {
        let entry = entry?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|_| anyhow::anyhow!("Non-UTF-8 file name under {src}"))?;
        let src_path = src.join(&name);
        let dest_path = dest.join(&name);
        if entry.file_type()?.is_dir() {
            copy_dir_all(&src_path, &dest_path)?;
        } else {
            fs::copy(src_path.as_std_path(), dest_path.as_std_path())
                .with_context(|| format!("Failed to copy {src_path}"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn temp_cache() -> (TempDir, Cache) {
        let dir = TempDir::new().unwrap();
        let cache_dir = Utf8PathBuf::try_from(dir.path().join("cache")).unwrap();
        let cache = Cache::new(cache_dir).unwrap();
        (dir, cache)
    }

    #[test]
    fn model_round_trips_through_the_sidecar() {
        let (_dir, cache) = temp_cache();
        let model = Model::Real(ModelSpec::new("onnx", json!({"opset": 17})));

        cache.cache_model(&model, "0_Opt-abc-deadbeef");
        let loaded = cache.load_model("0_Opt-abc-deadbeef").unwrap();

        assert_eq!(loaded, model);
    }

    #[test]
    fn pruned_round_trips_through_the_empty_object() {
        let (_dir, cache) = temp_cache();

        cache.cache_model(&Model::Pruned, "1_Opt-abc-deadbeef");

        let raw =
            fs::read_to_string(cache.model_sidecar_path("1_Opt-abc-deadbeef").as_std_path())
                .unwrap();
        assert_eq!(raw.trim(), "{}");

        let loaded = cache.load_model("1_Opt-abc-deadbeef").unwrap();
        assert!(loaded.is_pruned());
    }

    #[test]
    fn missing_sidecar_is_a_miss_not_an_error() {
        let (_dir, cache) = temp_cache();
        assert!(cache.load_model("does-not-exist").is_none());
    }

    #[test]
    fn corrupted_sidecar_is_a_miss() {
        let (_dir, cache) = temp_cache();
        fs::write(
            cache.model_sidecar_path("0_Opt-a-b").as_std_path(),
            "{ not json",
        )
        .unwrap();

        assert!(cache.load_model("0_Opt-a-b").is_none());
    }

    #[test]
    fn save_output_model_copies_artifact_and_rewrites_path() {
        let (dir, cache) = temp_cache();
        let model_id = "0_Opt-abc-deadbeef";

        let artifact_dir = cache.model_output_dir(model_id);
        ensure_dir_all(&artifact_dir).unwrap();
        fs::write(artifact_dir.join("weights.bin").as_std_path(), b"binary").unwrap();

        let mut spec = ModelSpec::new("onnx", json!({}));
        spec.set_local_model_path(artifact_dir.clone());
        cache.cache_model(&Model::Real(spec), model_id);

        let output_dir = Utf8PathBuf::try_from(dir.path().join("out")).unwrap();
        let sidecar = cache
            .save_output_model(model_id, &output_dir, "CPU-CPUExecutionProvider_model", true)
            .unwrap();

        let copied = output_dir.join("CPU-CPUExecutionProvider_model/weights.bin");
        assert!(copied.exists());
        assert!(
            output_dir
                .join("CPU-CPUExecutionProvider_model.json")
                .exists()
        );
        assert_eq!(
            sidecar["model_path"]["value"],
            json!(output_dir.join("CPU-CPUExecutionProvider_model").as_str())
        );
    }

    #[test]
    fn save_output_model_refuses_pruned_models() {
        let (dir, cache) = temp_cache();
        cache.cache_model(&Model::Pruned, "0_Opt-a-b");

        let output_dir = Utf8PathBuf::try_from(dir.path().join("out")).unwrap();
        let err = cache
            .save_output_model("0_Opt-a-b", &output_dir, "final_model", true)
            .unwrap_err();

        assert!(err.to_string().contains("pruned"));
    }
}
