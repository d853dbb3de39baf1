//! Content-addressed on-disk cache
//!
//! Layout rooted at a cache directory:
//!
//! ```text
//! cache_dir/
//!   models/       <ModelId>.json sidecars + <ModelId>/output_model/ artifacts
//!   runs/         <PassName>-<InputNumber>-<ConfigHash>[-<AcceleratorSpec>].json
//!   evaluations/  <ModelId-with-accelerator>.json
//!   resources/    materialized remote artifacts
//! ```
//!
//! Writers never raise: a failed cache write costs a recomputation on the
//! next run, nothing more. Readers degrade to a miss on any I/O or parse
//! error. The cache guarantees at-most-once production per
//! `(pass_name, input_number, config_hash, accelerator?)` within one
//! directory across runs.

mod evaluations;
mod models;
mod runs;

pub use runs::RunRecord;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::sync::Mutex;
use tracing::debug;

use passforge_utils::paths::{ensure_dir_all, recreate_dir};

/// Handle to one cache directory.
///
/// Exclusive to a single engine instance for the duration of a run; no
/// cross-process locking is provided.
#[derive(Debug)]
pub struct Cache {
    cache_dir: Utf8PathBuf,
    models_dir: Utf8PathBuf,
    runs_dir: Utf8PathBuf,
    evaluations_dir: Utf8PathBuf,
    resources_dir: Utf8PathBuf,
    // In-memory allocation floor; wins over the disk scan so numbers are
    // never reused within a process even after deletions.
    next_model_number: Mutex<u64>,
}

impl Cache {
    /// Open (and create if needed) the cache rooted at `cache_dir`.
    pub fn new(cache_dir: impl Into<Utf8PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        let cache = Self {
            models_dir: cache_dir.join("models"),
            runs_dir: cache_dir.join("runs"),
            evaluations_dir: cache_dir.join("evaluations"),
            resources_dir: cache_dir.join("resources"),
            cache_dir,
            next_model_number: Mutex::new(0),
        };
        cache.create_dirs()?;

        // Seed the allocation floor above anything already on disk. Output
        // directories without sidecars count too: a crashed run may have
        // created contents the sidecar never followed.
        let floor = cache.max_model_number_on_disk().map_or(0, |n| n + 1);
        *cache.next_model_number.lock().unwrap() = floor;

        Ok(cache)
    }

    fn create_dirs(&self) -> Result<()> {
        for dir in [
            &self.cache_dir,
            &self.models_dir,
            &self.runs_dir,
            &self.evaluations_dir,
            &self.resources_dir,
        ] {
            ensure_dir_all(dir).with_context(|| format!("Failed to create cache dir: {dir}"))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Utf8Path {
        &self.cache_dir
    }

    #[must_use]
    pub fn models_dir(&self) -> &Utf8Path {
        &self.models_dir
    }

    #[must_use]
    pub fn resources_dir(&self) -> &Utf8Path {
        &self.resources_dir
    }

    /// Remove the whole cache and recreate the directory skeleton.
    pub fn clean(&self) -> Result<()> {
        recreate_dir(&self.cache_dir).context("Failed to clean cache")?;
        self.create_dirs()
    }

    /// Drop all cached evaluations.
    pub fn clean_evaluations(&self) -> Result<()> {
        recreate_dir(&self.evaluations_dir).context("Failed to clean evaluation cache")
    }

    /// Drop all cached runs of one pass type along with the output models
    /// those runs produced.
    pub fn clean_pass_runs(&self, pass_type_name: &str) -> Result<()> {
        let prefix = format!("{pass_type_name}-");
        for entry in fs::read_dir(&self.runs_dir).context("Failed to list run cache")? {
            let entry = entry?;
            let Some(file_name) = entry.file_name().to_str().map(ToString::to_string) else {
                continue;
            };
            if !file_name.starts_with(&prefix) || !file_name.ends_with(".json") {
                continue;
            }

            // Remove the produced model before the run record so a crash in
            // between cannot leave a run pointing at a deleted model.
            if let Ok(content) = fs::read_to_string(entry.path())
                && let Ok(record) = serde_json::from_str::<RunRecord>(&content)
            {
                self.remove_model_entry(&record.output_model_id);
            }
            fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove run record: {file_name}"))?;
        }
        debug!("cleaned run cache for pass type {pass_type_name}");
        Ok(())
    }

    fn remove_model_entry(&self, model_id: &str) {
        let _ = fs::remove_file(self.model_sidecar_path(model_id));
        let _ = fs::remove_dir_all(self.models_dir.join(model_id));
    }

    /// Hand out a model number strictly greater than anything on disk.
    ///
    /// The directory is re-scanned on every call, so numbers taken by
    /// orphaned output directories (crashed runs without sidecars) are
    /// skipped. When the in-memory floor and the disk disagree, the floor
    /// wins; this keeps allocation monotonic within a process.
    pub fn allocate_model_number(&self) -> u64 {
        let mut counter = self.next_model_number.lock().unwrap();
        loop {
            let candidate = *counter;
            *counter += 1;
            if !self.model_number_taken(candidate) {
                return candidate;
            }
        }
    }

    fn model_number_taken(&self, number: u64) -> bool {
        let prefix = format!("{number}_");
        fs::read_dir(&self.models_dir).is_ok_and(|entries| {
            entries.filter_map(Result::ok).any(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with(&prefix))
            })
        })
    }

    fn max_model_number_on_disk(&self) -> Option<u64> {
        let entries = fs::read_dir(&self.models_dir).ok()?;
        entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                let stem = name.strip_suffix(".json").unwrap_or(name);
                let (number, _) = stem.split_once('_')?;
                number.parse::<u64>().ok()
            })
            .max()
    }

    /// Leading numeric token of a derived model id, or the whole id for
    /// input-model hashes.
    #[must_use]
    pub fn input_number(model_id: &str) -> &str {
        model_id.split('_').next().unwrap_or(model_id)
    }
}
