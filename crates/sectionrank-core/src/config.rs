use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Directory name of the default embedding model
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Local directory holding the embedding model files
    pub model_dir: PathBuf,
    /// Pipeline settings file (JSON)
    pub settings_file: PathBuf,
}

impl Config {
    /// Load configuration or use defaults
    pub fn load_or_default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sectionrank");

        let model_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sectionrank")
            .join("models")
            .join(DEFAULT_MODEL_NAME);

        Self {
            model_dir,
            settings_file: data_dir.join("settings.json"),
        }
    }
}

/// Tunables for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of sections in the final output (N_final)
    pub top_n: usize,
    /// Candidate pool taken from the ranking before dedup (N_pool)
    pub pool_size: usize,
    /// Texts per inference call
    pub batch_size: usize,
    /// Inference batches allowed in flight at once
    pub workers: usize,
    /// Tokens kept per page before truncation
    pub max_tokens: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            top_n: 5,
            pool_size: 10,
            batch_size: 16,
            workers: default_workers(),
            max_tokens: 256,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read settings {:?}: {}", path, e);
                }
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Invalid settings file {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }

    /// Check the settings can produce a result.
    ///
    /// A pool smaller than the final slate is raised to `top_n`.
    pub fn validate(mut self) -> PipelineResult<Self> {
        if self.top_n == 0 {
            return Err(PipelineError::InvalidSettings(
                "top_n must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidSettings(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(PipelineError::InvalidSettings(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.pool_size < self.top_n {
            tracing::warn!(
                pool_size = self.pool_size,
                top_n = self.top_n,
                "Candidate pool smaller than output size, raising pool to top_n"
            );
            self.pool_size = self.top_n;
        }
        Ok(self)
    }
}
