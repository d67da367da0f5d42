/// Runtime configuration: paths, chunking knobs, and the embedding backend.
///
/// Loaded from a JSON file with per-field defaults, so a partial or even
/// absent file still produces a working setup.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_db_path() -> String {
    "./data/unity_docs.db".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_search_top_k() -> usize {
    5
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_dimensions() -> usize {
    768
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory holding downloaded documentation and the version marker.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters of word-boundary overlap carried between adjacent chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default = "default_search_top_k")]
    pub search_top_k: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_check: Option<bool>,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Ollama,
    Mock,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: EmbeddingProvider,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

fn default_provider() -> EmbeddingProvider {
    EmbeddingProvider::Ollama
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_path: default_db_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            search_top_k: default_search_top_k(),
            update_check: None,
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            model: default_model(),
            dimensions: default_dimensions(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Whether documentation version checking is enabled (defaults to `true`).
    #[must_use]
    pub fn is_update_check_enabled(&self) -> bool {
        self.update_check.unwrap_or(true)
    }

    /// Directory the downloaded documentation tree is extracted into.
    #[must_use]
    pub fn download_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join("unity_documentation")
    }

    /// Load configuration from a JSON file, filling omitted fields with
    /// defaults. An empty `config_path` means `"config.json"`; a missing
    /// default file is written out as a template.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("No {path}, running with defaults");
            let cfg = Self::default();

            // Only the default path gets a template written for it
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Wrote config template to {path}"),
                    Err(e) => warn!("Could not write config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Ignoring malformed config {path}: {e}");
                return Ok(Self::default());
            }
        };

        info!("Configuration loaded from {path}");
        Ok(cfg)
    }

    /// Write the configuration out as pretty-printed JSON.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("config serialization failed")?;
        std::fs::write(path, data).with_context(|| format!("cannot write config file {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.chunk_size > 0, "chunk_size must be positive");
        anyhow::ensure!(
            self.chunk_overlap * 2 < self.chunk_size,
            "chunk_overlap must be less than half of chunk_size"
        );
        anyhow::ensure!(self.search_top_k > 0, "search_top_k must be positive");
        anyhow::ensure!(
            self.embedding.dimensions > 0,
            "embedding.dimensions must be positive"
        );
        anyhow::ensure!(!self.data_dir.is_empty(), "data_dir must not be empty");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
