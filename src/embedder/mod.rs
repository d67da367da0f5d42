//! Embedder trait and shared types for text embedding.

pub mod mock;
pub mod ollama;

use std::sync::Arc;

use thiserror::Error;

use crate::config::{Config, EmbeddingProvider};

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("embedding backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Embed multiple text strings into vectors.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// Build the embedder selected in the configuration.
pub fn from_config(config: &Config) -> Arc<dyn Embedder> {
    match config.embedding.provider {
        EmbeddingProvider::Ollama => Arc::new(ollama::OllamaEmbedder::new(
            config.embedding.base_url.clone(),
            config.embedding.model.clone(),
            config.embedding.dimensions,
        )),
        EmbeddingProvider::Mock => Arc::new(mock::MockEmbedder::new(config.embedding.dimensions)),
    }
}
