//! Embedding via a local Ollama server.
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::{Embedder, EmbedderError};

/// Embedder backed by the Ollama HTTP API.
pub struct OllamaEmbedder {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub fn new(base_url: String, model: String, dimensions: usize) -> Self {
        // reqwest's blocking client must be built off any tokio runtime
        // thread, or its internal shell runtime panics when dropped in an
        // async context
        let client = std::thread::spawn(|| {
            reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default()
        })
        .join()
        .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimensions,
        }
    }
}

impl Embedder for OllamaEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "prompt": text }))
            .send()
            .map_err(|e| EmbedderError::BackendUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EmbedderError::InferenceFailed(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .map_err(|e| EmbedderError::InferenceFailed(e.to_string()))?;

        if body.embedding.len() != self.dimensions {
            return Err(EmbedderError::DimensionMismatch {
                expected: self.dimensions,
                actual: body.embedding.len(),
            });
        }

        Ok(body.embedding)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        // The embeddings endpoint takes one prompt per request
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
