/// Mock embedder for testing purposes.
///
/// Builds a bag-of-words vector: every word contributes a pseudo-random
/// direction seeded from its hash, so texts sharing vocabulary land
/// closer together than unrelated ones. No backend required.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError};

pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for word in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            let mut state = hasher.finish();

            // LCG stream per word, mapped into [-1, 1)
            for slot in embedding.iter_mut() {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                *slot += ((state >> 40) as f32 / 8_388_608.0) - 1.0;
            }
        }

        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut embedding {
                *v *= inv;
            }
        } else if let Some(first) = embedding.first_mut() {
            // Empty text still yields a valid unit vector
            *first = 1.0;
        }

        Ok(embedding)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_mock_embed_dimensions() {
        let embedder = MockEmbedder::new(256);
        assert_eq!(embedder.embed("rigidbody physics").unwrap().len(), 256);
        assert_eq!(embedder.dimensions(), 256);
    }

    #[test]
    fn test_mock_embed_deterministic() {
        let embedder = MockEmbedder::new(256);
        assert_eq!(
            embedder.embed("AddForce applies a force").unwrap(),
            embedder.embed("AddForce applies a force").unwrap(),
        );
    }

    #[test]
    fn test_mock_embed_is_unit_length() {
        let embedder = MockEmbedder::new(256);
        for text in ["rigidbody", "collision detection modes", ""] {
            let v = embedder.embed(text).unwrap();
            let norm = dot(&v, &v).sqrt();
            assert!((norm - 1.0).abs() < 0.01, "norm for {text:?} was {norm}");
        }
    }

    #[test]
    fn test_mock_embed_shared_words_are_closer() {
        let embedder = MockEmbedder::new(256);
        let a = embedder.embed("rigidbody physics").unwrap();
        let b = embedder.embed("physics engine").unwrap();
        let c = embedder.embed("audio mixer").unwrap();
        assert!(
            dot(&a, &b) > dot(&a, &c),
            "overlapping vocabulary should score higher"
        );
    }

    #[test]
    fn test_mock_embed_case_insensitive_words() {
        let embedder = MockEmbedder::new(256);
        assert_eq!(
            embedder.embed("Rigidbody").unwrap(),
            embedder.embed("rigidbody").unwrap(),
        );
    }

    #[test]
    fn test_mock_embed_batch() {
        let embedder = MockEmbedder::new(64);
        let results = embedder
            .embed_batch(&["velocity", "angular velocity"])
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], embedder.embed("velocity").unwrap());
    }
}
