/// Offline embedder based on feature hashing.
///
/// Each lower-cased alphanumeric token is hashed into one of `dimensions`
/// buckets with a hash-derived sign, and the bucket counts are
/// L2-normalized. Texts sharing words land close together, which is enough
/// for tests and for `--embedder hash` runs without an API key.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, l2_normalize};
use crate::error::Result;

pub const DEFAULT_DIMENSIONS: usize = 384;

pub struct HashEmbedder {
    pub dimensions: usize,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let hash = hasher.finish();

            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        l2_normalize(&mut embedding);
        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl Embedder for HashEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
