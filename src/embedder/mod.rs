/// Embedder trait and its implementations.
///
/// - [`openai::OpenAiEmbedder`] calls a hosted OpenAI-compatible endpoint.
/// - [`hash::HashEmbedder`] is a deterministic offline embedder.
pub mod hash;
pub mod openai;

use crate::error::Result;

/// Trait for text embedding implementations.
///
/// Implementations must return one vector per input, and identical text
/// must map to an identical vector.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.embed_batch(&[text])?;
        out.pop()
            .ok_or_else(|| crate::error::RagError::service("embedder returned no vectors"))
    }

    /// Embed multiple text strings into vectors, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}

/// L2-normalize a vector in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize(vec: &mut [f32]) {
    let norm_sq: f32 = vec.iter().map(|v| v * v).sum();
    if norm_sq > 0.0 {
        let inv = 1.0 / norm_sq.sqrt();
        for v in vec {
            *v *= inv;
        }
    }
}
