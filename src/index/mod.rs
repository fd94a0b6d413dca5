//! Nearest-neighbour retrieval over chunk embeddings.
//!
//! Both backends rank by cosine distance (`1 - cos θ`) and break ties by
//! insertion order.
pub mod memory;
pub mod sqlite;

use serde::{Deserialize, Serialize};

use crate::document::{Chunk, ScoredChunk};
use crate::error::{RagError, Result};

pub use memory::MemoryIndex;
pub use sqlite::SqliteIndex;

pub trait VectorIndex {
    /// Append `(chunk, vector)` pairs. Both slices must have the same length
    /// and every vector the index dimension (fixed by the first add).
    fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()>;

    /// The `k` chunks nearest to `vector`, closest first. `k` is clamped to
    /// the index size; an index with no chunks is [`RagError::EmptyIndex`].
    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which [`VectorIndex`] implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for IndexBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(RagError::config(format!(
                "unknown index backend {other:?} (expected memory or sqlite)"
            ))),
        }
    }
}

/// Build an empty index for `backend`.
pub fn open(backend: IndexBackend) -> Result<Box<dyn VectorIndex>> {
    Ok(match backend {
        IndexBackend::Memory => Box::new(MemoryIndex::new()),
        IndexBackend::Sqlite => Box::new(SqliteIndex::open_in_memory()?),
    })
}

/// Shared validation for `add`. Returns the dimension of the batch.
pub(crate) fn check_batch(
    chunks: &[Chunk],
    vectors: &[Vec<f32>],
    dimension: Option<usize>,
) -> Result<Option<usize>> {
    if chunks.len() != vectors.len() {
        return Err(RagError::Index(format!(
            "{} chunks but {} vectors",
            chunks.len(),
            vectors.len()
        )));
    }

    let mut dim = dimension;
    for v in vectors {
        match dim {
            Some(d) if d != v.len() => {
                return Err(RagError::Index(format!(
                    "vector has {} dimensions, index expects {d}",
                    v.len()
                )));
            }
            Some(_) => {}
            None if v.is_empty() => {
                return Err(RagError::Index("empty embedding vector".to_string()));
            }
            None => dim = Some(v.len()),
        }
    }
    Ok(dim)
}

/// Cosine distance in `[0, 2]`. A zero vector is orthogonal to everything.
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na.sqrt() * nb.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("SQLite".parse::<IndexBackend>().unwrap(), IndexBackend::Sqlite);
        assert_eq!("memory".parse::<IndexBackend>().unwrap(), IndexBackend::Memory);
        assert!("faiss".parse::<IndexBackend>().is_err());
    }

    #[test]
    fn test_backend_serde() {
        let b: IndexBackend = serde_json::from_str(r#""sqlite""#).unwrap();
        assert_eq!(b, IndexBackend::Sqlite);
    }
}
