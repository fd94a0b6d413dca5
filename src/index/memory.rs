use super::{VectorIndex, check_batch, cosine_distance};
use crate::document::{Chunk, ScoredChunk};
use crate::error::{RagError, Result};

/// Brute-force in-memory index.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: Vec<(Chunk, Vec<f32>)>,
    dimension: Option<usize>,
}

impl MemoryIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorIndex for MemoryIndex {
    fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        self.dimension = check_batch(&chunks, &vectors, self.dimension)?;
        self.entries.extend(chunks.into_iter().zip(vectors));
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        match self.dimension {
            Some(d) if d != vector.len() => {
                return Err(RagError::Index(format!(
                    "query has {} dimensions, index expects {d}",
                    vector.len()
                )));
            }
            _ => {}
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, v))| (i, cosine_distance(vector, v)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .take(k.min(self.entries.len()))
            .map(|(i, distance)| ScoredChunk {
                chunk: self.entries[i].0.clone(),
                distance,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
