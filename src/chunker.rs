//! Fixed-size overlapping character windows.
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

pub const DEFAULT_WINDOW: usize = 1000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Splits documents into windows of `window` chars whose starts advance by
/// `window - overlap` chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    window: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl Chunker {
    /// Fails when `overlap >= window`, which also rejects `window == 0`.
    pub fn new(window: usize, overlap: usize) -> Result<Self> {
        if overlap >= window {
            return Err(RagError::config(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size ({window})"
            )));
        }
        Ok(Self { window, overlap })
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn stride(&self) -> usize {
        self.window - self.overlap
    }

    /// Lazily iterate the chunks of `doc`. Calling this again restarts.
    #[must_use]
    pub fn chunks<'a>(&self, doc: &'a Document) -> Chunks<'a> {
        Chunks {
            doc,
            boundaries: char_boundaries(&doc.content),
            chunker: *self,
            next_start: 0,
            position: 0,
            done: doc.content.is_empty(),
        }
    }

    /// Chunk every document, preserving document order.
    #[must_use]
    pub fn split_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|d| self.chunks(d)).collect()
    }
}

/// Byte offset of every char start, plus the end of the string.
fn char_boundaries(s: &str) -> Vec<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .collect()
}

/// Iterator over one document's chunks.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    doc: &'a Document,
    boundaries: Vec<usize>,
    chunker: Chunker,
    next_start: usize,
    position: usize,
    done: bool,
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.done {
            return None;
        }

        let char_len = self.boundaries.len() - 1;
        let start = self.next_start;
        let end = (start + self.chunker.window).min(char_len);
        let content = &self.doc.content[self.boundaries[start]..self.boundaries[end]];

        if end == char_len {
            self.done = true;
        }
        self.next_start = start + self.chunker.stride();

        let chunk = Chunk {
            content: content.to_string(),
            metadata: self.doc.metadata.clone(),
            position: self.position,
            start,
        };
        self.position += 1;
        Some(chunk)
    }
}
