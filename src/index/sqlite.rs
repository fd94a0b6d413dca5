//! Vector index on an in-memory SQLite database with sqlite-vec.
use std::sync::Once;

use rusqlite::{Connection, params};
use sqlite_vec::sqlite3_vec_init;
use tracing::{debug, info};

use super::{VectorIndex, check_batch};
use crate::document::{Chunk, Metadata, ScoredChunk};
use crate::error::{RagError, Result};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    position INTEGER NOT NULL,
    start_offset INTEGER NOT NULL,
    content TEXT NOT NULL,
    metadata TEXT NOT NULL
);
"#;

// vec_distance_cosine yields NULL when either side is a zero vector; treat
// that as orthogonal, matching `cosine_distance`.
const SEARCH_SQL: &str = r#"
SELECT
    c.content,
    c.metadata,
    c.position,
    c.start_offset,
    COALESCE(vec_distance_cosine(v.embedding, ?), 1.0) AS distance
FROM vec_chunks v
JOIN chunks c ON v.rowid = c.id
ORDER BY distance ASC, c.id ASC
LIMIT ?
"#;

static INIT_VEC: Once = Once::new();

/// Initialize the sqlite-vec extension. Safe to call multiple times.
fn init_sqlite_vec() {
    INIT_VEC.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// Serialize a float32 vector into the little-endian blob vec0 expects.
pub fn serialize_vector(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// The `vec_chunks` table is created on the first `add`, once the
/// embedding width is known.
pub struct SqliteIndex {
    conn: Connection,
    dimension: Option<usize>,
    count: usize,
}

impl SqliteIndex {
    pub fn open_in_memory() -> Result<Self> {
        init_sqlite_vec();
        let conn = Connection::open_in_memory()?;

        let vec_version: String = conn.query_row("SELECT vec_version()", [], |row| row.get(0))?;
        info!("sqlite-vec version: {}", vec_version);

        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn,
            dimension: None,
            count: 0,
        })
    }

    fn ensure_vec_table(&self, dimension: usize) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS vec_chunks USING vec0(embedding FLOAT[{dimension}]);"
        ))?;
        Ok(())
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, i64, i64, f64)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

impl VectorIndex for SqliteIndex {
    fn add(&mut self, chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        let dimension = check_batch(&chunks, &vectors, self.dimension)?;
        let Some(dim) = dimension else {
            return Ok(());
        };
        self.ensure_vec_table(dim)?;
        self.dimension = Some(dim);

        let tx = self.conn.transaction()?;
        for (chunk, vector) in chunks.iter().zip(&vectors) {
            let metadata = serde_json::to_string(&chunk.metadata)
                .map_err(|e| RagError::Index(format!("metadata encode failed: {e}")))?;
            tx.execute(
                "INSERT INTO chunks (position, start_offset, content, metadata) VALUES (?, ?, ?, ?)",
                params![chunk.position as i64, chunk.start as i64, chunk.content, metadata],
            )?;
            let chunk_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO vec_chunks (rowid, embedding) VALUES (?, ?)",
                params![chunk_id, serialize_vector(vector)],
            )?;
        }
        tx.commit()?;

        self.count += chunks.len();
        debug!("Indexed {} chunks ({} total)", chunks.len(), self.count);
        Ok(())
    }

    fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if self.count == 0 {
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

        let limit = k.min(self.count) as i64;
        let mut stmt = self.conn.prepare(SEARCH_SQL)?;
        let rows = stmt.query_map(params![serialize_vector(vector), limit], map_row)?;

        let mut results = Vec::new();
        for row in rows {
            let (content, metadata, position, start, distance) = row?;
            let metadata: Metadata = serde_json::from_str(&metadata)
                .map_err(|e| RagError::Index(format!("metadata decode failed: {e}")))?;
            results.push(ScoredChunk {
                chunk: Chunk {
                    content,
                    metadata,
                    position: position as usize,
                    start: start as usize,
                },
                distance: distance as f32,
            });
        }

        Ok(results)
    }

    fn len(&self) -> usize {
        self.count
    }
}
