//! Loads notes from a vault folder as [`Document`]s.
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::document::{Document, MetadataValue, SOURCE_KEY};
use crate::error::{RagError, Result};
use crate::frontmatter;

/// Anything that can produce the corpus to index.
pub trait DocumentSource {
    fn load(&self) -> Result<Vec<Document>>;
}

/// Recursively reads files with the configured extensions from a folder.
///
/// Respects `.gitignore` and skips hidden entries (so `.obsidian/` and
/// `.trash/` are never indexed).
#[derive(Debug, Clone)]
pub struct VaultSource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl VaultSource {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
    }

    fn load_file(&self, path: &Path) -> Result<Document> {
        let raw = std::fs::read_to_string(path).map_err(|e| RagError::Document {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let (mut metadata, body) =
            frontmatter::parse(&raw).map_err(|message| RagError::Document {
                path: path.to_path_buf(),
                message,
            })?;

        // Replace backslashes so sources look the same on every platform.
        let source = path.to_string_lossy().replace('\\', "/");
        metadata.insert(SOURCE_KEY.to_string(), MetadataValue::Str(source));
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            metadata.insert("file_name".to_string(), MetadataValue::from(name));
        }

        Ok(Document {
            content: body,
            metadata,
        })
    }
}

impl DocumentSource for VaultSource {
    fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(RagError::Document {
                path: self.root.clone(),
                message: "vault folder does not exist".to_string(),
            });
        }

        let mut paths: Vec<PathBuf> = WalkBuilder::new(&self.root)
            .build()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && self.is_supported(p))
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        let mut failed = 0usize;
        for path in &paths {
            debug!("Loading {}", path.display());
            match self.load_file(path) {
                Ok(doc) => documents.push(doc),
                Err(e) => {
                    warn!("Skipping note: {e}");
                    failed += 1;
                }
            }
        }

        info!(
            "Loaded {} documents from {} ({} failed)",
            documents.len(),
            self.root.display(),
            failed
        );
        Ok(documents)
    }
}
