//! On-disk layout of a persisted index.
//!
//! ```text
//! <persist_dir>/
//!   index.jsonl     one ChunkRecord per line
//!   manifest.json   embedding model, dimensions, chunk count
//! ```
//!
//! A corrupt line or an embedding of the wrong width fails the whole load.

use chrono::{DateTime, Utc};
use compass_core::error::IndexError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const INDEX_FILE: &str = "index.jsonl";
pub const MANIFEST_FILE: &str = "manifest.json";

/// A chunk of a source document with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Stable identifier (`<source>#<n>`)
    pub id: String,

    /// Path of the document, relative to the indexed folder
    pub source: String,

    /// The chunk text
    pub content: String,

    /// Embedding vector
    pub embedding: Vec<f32>,
}

/// Index-level metadata written next to the chunk store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub embed_model: String,
    pub dimensions: usize,
    pub chunks: usize,
    pub created_at: DateTime<Utc>,
}

/// A chunk store as read from disk.
#[derive(Debug)]
pub struct LoadedStore {
    pub chunks: Vec<ChunkRecord>,
    pub dimensions: usize,
    pub manifest: Option<Manifest>,
}

/// Read the store in `dir`.
pub fn load(dir: &Path) -> Result<LoadedStore, IndexError> {
    if !dir.is_dir() {
        return Err(IndexError::NotFound(dir.to_path_buf()));
    }

    let index_path = dir.join(INDEX_FILE);
    let content = std::fs::read_to_string(&index_path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IndexError::NotFound(index_path.clone()),
        _ => IndexError::Io(format!("{}: {e}", index_path.display())),
    })?;

    let mut chunks = Vec::new();
    let mut dimensions: Option<usize> = None;

    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let chunk: ChunkRecord = serde_json::from_str(line).map_err(|e| IndexError::Corrupt {
            path: index_path.clone(),
            reason: format!("line {}: {e}", n + 1),
        })?;

        match dimensions {
            None => dimensions = Some(chunk.embedding.len()),
            Some(expected) if expected != chunk.embedding.len() => {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    found: chunk.embedding.len(),
                });
            }
            Some(_) => {}
        }

        chunks.push(chunk);
    }

    let manifest = read_manifest(dir)?;
    debug!(path = %dir.display(), chunks = chunks.len(), "Chunk store read");

    Ok(LoadedStore {
        chunks,
        dimensions: dimensions.unwrap_or(0),
        manifest,
    })
}

fn read_manifest(dir: &Path) -> Result<Option<Manifest>, IndexError> {
    let path = dir.join(MANIFEST_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(&path).map_err(|e| IndexError::Io(e.to_string()))?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| IndexError::Corrupt {
            path,
            reason: e.to_string(),
        })
}

/// Write `chunks` and a manifest into `dir`, replacing any previous store.
pub fn save(dir: &Path, chunks: &[ChunkRecord], embed_model: &str) -> Result<PathBuf, IndexError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| IndexError::Io(format!("Failed to create index directory: {e}")))?;

    let mut content = String::new();
    for chunk in chunks {
        let line = serde_json::to_string(chunk)
            .map_err(|e| IndexError::Io(format!("Failed to serialize chunk: {e}")))?;
        content.push_str(&line);
        content.push('\n');
    }

    let index_path = dir.join(INDEX_FILE);
    std::fs::write(&index_path, &content)
        .map_err(|e| IndexError::Io(format!("Failed to write index file: {e}")))?;

    let manifest = Manifest {
        embed_model: embed_model.to_string(),
        dimensions: chunks.first().map(|c| c.embedding.len()).unwrap_or(0),
        chunks: chunks.len(),
        created_at: Utc::now(),
    };
    let manifest_json = serde_json::to_string_pretty(&manifest)
        .map_err(|e| IndexError::Io(format!("Failed to serialize manifest: {e}")))?;
    std::fs::write(dir.join(MANIFEST_FILE), manifest_json)
        .map_err(|e| IndexError::Io(format!("Failed to write manifest: {e}")))?;

    Ok(index_path)
}
