//! Builds a persisted index from a folder of `.md` / `.txt` documents.

use compass_core::error::{IndexError, Result};
use compass_core::provider::{EmbeddingRequest, Provider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::store::{self, ChunkRecord};

const EMBED_BATCH: usize = 16;

/// Summary of a finished build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub index_path: PathBuf,
}

pub struct IndexBuilder {
    provider: Arc<dyn Provider>,
    embed_model: String,
    chunk_chars: usize,
}

impl IndexBuilder {
    pub fn new(provider: Arc<dyn Provider>, embed_model: impl Into<String>) -> Self {
        Self {
            provider,
            embed_model: embed_model.into(),
            chunk_chars: 1000,
        }
    }

    /// Set the soft maximum chunk size in characters.
    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// Chunk and embed every document under `docs_dir`, then write the
    /// store to `out_dir`.
    pub async fn build(&self, docs_dir: &Path, out_dir: &Path) -> Result<BuildReport> {
        let documents = collect_documents(docs_dir)?;

        let mut pending: Vec<(String, String, String)> = Vec::new();
        for (source, text) in &documents {
            for (n, piece) in chunk_text(text, self.chunk_chars).into_iter().enumerate() {
                pending.push((format!("{source}#{n}"), source.clone(), piece));
            }
        }

        let mut chunks = Vec::with_capacity(pending.len());
        for batch in pending.chunks(EMBED_BATCH) {
            let response = self
                .provider
                .embed(EmbeddingRequest {
                    model: self.embed_model.clone(),
                    inputs: batch.iter().map(|(_, _, text)| text.clone()).collect(),
                })
                .await?;

            if response.embeddings.len() != batch.len() {
                return Err(IndexError::Embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    response.embeddings.len()
                ))
                .into());
            }

            for ((id, source, content), embedding) in batch.iter().cloned().zip(response.embeddings) {
                chunks.push(ChunkRecord {
                    id,
                    source,
                    content,
                    embedding,
                });
            }
            debug!(embedded = chunks.len(), total = pending.len(), "Embedding batch done");
        }

        let index_path = store::save(out_dir, &chunks, &self.embed_model)?;
        info!(
            documents = documents.len(),
            chunks = chunks.len(),
            path = %index_path.display(),
            "Index built"
        );

        Ok(BuildReport {
            documents: documents.len(),
            chunks: chunks.len(),
            index_path,
        })
    }
}

/// Read all `.md` / `.txt` files under `dir`, sorted by relative path.
fn collect_documents(dir: &Path) -> std::result::Result<Vec<(String, String)>, IndexError> {
    if !dir.is_dir() {
        return Err(IndexError::NotFound(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| IndexError::Io(e.to_string()))?;
        for entry in entries {
            let path = entry.map_err(|e| IndexError::Io(e.to_string()))?.path();
            if path.is_dir() {
                stack.push(path);
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("md") | Some("txt")
            ) {
                files.push(path);
            }
        }
    }
    files.sort();

    files
        .into_iter()
        .map(|path| {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| IndexError::Io(format!("{}: {e}", path.display())))?;
            let source = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            Ok((source, text))
        })
        .collect()
}

/// Split text into paragraph-aligned chunks of at most `max_chars`
/// characters. Paragraphs longer than the limit are cut on char boundaries.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
        let para_len = paragraph.chars().count();

        if para_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = paragraph.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let joined_len = if current.is_empty() {
            para_len
        } else {
            current.chars().count() + 2 + para_len
        };

        if joined_len > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
