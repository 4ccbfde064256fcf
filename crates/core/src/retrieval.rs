//! Retrieval traits: the boundary to a persisted vector index.
//!
//! A loader turns a storage location into a queryable handle once per
//! process; the handle is read-only afterwards and answers queries by
//! doing its own retrieval-augmented synthesis.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// A loaded, read-only index that can answer questions.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Answer `query` grounded in the indexed documents.
    ///
    /// `system_instruction` frames the generation; `model_override`
    /// replaces the index's configured generation model for this call only.
    async fn query(
        &self,
        query: &str,
        system_instruction: &str,
        model_override: Option<&str>,
    ) -> Result<String>;

    /// Number of chunks held by the index.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads a persisted index from storage.
#[async_trait]
pub trait IndexLoader: Send + Sync {
    async fn load(&self, location: &Path) -> Result<Arc<dyn RetrievalIndex>>;
}
