//! Lazily loaded, process-wide retrieval index handle.
//!
//! The first request (or an explicit warm-up) loads the index; concurrent
//! first callers wait on the same load. A failed load leaves the cell empty
//! so the next request tries again.

use compass_core::error::Result;
use compass_core::retrieval::{IndexLoader, RetrievalIndex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexState {
    Uninitialized,
    Ready,
}

impl IndexState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
        }
    }
}

pub struct IndexCell {
    loader: Arc<dyn IndexLoader>,
    location: PathBuf,
    handle: OnceCell<Arc<dyn RetrievalIndex>>,
}

impl IndexCell {
    pub fn new(loader: Arc<dyn IndexLoader>, location: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            location: location.into(),
            handle: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn state(&self) -> IndexState {
        if self.handle.initialized() {
            IndexState::Ready
        } else {
            IndexState::Uninitialized
        }
    }

    /// Return the loaded index, loading it first if needed.
    pub async fn get_or_init(&self) -> Result<Arc<dyn RetrievalIndex>> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                info!(path = %self.location.display(), "Loading retrieval index");
                self.loader.load(&self.location).await.inspect_err(|e| {
                    warn!(path = %self.location.display(), error = %e, "Retrieval index load failed");
                })
            })
            .await?;
        Ok(Arc::clone(handle))
    }

    /// Load eagerly, e.g. at startup.
    pub async fn warm_up(&self) -> Result<()> {
        self.get_or_init().await.map(|_| ())
    }
}
