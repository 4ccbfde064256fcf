//! Answer producers: the deployment-mode seam.
//!
//! The orchestrator never knows which backend answers; it hands a
//! [`FormattedRequest`] to whichever producer it was built with.

use async_trait::async_trait;
use compass_core::error::{Error, Result};
use compass_core::provider::{Provider, ProviderRequest};
use compass_core::DeploymentMode;
use std::sync::Arc;
use tracing::debug;

use crate::formatter::FormattedRequest;
use crate::index_cell::{IndexCell, IndexState};

#[async_trait]
pub trait AnswerProducer: Send + Sync {
    fn mode(&self) -> DeploymentMode;

    /// Produce the raw answer text for a prepared request.
    async fn produce(&self, request: FormattedRequest) -> Result<String>;

    /// Load whatever the producer needs before the first request.
    async fn warm_up(&self) -> Result<()> {
        Ok(())
    }

    /// Index state, for producers that hold one.
    fn index_state(&self) -> Option<IndexState> {
        None
    }
}

fn mismatch(expected: DeploymentMode, request: &FormattedRequest) -> Error {
    Error::Internal(format!(
        "{expected} producer received a {} request",
        request.mode()
    ))
}

/// Calls a chat-completion provider with the full transcript.
pub struct DirectChatProducer {
    provider: Arc<dyn Provider>,
}

impl DirectChatProducer {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl AnswerProducer for DirectChatProducer {
    fn mode(&self) -> DeploymentMode {
        DeploymentMode::Direct
    }

    async fn produce(&self, request: FormattedRequest) -> Result<String> {
        let (model, messages, generation) = match request {
            FormattedRequest::Direct {
                model,
                messages,
                generation,
            } => (model, messages, generation),
            other => return Err(mismatch(DeploymentMode::Direct, &other)),
        };

        debug!(
            provider = self.provider.name(),
            model = %model,
            messages = messages.len(),
            "Calling chat provider"
        );
        let response = self
            .provider
            .complete(ProviderRequest::with_generation(model, messages, generation))
            .await?;
        Ok(response.message.content)
    }
}

/// Queries the process-wide retrieval index, loading it on first use.
pub struct RetrievalProducer {
    cell: IndexCell,
}

impl RetrievalProducer {
    pub fn new(cell: IndexCell) -> Self {
        Self { cell }
    }
}

#[async_trait]
impl AnswerProducer for RetrievalProducer {
    fn mode(&self) -> DeploymentMode {
        DeploymentMode::Retrieval
    }

    async fn produce(&self, request: FormattedRequest) -> Result<String> {
        let (query, system_instruction, model_override) = match request {
            FormattedRequest::Retrieval {
                query,
                system_instruction,
                model_override,
            } => (query, system_instruction, model_override),
            other => return Err(mismatch(DeploymentMode::Retrieval, &other)),
        };

        let index = self.cell.get_or_init().await?;
        index
            .query(&query, &system_instruction, model_override.as_deref())
            .await
    }

    async fn warm_up(&self) -> Result<()> {
        self.cell.warm_up().await
    }

    fn index_state(&self) -> Option<IndexState> {
        Some(self.cell.state())
    }
}
