//! Shared test helpers for retrieval tests.

use compass_core::error::ProviderError;
use compass_core::message::Message;
use compass_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse,
};
use std::sync::Mutex;

/// A provider whose embeddings are keyword indicators and whose completions
/// echo the grounded prompt back.
///
/// Embedding layout: `[mentions rust, mentions python, 0.0]`.
#[derive(Default)]
pub struct KeywordEmbedder {
    requests: Mutex<Vec<ProviderRequest>>,
    embedded: Mutex<usize>,
}

impl KeywordEmbedder {
    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn embedded_count(&self) -> usize {
        *self.embedded.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword_embedder"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let echoed = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        Ok(ProviderResponse {
            message: Message::assistant(echoed),
            usage: None,
            model,
        })
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        *self.embedded.lock().unwrap() += request.inputs.len();
        let embeddings = request
            .inputs
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                vec![
                    if lower.contains("rust") { 1.0 } else { 0.0 },
                    if lower.contains("python") { 1.0 } else { 0.0 },
                    0.0,
                ]
            })
            .collect();
        Ok(EmbeddingResponse {
            embeddings,
            model: request.model,
        })
    }
}
