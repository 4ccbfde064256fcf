//! Shared test doubles for pipeline tests.

use async_trait::async_trait;
use compass_core::error::{IndexError, ProviderError, Result};
use compass_core::message::Message;
use compass_core::provider::{Provider, ProviderRequest, ProviderResponse};
use compass_core::retrieval::{IndexLoader, RetrievalIndex};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A provider that returns a canned reply (or error) and records requests.
pub struct MockProvider {
    reply: std::result::Result<String, ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            reply: Err(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let text = self.reply.clone()?;
        Ok(ProviderResponse {
            message: Message::assistant(text),
            usage: None,
            model,
        })
    }
}

/// An index that answers `"[<model>] <query>"`.
pub struct EchoIndex;

#[async_trait]
impl RetrievalIndex for EchoIndex {
    async fn query(
        &self,
        query: &str,
        _system_instruction: &str,
        model_override: Option<&str>,
    ) -> Result<String> {
        Ok(format!("[{}] {query}", model_override.unwrap_or("default")))
    }

    fn len(&self) -> usize {
        1
    }
}

/// Counts loads; can sleep to widen race windows and fail the first N loads.
pub struct CountingLoader {
    loads: AtomicUsize,
    delay: Duration,
    fail_first: usize,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail_first: 0,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IndexLoader for CountingLoader {
    async fn load(&self, location: &Path) -> Result<Arc<dyn RetrievalIndex>> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if attempt < self.fail_first {
            return Err(IndexError::NotFound(location.to_path_buf()).into());
        }
        Ok(Arc::new(EchoIndex))
    }
}
