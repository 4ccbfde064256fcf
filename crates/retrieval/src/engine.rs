//! Query engine over a loaded chunk store.

use async_trait::async_trait;
use compass_core::error::{IndexError, Result};
use compass_core::message::Message;
use compass_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use compass_core::retrieval::{IndexLoader, RetrievalIndex};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::store::{self, ChunkRecord};
use crate::vector::rank_chunks;

/// Process-wide model settings for the retrieval variant.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    /// Model used to embed queries (must match the one used to build the store)
    pub embed_model: String,
    /// Model used to synthesize answers
    pub llm_model: String,
    /// Chunks handed to the generation model per query
    pub top_k: usize,
}

impl From<&compass_config::RetrievalConfig> for IndexSettings {
    fn from(config: &compass_config::RetrievalConfig) -> Self {
        Self {
            embed_model: config.embed_model.clone(),
            llm_model: config.llm_model.clone(),
            top_k: config.top_k,
        }
    }
}

/// A read-only, in-memory vector index.
pub struct VectorIndex {
    chunks: Vec<ChunkRecord>,
    dimensions: usize,
    provider: Arc<dyn Provider>,
    settings: IndexSettings,
}

impl VectorIndex {
    pub fn new(
        chunks: Vec<ChunkRecord>,
        provider: Arc<dyn Provider>,
        settings: IndexSettings,
    ) -> Self {
        let dimensions = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        Self {
            chunks,
            dimensions,
            provider,
            settings,
        }
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let response = self
            .provider
            .embed(EmbeddingRequest {
                model: self.settings.embed_model.clone(),
                inputs: vec![query.to_string()],
            })
            .await?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| IndexError::Embedding("provider returned no embedding".into()))?;

        if self.dimensions != 0 && embedding.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                found: embedding.len(),
            }
            .into());
        }

        Ok(embedding)
    }
}

/// Render the grounded question handed to the generation model.
fn grounded_prompt(query: &str, context: &[(f32, &ChunkRecord)]) -> String {
    let mut prompt = String::from("Context information is below.\n---------------------\n");
    for (_, chunk) in context {
        prompt.push_str(&format!("[{}]\n{}\n\n", chunk.source, chunk.content.trim()));
    }
    prompt.push_str("---------------------\n");
    prompt.push_str(
        "Given the context information and not prior knowledge, answer the query.\n",
    );
    prompt.push_str(&format!("Query: {query}\nAnswer: "));
    prompt
}

#[async_trait]
impl RetrievalIndex for VectorIndex {
    async fn query(
        &self,
        query: &str,
        system_instruction: &str,
        model_override: Option<&str>,
    ) -> Result<String> {
        let embedding = self.embed_query(query).await?;
        let context = rank_chunks(&self.chunks, &embedding, self.settings.top_k);

        debug!(
            retrieved = context.len(),
            best = context.first().map(|(s, _)| *s).unwrap_or(0.0),
            "Chunks retrieved"
        );

        let model = model_override.unwrap_or(&self.settings.llm_model);
        let request = ProviderRequest {
            model: model.to_string(),
            messages: vec![
                Message::system(system_instruction),
                Message::user(grounded_prompt(query, &context)),
            ],
            temperature: 0.7,
            top_p: None,
            max_tokens: None,
        };

        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Loads [`VectorIndex`]es from disk, bound to one provider and one set of
/// model settings for the life of the process.
pub struct VectorIndexLoader {
    provider: Arc<dyn Provider>,
    settings: IndexSettings,
}

impl VectorIndexLoader {
    pub fn new(provider: Arc<dyn Provider>, settings: IndexSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl IndexLoader for VectorIndexLoader {
    async fn load(&self, location: &Path) -> Result<Arc<dyn RetrievalIndex>> {
        // The whole store is read and parsed up front; keep that off the runtime workers.
        let dir = location.to_path_buf();
        let loaded = tokio::task::spawn_blocking(move || store::load(&dir))
            .await
            .map_err(|e| IndexError::Io(format!("index load task failed: {e}")))??;

        if let Some(manifest) = &loaded.manifest {
            if manifest.embed_model != self.settings.embed_model {
                warn!(
                    built_with = %manifest.embed_model,
                    configured = %self.settings.embed_model,
                    "Index was built with a different embedding model"
                );
            }
        }

        info!(
            path = %location.display(),
            chunks = loaded.chunks.len(),
            dimensions = loaded.dimensions,
            "Retrieval index loaded"
        );

        Ok(Arc::new(VectorIndex::new(
            loaded.chunks,
            self.provider.clone(),
            self.settings.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::KeywordEmbedder;
    use compass_core::Error;

    fn settings() -> IndexSettings {
        IndexSettings {
            embed_model: "nomic-embed-text".into(),
            llm_model: "deepseek-r1".into(),
            top_k: 1,
        }
    }

    fn chunk(id: &str, content: &str, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: id.into(),
            source: format!("{id}.md"),
            content: content.into(),
            embedding,
        }
    }

    fn index(provider: Arc<KeywordEmbedder>) -> VectorIndex {
        VectorIndex::new(
            vec![
                chunk("rust", "Rust has an ownership system.", vec![1.0, 0.0, 0.0]),
                chunk("python", "Python uses a garbage collector.", vec![0.0, 1.0, 0.0]),
            ],
            provider,
            settings(),
        )
    }

    #[tokio::test]
    async fn query_grounds_answer_in_best_chunk() {
        let provider = Arc::new(KeywordEmbedder::default());
        let index = index(provider.clone());

        let answer = index
            .query("How does rust manage memory?", "Be precise.", None)
            .await
            .unwrap();

        assert!(answer.contains("Rust has an ownership system."));
        assert!(!answer.contains("garbage collector"));

        let last = provider.last_request().unwrap();
        assert_eq!(last.model, "deepseek-r1");
        assert_eq!(last.messages[0].content, "Be precise.");
    }

    #[tokio::test]
    async fn model_override_applies_to_one_call() {
        let provider = Arc::new(KeywordEmbedder::default());
        let index = index(provider.clone());

        index.query("python?", "sys", Some("llama3.1")).await.unwrap();
        assert_eq!(provider.last_request().unwrap().model, "llama3.1");

        index.query("python?", "sys", None).await.unwrap();
        assert_eq!(provider.last_request().unwrap().model, "deepseek-r1");
    }

    #[tokio::test]
    async fn query_dimension_mismatch_is_an_error() {
        let provider = Arc::new(KeywordEmbedder::default());
        let index = VectorIndex::new(
            vec![chunk("a", "x", vec![1.0, 0.0])],
            provider,
            settings(),
        );

        let err = index.query("rust", "sys", None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Index(IndexError::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[tokio::test]
    async fn loader_reads_persisted_store() {
        let dir = tempfile::tempdir().unwrap();
        store::save(
            dir.path(),
            &[chunk("rust", "Rust has an ownership system.", vec![1.0, 0.0, 0.0])],
            "nomic-embed-text",
        )
        .unwrap();

        let loader = VectorIndexLoader::new(Arc::new(KeywordEmbedder::default()), settings());
        let index = loader.load(dir.path()).await.unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn loader_missing_store_fails() {
        let loader = VectorIndexLoader::new(Arc::new(KeywordEmbedder::default()), settings());
        let err = loader.load(Path::new("/nonexistent/storage")).await.err().unwrap();
        assert!(matches!(err, Error::Index(IndexError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn loader_reports_corrupt_store_from_blocking_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(store::INDEX_FILE), "{not json\n").unwrap();

        let loader = VectorIndexLoader::new(Arc::new(KeywordEmbedder::default()), settings());
        let err = loader.load(dir.path()).await.err().unwrap();
        assert!(matches!(err, Error::Index(IndexError::Corrupt { .. })));
    }

    #[test]
    fn grounded_prompt_lists_sources() {
        let c = chunk("guide", "Step one.", vec![]);
        let prompt = grounded_prompt("What first?", &[(0.9, &c)]);
        assert!(prompt.contains("[guide.md]\nStep one."));
        assert!(prompt.ends_with("Query: What first?\nAnswer: "));
    }
}
