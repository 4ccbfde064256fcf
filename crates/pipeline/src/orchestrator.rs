//! The orchestrator: one chat turn from raw request to answer text.
//!
//! ```text
//! ChatTurn ─▶ classify ─▶ synthesize ─▶ (select) ─▶ format ─▶ producer ─▶ ChatOutcome
//! ```
//!
//! Parameter selection only runs in direct mode; the retrieval index owns
//! its own sampling parameters.

use compass_config::AppConfig;
use compass_core::error::{Error, Result};
use compass_core::{ContextLabel, DeploymentMode, Message, Profile};
use compass_retrieval::{IndexSettings, VectorIndexLoader};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::classifier::{self, ContextScore};
use crate::formatter::{self, FormattedRequest};
use crate::index_cell::{IndexCell, IndexState};
use crate::params;
use crate::producer::{AnswerProducer, DirectChatProducer, RetrievalProducer};
use crate::prompt;

/// One inbound chat request.
#[derive(Debug, Clone, Default)]
pub struct ChatTurn {
    pub prompt: String,
    /// Model requested by the caller, if any
    pub model: Option<String>,
    pub profile: Option<Profile>,
    pub history: Vec<Message>,
}

impl ChatTurn {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

/// What happened to a turn. Failures are data, not transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    Answer(String),
    Failed(String),
}

impl ChatOutcome {
    /// Text for the `response` field of the wire reply.
    pub fn into_response_text(self) -> String {
        match self {
            Self::Answer(text) => text,
            Self::Failed(message) => format!("Error: {message}"),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Everything decided about a turn before the backend is called.
#[derive(Debug, Clone, Serialize)]
pub struct RequestPlan {
    pub context: ContextLabel,
    pub score: ContextScore,
    pub request: FormattedRequest,
}

pub struct Orchestrator {
    producer: Arc<dyn AnswerProducer>,
    default_model: String,
}

impl Orchestrator {
    pub fn new(producer: Arc<dyn AnswerProducer>, default_model: impl Into<String>) -> Self {
        Self {
            producer,
            default_model: default_model.into(),
        }
    }

    pub fn mode(&self) -> DeploymentMode {
        self.producer.mode()
    }

    pub fn index_state(&self) -> Option<IndexState> {
        self.producer.index_state()
    }

    /// Load the retrieval index (if any) ahead of the first request.
    pub async fn warm_up(&self) -> Result<()> {
        self.producer.warm_up().await
    }

    /// Classify and format a turn without calling any backend.
    pub fn plan(&self, turn: &ChatTurn) -> RequestPlan {
        let profile = turn.profile.as_ref();
        let score = classifier::score(&turn.prompt, profile);
        let context = score.label();
        debug!(
            academic = score.academic,
            professional = score.professional,
            context = %context,
            "Query classified"
        );
        let instruction = prompt::synthesize(context, profile);

        let request = match self.mode() {
            DeploymentMode::Direct => formatter::direct(
                instruction,
                &turn.history,
                &turn.prompt,
                turn.model.clone().unwrap_or_else(|| self.default_model.clone()),
                params::select(context),
            ),
            DeploymentMode::Retrieval => {
                formatter::retrieval(instruction, &turn.prompt, turn.model.clone())
            }
        };

        RequestPlan {
            context,
            score,
            request,
        }
    }

    /// Run a turn, propagating failures.
    pub async fn try_handle(&self, turn: &ChatTurn) -> Result<String> {
        let plan = self.plan(turn);
        info!(
            mode = %self.mode(),
            context = %plan.context,
            history = turn.history.len(),
            "Handling chat turn"
        );

        let raw = self.producer.produce(plan.request).await?;
        Ok(process_response(raw, plan.context))
    }

    /// Run a turn. Any failure becomes [`ChatOutcome::Failed`].
    pub async fn handle(&self, turn: &ChatTurn) -> ChatOutcome {
        match self.try_handle(turn).await {
            Ok(answer) => ChatOutcome::Answer(answer),
            Err(e) => {
                warn!(error = %e, "Chat turn failed");
                ChatOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Post-processing hook for answers. Currently the identity.
pub fn process_response(response: String, _context: ContextLabel) -> String {
    response
}

/// Wire an orchestrator for the configured deployment mode.
pub fn build_from_config(config: &AppConfig) -> Result<Orchestrator> {
    let router = compass_providers::router::build_from_config(config);
    let provider = router.default().ok_or_else(|| Error::Config {
        message: format!("provider '{}' is not available", config.default_provider),
    })?;

    let producer: Arc<dyn AnswerProducer> = match config.mode {
        DeploymentMode::Direct => Arc::new(DirectChatProducer::new(provider)),
        DeploymentMode::Retrieval => {
            let loader = VectorIndexLoader::new(provider, IndexSettings::from(&config.retrieval));
            let cell = IndexCell::new(Arc::new(loader), config.retrieval.persist_dir.clone());
            Arc::new(RetrievalProducer::new(cell))
        }
    };

    info!(
        mode = %config.mode,
        provider = %config.default_provider,
        model = %config.default_model,
        "Orchestrator ready"
    );
    Ok(Orchestrator::new(producer, config.default_model.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::{ACADEMIC_TEMPLATE, DEFAULT_TEMPLATE};
    use crate::test_helpers::{CountingLoader, MockProvider};
    use compass_core::error::ProviderError;
    use compass_core::GenerationConfig;
    use std::time::Duration;

    fn direct(provider: Arc<MockProvider>) -> Orchestrator {
        Orchestrator::new(Arc::new(DirectChatProducer::new(provider)), "deepseek-r1")
    }

    fn retrieval(loader: Arc<CountingLoader>) -> Orchestrator {
        let cell = IndexCell::new(loader, "/tmp/storage");
        Orchestrator::new(Arc::new(RetrievalProducer::new(cell)), "deepseek-r1")
    }

    #[tokio::test]
    async fn capital_of_france_end_to_end() {
        let provider = Arc::new(MockProvider::replying("<think>easy</think>Paris"));
        let orchestrator = direct(provider.clone());

        let outcome = orchestrator
            .handle(&ChatTurn::new("What is the capital of France?"))
            .await;
        assert_eq!(outcome, ChatOutcome::Answer("<think>easy</think>Paris".into()));

        let sent = provider.last_request().unwrap();
        assert_eq!(
            sent.messages,
            vec![
                Message::system(DEFAULT_TEMPLATE),
                Message::user(
                    "What is the capital of France?\n\nPlease think about this step-by-step before answering."
                ),
            ]
        );
        assert_eq!(sent.model, "deepseek-r1");
        assert!((sent.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(sent.top_p, Some(0.9));
        assert_eq!(sent.max_tokens, Some(2000));
    }

    #[tokio::test]
    async fn academic_turn_uses_academic_parameters() {
        let provider = Arc::new(MockProvider::replying("ok"));
        let orchestrator = direct(provider.clone());
        let turn = ChatTurn::new("Help me outline my thesis")
            .with_model("llama3.1")
            .with_profile(Profile::new().with("name", "Ada"))
            .with_history(vec![Message::user("hi"), Message::assistant("hello")]);

        orchestrator.handle(&turn).await;

        let sent = provider.last_request().unwrap();
        assert_eq!(sent.model, "llama3.1");
        assert_eq!(sent.max_tokens, Some(2500));
        assert_eq!(sent.messages.len(), 4);
        assert_eq!(
            sent.messages[0].content,
            format!("The user you are assisting is Ada.\n\n{ACADEMIC_TEMPLATE}")
        );
        assert_eq!(sent.messages[3].content, "Help me outline my thesis");
    }

    #[tokio::test]
    async fn provider_failure_becomes_error_text() {
        let provider = Arc::new(MockProvider::failing(ProviderError::ModelNotFound(
            "nope".into(),
        )));
        let orchestrator = direct(provider.clone());

        let outcome = orchestrator.handle(&ChatTurn::new("hello")).await;
        assert!(outcome.is_failed());
        assert_eq!(
            outcome.into_response_text(),
            "Error: Provider error: Model not found: nope"
        );
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn plan_in_direct_mode_selects_parameters() {
        let orchestrator = direct(Arc::new(MockProvider::replying("")));
        let plan = orchestrator.plan(&ChatTurn::new("client meeting notes"));

        assert_eq!(plan.context, ContextLabel::Professional);
        assert_eq!(
            plan.score,
            ContextScore {
                academic: 0,
                professional: 2,
            }
        );
        match plan.request {
            FormattedRequest::Direct { generation, .. } => assert_eq!(
                generation,
                GenerationConfig {
                    temperature: 0.7,
                    top_p: 0.9,
                    max_tokens: 1500,
                }
            ),
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn plan_in_retrieval_mode_keeps_raw_query() {
        let orchestrator = retrieval(Arc::new(CountingLoader::new()));
        let plan = orchestrator.plan(&ChatTurn::new("Why is the sky blue?"));

        assert_eq!(
            plan.request,
            FormattedRequest::Retrieval {
                query: "Why is the sky blue?".into(),
                system_instruction: DEFAULT_TEMPLATE.into(),
                model_override: None,
            }
        );
    }

    #[tokio::test]
    async fn retrieval_model_override_is_per_request() {
        let orchestrator = retrieval(Arc::new(CountingLoader::new()));

        let first = orchestrator
            .handle(&ChatTurn::new("q1").with_model("llama3.1"))
            .await;
        let second = orchestrator.handle(&ChatTurn::new("q2")).await;

        assert_eq!(first, ChatOutcome::Answer("[llama3.1] q1".into()));
        assert_eq!(second, ChatOutcome::Answer("[default] q2".into()));
    }

    #[tokio::test]
    async fn concurrent_first_turns_share_one_load() {
        let loader = Arc::new(CountingLoader::new().with_delay(Duration::from_millis(30)));
        let orchestrator = retrieval(loader.clone());
        assert_eq!(orchestrator.index_state(), Some(IndexState::Uninitialized));

        let a = ChatTurn::new("first");
        let b = ChatTurn::new("second");
        let (ra, rb) = tokio::join!(orchestrator.handle(&a), orchestrator.handle(&b));

        assert!(!ra.is_failed() && !rb.is_failed());
        assert_eq!(loader.loads(), 1);
        assert_eq!(orchestrator.index_state(), Some(IndexState::Ready));
    }

    #[tokio::test]
    async fn failed_index_load_reports_and_recovers() {
        let loader = Arc::new(CountingLoader::new().failing_first(1));
        let orchestrator = retrieval(loader);

        let failed = orchestrator.handle(&ChatTurn::new("q")).await;
        assert!(
            failed
                .clone()
                .into_response_text()
                .starts_with("Error: Index error: Index not found at /tmp/storage")
        );
        assert_eq!(orchestrator.index_state(), Some(IndexState::Uninitialized));

        let recovered = orchestrator.handle(&ChatTurn::new("q")).await;
        assert_eq!(recovered, ChatOutcome::Answer("[default] q".into()));
    }

    #[tokio::test]
    async fn direct_mode_has_no_index() {
        let orchestrator = direct(Arc::new(MockProvider::replying("")));
        assert_eq!(orchestrator.mode(), DeploymentMode::Direct);
        assert!(orchestrator.index_state().is_none());
        orchestrator.warm_up().await.unwrap();
    }

    #[test]
    fn build_from_config_per_mode() {
        let mut config = AppConfig::default();
        let orchestrator = build_from_config(&config).unwrap();
        assert_eq!(orchestrator.mode(), DeploymentMode::Direct);

        config.mode = DeploymentMode::Retrieval;
        let orchestrator = build_from_config(&config).unwrap();
        assert_eq!(orchestrator.mode(), DeploymentMode::Retrieval);
        assert_eq!(orchestrator.index_state(), Some(IndexState::Uninitialized));
    }

    #[test]
    fn process_response_is_identity() {
        assert_eq!(
            process_response("<think>x</think>y".into(), ContextLabel::Academic),
            "<think>x</think>y"
        );
    }
}
