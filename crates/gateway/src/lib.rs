//! HTTP API gateway for Compass.
//!
//! Exposes the chat endpoint consumed by the web frontend plus a health
//! check. Built on Axum.
//!
//! Chat failures are reported inside a normal `200` reply as
//! `{"response": "Error: ..."}`; only malformed request bodies are
//! rejected at the transport level.

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use compass_core::{DeploymentMode, Message, Profile};
use compass_pipeline::{ChatTurn, Orchestrator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{Instrument, info, info_span, warn};

/// Shared application state for the gateway.
pub struct ApiState {
    pub orchestrator: Orchestrator,
    pub start_time: DateTime<Utc>,
}

impl ApiState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            start_time: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ApiState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS mirroring any origin, credentials allowed
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(state: SharedState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::very_permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: compass_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let orchestrator = compass_pipeline::build_from_config(&config)?;

    // Warm-up failure is not fatal; the first request retries the load.
    if orchestrator.mode() == DeploymentMode::Retrieval && config.retrieval.eager_init {
        match orchestrator.warm_up().await {
            Ok(()) => info!("Retrieval index warmed up"),
            Err(e) => warn!(error = %e, "Retrieval index warm-up failed; will retry on first request"),
        }
    }

    let app = build_router(Arc::new(ApiState::new(orchestrator)), config.gateway.body_limit);

    info!(addr = %addr, mode = %config.mode, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

// --- Handlers ---

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub user_info: Option<Profile>,
    #[serde(default)]
    pub chat_history: Option<Vec<Message>>,
}

impl From<ChatRequest> for ChatTurn {
    fn from(req: ChatRequest) -> Self {
        ChatTurn {
            prompt: req.prompt,
            model: req.model,
            profile: req.user_info,
            history: req.chat_history.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let request_id = uuid::Uuid::new_v4();
    let span = info_span!("chat", request_id = %request_id);

    async move {
        info!(
            prompt_len = payload.prompt.len(),
            history = payload.chat_history.as_ref().map_or(0, Vec::len),
            "Chat request received"
        );

        let turn = ChatTurn::from(payload);
        let outcome = state.orchestrator.handle(&turn).await;

        Json(ChatResponse {
            response: outcome.into_response_text(),
        })
    }
    .instrument(span)
    .await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    mode: DeploymentMode,
    index: &'static str,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let index = state
        .orchestrator
        .index_state()
        .map_or("n/a", |s| s.as_str());

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mode: state.orchestrator.mode(),
        index,
        uptime_secs: (Utc::now() - state.start_time).num_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use compass_core::error::{IndexError, ProviderError, Result as CoreResult};
    use compass_core::provider::{Provider, ProviderRequest, ProviderResponse};
    use compass_core::retrieval::{IndexLoader, RetrievalIndex};
    use compass_pipeline::{DirectChatProducer, IndexCell, RetrievalProducer};
    use http_body_util::BodyExt;
    use std::path::Path;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Replies with the last user message, or fails when asked to.
    #[derive(Default)]
    struct EchoProvider {
        fail: bool,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    #[async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            if self.fail {
                return Err(ProviderError::Network("connection refused".into()));
            }
            let content = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            let model = request.model.clone();
            self.seen.lock().unwrap().push(request);
            Ok(ProviderResponse {
                message: Message::assistant(content),
                usage: None,
                model,
            })
        }
    }

    struct MissingIndex;

    #[async_trait]
    impl IndexLoader for MissingIndex {
        async fn load(&self, location: &Path) -> CoreResult<Arc<dyn RetrievalIndex>> {
            Err(IndexError::NotFound(location.to_path_buf()).into())
        }
    }

    fn app_with(provider: Arc<EchoProvider>) -> Router {
        let orchestrator =
            Orchestrator::new(Arc::new(DirectChatProducer::new(provider)), "deepseek-r1");
        build_router(Arc::new(ApiState::new(orchestrator)), 1024 * 1024)
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_answer() {
        let provider = Arc::new(EchoProvider::default());
        let app = app_with(provider.clone());

        let response = app
            .oneshot(chat_request(serde_json::json!({ "prompt": "Hello there" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["response"], "Hello there");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].model, "deepseek-r1");
    }

    #[tokio::test]
    async fn chat_passes_profile_history_and_model() {
        let provider = Arc::new(EchoProvider::default());
        let app = app_with(provider.clone());

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "prompt": "Any exam tips?",
                "model": "llama3.1",
                "user_info": { "name": "Ada", "university": "MIT", "work": false },
                "chat_history": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello" }
                ]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let seen = provider.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "llama3.1");
        assert_eq!(request.messages.len(), 4);
        assert!(
            request.messages[0]
                .content
                .starts_with("The user you are assisting is Ada. They attend MIT.")
        );
        assert_eq!(request.max_tokens, Some(2500));
    }

    #[tokio::test]
    async fn irregular_history_entries_are_forwarded() {
        let provider = Arc::new(EchoProvider::default());
        let app = app_with(provider.clone());

        let response = app
            .oneshot(chat_request(serde_json::json!({
                "prompt": "hi",
                "chat_history": [
                    { "role": "user" },
                    { "role": "user", "content": "x", "name": "bob" }
                ]
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let seen = provider.seen.lock().unwrap();
        let messages = &seen[0].messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1], Message::user(""));
        assert_eq!(messages[2].content, "x");
        assert_eq!(messages[2].extra["name"], "bob");
    }

    #[tokio::test]
    async fn null_optionals_are_accepted() {
        let app = app_with(Arc::new(EchoProvider::default()));
        let response = app
            .oneshot(chat_request(serde_json::json!({
                "prompt": "ping",
                "model": null,
                "user_info": null,
                "chat_history": null
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["response"], "ping");
    }

    #[tokio::test]
    async fn provider_failure_is_200_with_error_text() {
        let app = app_with(Arc::new(EchoProvider {
            fail: true,
            ..Default::default()
        }));

        let response = app
            .oneshot(chat_request(serde_json::json!({ "prompt": "hi" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["response"],
            "Error: Provider error: Network error: connection refused"
        );
    }

    #[tokio::test]
    async fn missing_prompt_is_rejected() {
        let app = app_with(Arc::new(EchoProvider::default()));
        let response = app
            .oneshot(chat_request(serde_json::json!({ "model": "x" })))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn cors_preflight_mirrors_origin() {
        let app = app_with(Arc::new(EchoProvider::default()));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/chat")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn health_in_direct_mode() {
        let app = app_with(Arc::new(EchoProvider::default()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["mode"], "direct");
        assert_eq!(body["index"], "n/a");
    }

    #[tokio::test]
    async fn retrieval_mode_reports_missing_index_per_request() {
        let cell = IndexCell::new(Arc::new(MissingIndex), "/srv/storage");
        let orchestrator = Orchestrator::new(Arc::new(RetrievalProducer::new(cell)), "deepseek-r1");
        let app = build_router(Arc::new(ApiState::new(orchestrator)), 1024 * 1024);

        let response = app
            .clone()
            .oneshot(chat_request(serde_json::json!({ "prompt": "What is Rust?" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await["response"],
            "Error: Index error: Index not found at /srv/storage"
        );

        let health = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(health).await;
        assert_eq!(body["mode"], "retrieval");
        assert_eq!(body["index"], "uninitialized");
    }
}
