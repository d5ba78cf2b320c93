use application::prompt::AGENT_NAME;
use application::rag_service::RagService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use domain::error::RagError;
use domain::models::{ChatRequest, ChatResponse};
use serde_json::{json, Value};
use shared::types::Result;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RagService>,
}

/// HTTP face of a pipeline failure.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(err: RagError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(RagError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RagError::Validation(_) => StatusCode::BAD_REQUEST,
            RagError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            RagError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": self.0.to_string(),
            "code": status.as_u16()
        }));
        (status, body).into_response()
    }
}

pub fn router(service: Arc<RagService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat_handler))
        .route("/api/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

async fn root() -> Json<Value> {
    Json(json!({"status": "healthy", "agent": AGENT_NAME}))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;
    match state.service.try_chat(&request.message, request.top_k).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => {
            tracing::warn!(error = %err, "chat request failed");
            Err(err.into())
        }
    }
}

pub async fn serve(service: Arc<RagService>, addr: &str) -> Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Endpoints: POST /chat, POST /api/chat, GET /health");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. A signal handler that cannot be installed
/// leaves the server running instead of stopping it right after bind.
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(err) => {
            tracing::error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
