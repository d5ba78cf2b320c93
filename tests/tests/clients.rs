//! The Azure clients against a local HTTP stand-in, so status handling, URL
//! layout and auth headers are checked on the wire.

use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use domain::error::RagError;
use domain::models::RetrievedChunk;
use infrastructure::auth::Credentials;
use infrastructure::config::Config;
use infrastructure::http::build_http_client;
use infrastructure::openai_client::AzureOpenAiClient;
use infrastructure::search::SearchClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// What the stand-in saw on its last request.
#[derive(Clone, Default)]
struct Seen {
    api_key: Arc<Mutex<Option<String>>>,
    uri: Arc<Mutex<Option<String>>>,
    body: Arc<Mutex<Option<Value>>>,
}

impl Seen {
    fn record(&self, headers: &HeaderMap, uri: &OriginalUri, body: Value) {
        *self.api_key.lock().unwrap() = headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *self.uri.lock().unwrap() = Some(uri.0.to_string());
        *self.body.lock().unwrap() = Some(body);
    }
}

type Reply = (StatusCode, Json<Value>);

async fn busy(
    State(seen): State<Seen>,
    headers: HeaderMap,
    uri: OriginalUri,
    Json(body): Json<Value>,
) -> Reply {
    seen.record(&headers, &uri, body);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": {"code": "ServiceUnavailable", "message": "busy"}})),
    )
}

async fn search_hits(
    State(seen): State<Seen>,
    headers: HeaderMap,
    uri: OriginalUri,
    Json(body): Json<Value>,
) -> Reply {
    seen.record(&headers, &uri, body);
    (
        StatusCode::OK,
        Json(json!({
            "@odata.count": 3,
            "value": [
                {"@search.score": 0.52, "content_text": "tyre recycling", "document_title": "Annual Report"},
                {"@search.score": 0.87, "content_text": "BMW pursues circularity via...", "document_title": "Sustainability Report 2023"},
                {"@search.score": 0.31, "content_text": "secondary steel"}
            ]
        })),
    )
}

async fn spawn_stub(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn key_config(base: &str) -> Config {
    let vars: HashMap<&str, String> = [
        ("AZURE_AI_ENDPOINT", base.to_string()),
        ("SEARCH_SERVICE_ENDPOINT", base.to_string()),
        ("SEARCH_SERVICE_INDEX_NAME", "docs".to_string()),
        ("AUTH_MODE", "key".to_string()),
        ("AZURE_AI_API_KEY", "ai-secret".to_string()),
        ("SEARCH_SERVICE_API_KEY", "search-secret".to_string()),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

fn clients(config: &Config) -> (AzureOpenAiClient, SearchClient) {
    let http = build_http_client(Duration::from_secs(5)).unwrap();
    let credentials = Credentials::from_config(config, http.clone());
    (
        AzureOpenAiClient::new(http.clone(), config, credentials.ai),
        SearchClient::new(http, config, credentials.search).unwrap(),
    )
}

#[tokio::test]
async fn search_service_error_becomes_upstream_error() {
    let seen = Seen::default();
    let base = spawn_stub(
        Router::new()
            .route("/indexes/:index/docs/search", post(busy))
            .with_state(seen.clone()),
    )
    .await;
    let (_, search) = clients(&key_config(&base));

    let err = search.find_relevant_chunks(&[0.1, 0.2], 5).await.unwrap_err();

    assert_eq!(err, RagError::upstream("search", "HTTP 503: busy"));
    assert!(err.is_retryable());
    assert_eq!(seen.api_key.lock().unwrap().as_deref(), Some("search-secret"));
    assert_eq!(
        seen.uri.lock().unwrap().as_deref(),
        Some("/indexes/docs/docs/search?api-version=2023-11-01")
    );
}

#[tokio::test]
async fn embedding_service_error_becomes_upstream_error() {
    let seen = Seen::default();
    let base = spawn_stub(
        Router::new()
            .route("/openai/deployments/:model/embeddings", post(busy))
            .with_state(seen.clone()),
    )
    .await;
    let (openai, _) = clients(&key_config(&base));

    let err = openai.generate_embedding("circularity").await.unwrap_err();

    assert_eq!(err, RagError::upstream("embedding", "HTTP 503: busy"));
    assert_eq!(seen.api_key.lock().unwrap().as_deref(), Some("ai-secret"));
    assert_eq!(
        seen.uri.lock().unwrap().as_deref(),
        Some("/openai/deployments/text-embedding-3-large/embeddings?api-version=2024-02-15-preview")
    );
    let body = seen.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["input"], "circularity");
}

#[tokio::test]
async fn chat_service_error_becomes_upstream_error() {
    let seen = Seen::default();
    let base = spawn_stub(
        Router::new()
            .route("/openai/deployments/:model/chat/completions", post(busy))
            .with_state(seen.clone()),
    )
    .await;
    let (openai, _) = clients(&key_config(&base));
    let messages = [domain::models::ChatMessage::user("hi")];

    let err = openai.generate_response(&messages, 0.7).await.unwrap_err();

    assert_eq!(err, RagError::upstream("chat", "HTTP 503: busy"));
    assert_eq!(seen.api_key.lock().unwrap().as_deref(), Some("ai-secret"));
}

#[tokio::test]
async fn search_hits_keep_service_order() {
    let seen = Seen::default();
    let base = spawn_stub(
        Router::new()
            .route("/indexes/:index/docs/search", post(search_hits))
            .with_state(seen.clone()),
    )
    .await;
    let (_, search) = clients(&key_config(&base));

    let chunks = search.find_relevant_chunks(&[0.5, -0.5], 3).await.unwrap();

    assert_eq!(
        chunks,
        vec![
            RetrievedChunk::new("tyre recycling", "Annual Report", 0.52),
            RetrievedChunk::new("BMW pursues circularity via...", "Sustainability Report 2023", 0.87),
            RetrievedChunk::new("secondary steel", "Unknown", 0.31),
        ]
    );
    let body = seen.body.lock().unwrap().clone().unwrap();
    assert_eq!(body["vectorQueries"][0]["k"], 3);
    assert_eq!(body["vectorQueries"][0]["vector"], json!([0.5, -0.5]));
}

#[tokio::test]
async fn unreachable_service_is_upstream_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let (_, search) = clients(&key_config(&base));

    let err = search.find_relevant_chunks(&[0.1], 1).await.unwrap_err();

    assert!(matches!(err, RagError::Upstream { service: "search", .. }));
}
