use crate::error::{RagError, RagResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 5;
pub const MAX_TOP_K: usize = 50;

/// Query embedding. Length is fixed by the embedding model.
pub type EmbeddingVector = Vec<f32>;

/// A scored document returned by the search stage.
///
/// Serialized with the `chunk` key because that is the shape both the HTTP
/// clients and the generation prompt expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    #[serde(rename = "chunk")]
    pub content: String,
    pub title: String,
    pub score: f64,
}

impl RetrievedChunk {
    pub fn new(content: impl Into<String>, title: impl Into<String>, score: f64) -> Self {
        Self {
            content: content.into(),
            title: title.into(),
            score,
        }
    }
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn validate(&self) -> RagResult<()> {
        validate_query(&self.message, self.top_k)
    }
}

/// The response envelope returned for every chat call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<RetrievedChunk>,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    pub fn answered(query: &str, response: String, sources: Vec<RetrievedChunk>) -> Self {
        Self {
            response,
            sources,
            query: query.to_string(),
            error: None,
        }
    }

    /// Envelope used when any stage fails: no sources and the error text inline.
    pub fn degraded(query: &str, err: &RagError) -> Self {
        let detail = err.to_string();
        Self {
            response: format!("I encountered an error while processing your request: {detail}"),
            sources: Vec::new(),
            query: query.to_string(),
            error: Some(detail),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

pub fn validate_query(message: &str, top_k: usize) -> RagResult<()> {
    if message.trim().is_empty() {
        return Err(RagError::validation("message must not be empty"));
    }
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(RagError::validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}, got {top_k}"
        )));
    }
    Ok(())
}
