//! Seams to the external services. Infrastructure implements these against
//! HTTP; tests implement them with in-memory mocks.

use crate::error::RagResult;
use crate::models::{ChatMessage, EmbeddingVector, RetrievedChunk};
use async_trait::async_trait;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `text` with the configured model.
    async fn embed(&self, text: &str) -> RagResult<EmbeddingVector>;
}

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Returns at most `top_k` chunks in the order the search service ranked them.
    async fn retrieve(&self, vector: &[f32], top_k: usize) -> RagResult<Vec<RetrievedChunk>>;
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Returns the text of the top completion.
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> RagResult<String>;
}
