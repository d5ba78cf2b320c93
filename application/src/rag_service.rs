use crate::generator::Generator;
use domain::error::{RagError, RagResult};
use domain::models::{validate_query, ChatResponse};
use domain::ports::{ChatCompletion, Embedder, Retriever};
use infrastructure::{
    auth::Credentials, config::Config, http::build_http_client, openai_client::AzureOpenAiClient,
    search::SearchClient,
};
use shared::telemetry::Telemetry;
use std::sync::Arc;

/// Embed → search → generate, one request at a time, no state between calls.
pub struct RagService {
    embedder: Arc<dyn Embedder>,
    retriever: Arc<dyn Retriever>,
    generator: Generator,
}

impl RagService {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        retriever: Arc<dyn Retriever>,
        chat: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            embedder,
            retriever,
            generator: Generator::new(chat),
        }
    }

    /// Wires the Azure OpenAI and AI Search clients from startup configuration.
    pub fn from_config(config: &Config) -> RagResult<Self> {
        let http = build_http_client(config.http_timeout)?;
        let credentials = Credentials::from_config(config, http.clone());
        let openai = Arc::new(AzureOpenAiClient::new(http.clone(), config, credentials.ai));
        let search = Arc::new(SearchClient::new(http, config, credentials.search)?);
        tracing::info!(
            auth = ?config.auth.mode(),
            embedding_model = %config.embedding_model,
            chat_model = %config.chat_model,
            index = %config.search_index,
            "RAG service initialized"
        );
        Ok(Self::new(openai.clone(), search, openai))
    }

    /// Runs the pipeline and surfaces the first failing stage's error.
    pub async fn try_chat(&self, message: &str, top_k: usize) -> RagResult<ChatResponse> {
        validate_query(message, top_k)?;
        let total = Telemetry::new();

        let stage = Telemetry::new();
        let query_embedding = self.embedder.embed(message).await?;
        tracing::debug!(dimensions = query_embedding.len(), elapsed_ms = stage.elapsed_ms(), "query embedded");

        let stage = Telemetry::new();
        let context = self.retriever.retrieve(&query_embedding, top_k).await?;
        tracing::debug!(results = context.len(), elapsed_ms = stage.elapsed_ms(), "index searched");

        let stage = Telemetry::new();
        let response = self.generator.generate(message, &context).await?;
        tracing::debug!(elapsed_ms = stage.elapsed_ms(), "answer generated");

        tracing::info!(sources = context.len(), elapsed_ms = total.elapsed_ms(), "chat completed");
        Ok(ChatResponse::answered(message, response, context))
    }

    /// Never fails: any stage error becomes a degraded envelope with empty
    /// sources and the error text in both `response` and `error`.
    pub async fn chat(&self, message: &str, top_k: usize) -> ChatResponse {
        match self.try_chat(message, top_k).await {
            Ok(response) => response,
            Err(err) => {
                match &err {
                    RagError::Config(_) => tracing::error!(error = %err, "chat failed on configuration"),
                    _ => tracing::warn!(error = %err, "chat failed"),
                }
                ChatResponse::degraded(message, &err)
            }
        }
    }
}
