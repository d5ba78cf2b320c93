use crate::auth::ServiceAuth;
use crate::config::Config;
use crate::http::post_json;
use async_trait::async_trait;
use domain::error::{RagError, RagResult};
use domain::models::{ChatMessage, EmbeddingVector};
use domain::ports::{ChatCompletion, Embedder};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

/// Client for the embeddings and chat-completions deployments of an Azure OpenAI resource.
#[derive(Clone)]
pub struct AzureOpenAiClient {
    client: Client,
    base_url: String,
    api_version: String,
    embedding_model: String,
    chat_model: String,
    auth: ServiceAuth,
}

impl AzureOpenAiClient {
    pub fn new(client: Client, config: &Config, auth: ServiceAuth) -> Self {
        Self {
            client,
            base_url: config.ai_endpoint.clone(),
            api_version: config.openai_api_version.clone(),
            embedding_model: config.embedding_model.clone(),
            chat_model: config.chat_model.clone(),
            auth,
        }
    }

    fn deployment_url(&self, model: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.base_url, model, operation, self.api_version
        )
    }

    pub async fn generate_embedding(&self, text: &str) -> RagResult<EmbeddingVector> {
        let url = self.deployment_url(&self.embedding_model, "embeddings");
        let request = EmbeddingRequest {
            input: text,
            model: &self.embedding_model,
        };
        let headers = self.auth.headers().await?;
        let response: EmbeddingResponse =
            post_json(&self.client, "embedding", &url, headers, &request).await?;
        first_embedding(response)
    }

    pub async fn generate_response(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> RagResult<String> {
        let url = self.deployment_url(&self.chat_model, "chat/completions");
        let request = ChatRequest {
            model: &self.chat_model,
            messages,
            temperature,
        };
        let headers = self.auth.headers().await?;
        let response: ChatResponse =
            post_json(&self.client, "chat", &url, headers, &request).await?;
        first_choice(response)
    }
}

fn first_embedding(response: EmbeddingResponse) -> RagResult<EmbeddingVector> {
    response
        .data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RagError::upstream("embedding", "response contained no embedding"))
}

fn first_choice(response: ChatResponse) -> RagResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| RagError::upstream("chat", "response contained no completion"))
}

#[async_trait]
impl Embedder for AzureOpenAiClient {
    async fn embed(&self, text: &str) -> RagResult<EmbeddingVector> {
        self.generate_embedding(text).await
    }
}

#[async_trait]
impl ChatCompletion for AzureOpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> RagResult<String> {
        self.generate_response(messages, temperature).await
    }
}
