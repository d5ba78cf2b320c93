use crate::auth::ServiceAuth;
use crate::config::Config;
use crate::http::post_json;
use domain::error::RagResult;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ASSISTANTS_API_VERSION: &str = "2024-05-01-preview";

/// Body of an assistant-creation call. Tools are attached later in the portal.
#[derive(Debug, Clone, Serialize)]
pub struct AgentDefinition {
    pub model: String,
    pub name: String,
    pub instructions: String,
    pub tools: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedAgent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Registers agent definitions on the AI endpoint's assistants API.
pub struct AssistantsClient {
    client: Client,
    url: String,
    auth: ServiceAuth,
}

impl AssistantsClient {
    pub fn new(client: Client, config: &Config, auth: ServiceAuth) -> Self {
        Self {
            client,
            url: format!(
                "{}/openai/assistants?api-version={}",
                config.ai_endpoint, ASSISTANTS_API_VERSION
            ),
            auth,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn create(&self, definition: &AgentDefinition) -> RagResult<CreatedAgent> {
        let headers = self.auth.headers().await?;
        tracing::info!(url = %self.url, name = %definition.name, "creating agent");
        post_json(&self.client, "assistants", &self.url, headers, definition).await
    }
}
