use crate::prompt::{AGENT_INSTRUCTIONS, AGENT_NAME};
use domain::error::RagResult;
use infrastructure::{
    assistants::{AgentDefinition, AssistantsClient, CreatedAgent},
    auth::Credentials,
    config::Config,
    http::build_http_client,
};

pub fn agent_definition(config: &Config) -> AgentDefinition {
    AgentDefinition {
        model: config.chat_model.clone(),
        name: AGENT_NAME.to_string(),
        instructions: AGENT_INSTRUCTIONS.to_string(),
        tools: Vec::new(),
    }
}

/// Creates the agent definition on the configured AI endpoint.
pub struct RegistrationService {
    client: AssistantsClient,
    definition: AgentDefinition,
}

impl RegistrationService {
    pub fn from_config(config: &Config) -> RagResult<Self> {
        let http = build_http_client(config.http_timeout)?;
        let credentials = Credentials::from_config(config, http.clone());
        Ok(Self {
            client: AssistantsClient::new(http, config, credentials.ai),
            definition: agent_definition(config),
        })
    }

    pub fn definition(&self) -> &AgentDefinition {
        &self.definition
    }

    pub fn target_url(&self) -> &str {
        self.client.url()
    }

    pub async fn register(&self) -> RagResult<CreatedAgent> {
        self.client.create(&self.definition).await
    }
}
