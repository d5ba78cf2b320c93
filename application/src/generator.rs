use crate::prompt::{build_user_message, SYSTEM_PROMPT};
use domain::error::RagResult;
use domain::models::{ChatMessage, RetrievedChunk};
use domain::ports::ChatCompletion;
use std::sync::Arc;

pub const TEMPERATURE: f32 = 0.7;

/// Turns a query plus retrieved chunks into a grounded answer. Stateless: every
/// call sends exactly one system and one user message.
#[derive(Clone)]
pub struct Generator {
    chat: Arc<dyn ChatCompletion>,
}

impl Generator {
    pub fn new(chat: Arc<dyn ChatCompletion>) -> Self {
        Self { chat }
    }

    pub fn messages(query: &str, context: &[RetrievedChunk]) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_message(query, context)),
        ]
    }

    pub async fn generate(&self, query: &str, context: &[RetrievedChunk]) -> RagResult<String> {
        let messages = Self::messages(query, context);
        self.chat.complete(&messages, TEMPERATURE).await
    }
}
