use thiserror::Error;

/// Failure taxonomy shared by every pipeline stage.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RagError {
    /// Missing or invalid configuration. Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any failure talking to the embedding, search or chat service.
    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    /// Malformed request input, rejected before the pipeline runs.
    #[error("Validation error: {0}")]
    Validation(String),
}

pub type RagResult<T> = Result<T, RagError>;

impl RagError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn upstream(service: &'static str, msg: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Only upstream failures can succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}
