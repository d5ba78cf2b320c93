use domain::error::{RagError, RagResult};
use dotenvy::dotenv;
use shared::utils::normalize_base_url;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_API_VERSION: &str = "2024-02-15-preview";
pub const SEARCH_API_VERSION: &str = "2023-11-01";
pub const DEFAULT_SEARCH_INDEX: &str = "multi-modal-rag-index";
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Entra,
    Key,
}

impl FromStr for AuthMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "entra" => Ok(Self::Entra),
            "key" => Ok(Self::Key),
            other => Err(RagError::config(format!(
                "AUTH_MODE must be 'entra' or 'key', got '{other}'"
            ))),
        }
    }
}

/// Where entra-mode bearer tokens come from.
#[derive(Clone, PartialEq)]
pub enum EntraCredential {
    ClientSecret {
        authority_host: String,
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    ManagedIdentity {
        client_id: Option<String>,
    },
}

#[derive(Clone, PartialEq)]
pub enum AuthConfig {
    Entra(EntraCredential),
    Key {
        ai_api_key: String,
        search_api_key: String,
    },
}

impl AuthConfig {
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::Entra(_) => AuthMode::Entra,
            Self::Key { .. } => AuthMode::Key,
        }
    }
}

// Secrets never reach the logs.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entra(EntraCredential::ClientSecret {
                tenant_id,
                client_id,
                ..
            }) => f
                .debug_struct("Entra::ClientSecret")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Self::Entra(EntraCredential::ManagedIdentity { client_id }) => f
                .debug_struct("Entra::ManagedIdentity")
                .field("client_id", client_id)
                .finish(),
            Self::Key { .. } => f.write_str("Key { .. }"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchFields {
    pub content: String,
    pub title: String,
    pub vector: String,
}

impl Default for SearchFields {
    fn default() -> Self {
        Self {
            content: "content_text".to_string(),
            title: "document_title".to_string(),
            vector: "content_embedding".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub ai_endpoint: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub openai_api_version: String,
    /// Only the chat pipeline searches, so registration runs without it.
    pub search_endpoint: Option<String>,
    pub search_index: String,
    pub search_fields: SearchFields,
    pub auth: AuthConfig,
    pub http_timeout: Duration,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    /// Reads `.env` (if present) and the process environment.
    pub fn load() -> RagResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> RagResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| RagError::config(format!("{key} is not set")));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let mode: AuthMode = or_default("AUTH_MODE", "entra").parse()?;
        let auth = match mode {
            AuthMode::Key => AuthConfig::Key {
                ai_api_key: require("AZURE_AI_API_KEY")?,
                search_api_key: require("SEARCH_SERVICE_API_KEY")?,
            },
            AuthMode::Entra => {
                let secret = (
                    get("AZURE_TENANT_ID"),
                    get("AZURE_CLIENT_ID"),
                    get("AZURE_CLIENT_SECRET"),
                );
                match secret {
                    (Some(tenant_id), Some(client_id), Some(client_secret)) => {
                        AuthConfig::Entra(EntraCredential::ClientSecret {
                            authority_host: normalize_base_url(&or_default(
                                "AZURE_AUTHORITY_HOST",
                                DEFAULT_AUTHORITY_HOST,
                            )),
                            tenant_id,
                            client_id,
                            client_secret,
                        })
                    }
                    (_, client_id, _) => {
                        AuthConfig::Entra(EntraCredential::ManagedIdentity { client_id })
                    }
                }
            }
        };

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                RagError::config(format!("HTTP_TIMEOUT_SECS must be a whole number, got '{raw}'"))
            })?),
            None => Duration::from_secs(60),
        };
        let server_port = match get("SERVER_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| RagError::config(format!("SERVER_PORT must be a port number, got '{raw}'")))?,
            None => 8000,
        };

        let defaults = SearchFields::default();
        Ok(Self {
            ai_endpoint: normalize_base_url(&require("AZURE_AI_ENDPOINT")?),
            embedding_model: or_default("EMBEDDING_MODEL_NAME", DEFAULT_EMBEDDING_MODEL),
            chat_model: or_default("CHAT_MODEL_NAME", DEFAULT_CHAT_MODEL),
            openai_api_version: or_default("AZURE_OPENAI_API_VERSION", DEFAULT_OPENAI_API_VERSION),
            search_endpoint: get("SEARCH_SERVICE_ENDPOINT").map(|v| normalize_base_url(&v)),
            search_index: or_default("SEARCH_SERVICE_INDEX_NAME", DEFAULT_SEARCH_INDEX),
            search_fields: SearchFields {
                content: or_default("SEARCH_CONTENT_FIELD", defaults.content.as_str()),
                title: or_default("SEARCH_TITLE_FIELD", defaults.title.as_str()),
                vector: or_default("SEARCH_VECTOR_FIELD", defaults.vector.as_str()),
            },
            auth,
            http_timeout,
            server_host: or_default("SERVER_HOST", "0.0.0.0"),
            server_port,
        })
    }

    pub fn search_endpoint(&self) -> RagResult<&str> {
        self.search_endpoint
            .as_deref()
            .ok_or_else(|| RagError::config("SEARCH_SERVICE_ENDPOINT is not set"))
    }
}
