use crate::config::{AuthConfig, Config};
use crate::credentials::{token_provider, TokenProvider};
use domain::error::{RagError, RagResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use std::sync::Arc;

pub const COGNITIVE_SERVICES_SCOPE: &str = "https://cognitiveservices.azure.com/.default";
pub const SEARCH_SCOPE: &str = "https://search.azure.com/.default";
const API_KEY_HEADER: &str = "api-key";

/// Resolved once at startup; produces the headers every upstream call needs.
#[derive(Clone)]
pub enum ServiceAuth {
    Bearer {
        provider: Arc<dyn TokenProvider>,
        scope: &'static str,
    },
    ApiKey(String),
}

impl ServiceAuth {
    pub async fn headers(&self) -> RagResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        match self {
            Self::Bearer { provider, scope } => {
                let token = provider.token(scope).await?;
                headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {token}"))?);
            }
            Self::ApiKey(key) => {
                headers.insert(API_KEY_HEADER, sensitive(key)?);
            }
        }
        Ok(headers)
    }
}

fn sensitive(value: &str) -> RagResult<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| RagError::config("credential contains characters not allowed in a header"))?;
    header.set_sensitive(true);
    Ok(header)
}

/// One auth capability per upstream service. In entra mode both share a token provider.
#[derive(Clone)]
pub struct Credentials {
    pub ai: ServiceAuth,
    pub search: ServiceAuth,
}

impl Credentials {
    pub fn from_config(config: &Config, http: Client) -> Self {
        match &config.auth {
            AuthConfig::Key {
                ai_api_key,
                search_api_key,
            } => Self {
                ai: ServiceAuth::ApiKey(ai_api_key.clone()),
                search: ServiceAuth::ApiKey(search_api_key.clone()),
            },
            AuthConfig::Entra(credential) => {
                let provider = token_provider(credential, http);
                Self {
                    ai: ServiceAuth::Bearer {
                        provider: provider.clone(),
                        scope: COGNITIVE_SERVICES_SCOPE,
                    },
                    search: ServiceAuth::Bearer {
                        provider,
                        scope: SEARCH_SCOPE,
                    },
                }
            }
        }
    }
}
