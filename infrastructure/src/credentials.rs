//! Bearer tokens for entra mode.
//!
//! A `TokenSource` knows how to fetch a fresh token from the identity
//! provider; `CachedTokenProvider` wraps one and reuses tokens per scope
//! until shortly before they expire.

use crate::config::EntraCredential;
use async_trait::async_trait;
use domain::error::{RagError, RagResult};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const SERVICE: &str = "identity";
const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_SKEW: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_SKEW < self.expires_at
    }
}

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn fetch(&self, scope: &str) -> RagResult<AccessToken>;
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, scope: &str) -> RagResult<String>;
}

pub struct CachedTokenProvider {
    source: Box<dyn TokenSource>,
    cache: Mutex<HashMap<String, AccessToken>>,
}

impl CachedTokenProvider {
    pub fn new(source: Box<dyn TokenSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl TokenProvider for CachedTokenProvider {
    async fn token(&self, scope: &str) -> RagResult<String> {
        // Held across the fetch so concurrent requests do not stampede the identity provider.
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.get(scope) {
            if cached.is_fresh(Instant::now()) {
                return Ok(cached.token.clone());
            }
        }
        tracing::debug!(scope, "fetching access token");
        let fresh = self.source.fetch(scope).await?;
        let token = fresh.token.clone();
        cache.insert(scope.to_string(), fresh);
        Ok(token)
    }
}

/// Builds the provider for the configured entra credential.
pub fn token_provider(credential: &EntraCredential, http: Client) -> Arc<dyn TokenProvider> {
    let source: Box<dyn TokenSource> = match credential {
        EntraCredential::ClientSecret {
            authority_host,
            tenant_id,
            client_id,
            client_secret,
        } => Box::new(ClientSecretCredential {
            http,
            token_url: format!("{authority_host}/{tenant_id}/oauth2/v2.0/token"),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        }),
        EntraCredential::ManagedIdentity { client_id } => Box::new(ManagedIdentityCredential {
            http,
            client_id: client_id.clone(),
        }),
    };
    Arc::new(CachedTokenProvider::new(source))
}

/// `expires_in` is a number from the token endpoint but a string from IMDS.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> RagResult<u64> {
        match self {
            Self::Seconds(s) => Ok(*s),
            Self::Text(t) => t
                .parse()
                .map_err(|_| RagError::upstream(SERVICE, format!("invalid expires_in '{t}'"))),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: ExpiresIn,
}

impl TokenResponse {
    fn into_access_token(self, now: Instant) -> RagResult<AccessToken> {
        let lifetime = Duration::from_secs(self.expires_in.seconds()?);
        Ok(AccessToken {
            token: self.access_token,
            expires_at: now + lifetime,
        })
    }
}

async fn read_token(response: reqwest::Response) -> RagResult<AccessToken> {
    let now = Instant::now();
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RagError::upstream(SERVICE, e.to_string()))?;
    if !status.is_success() {
        return Err(RagError::upstream(
            SERVICE,
            crate::http::describe_failure(status.as_u16(), &text),
        ));
    }
    let parsed: TokenResponse = serde_json::from_str(&text)
        .map_err(|e| RagError::upstream(SERVICE, format!("unexpected token response: {e}")))?;
    parsed.into_access_token(now)
}

/// OAuth2 client-credentials grant against the tenant's token endpoint.
pub struct ClientSecretCredential {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
}

#[async_trait]
impl TokenSource for ClientSecretCredential {
    async fn fetch(&self, scope: &str) -> RagResult<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("scope", scope),
        ];
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| RagError::upstream(SERVICE, e.to_string()))?;
        read_token(response).await
    }
}

/// Instance metadata service available on Azure-hosted compute.
pub struct ManagedIdentityCredential {
    http: Client,
    client_id: Option<String>,
}

/// IMDS takes a resource URI rather than a `/.default` scope.
fn scope_to_resource(scope: &str) -> &str {
    scope.strip_suffix("/.default").unwrap_or(scope)
}

#[async_trait]
impl TokenSource for ManagedIdentityCredential {
    async fn fetch(&self, scope: &str) -> RagResult<AccessToken> {
        let mut query = vec![
            ("api-version", IMDS_API_VERSION),
            ("resource", scope_to_resource(scope)),
        ];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }
        let response = self
            .http
            .get(IMDS_TOKEN_URL)
            .header("Metadata", "true")
            .query(&query)
            .send()
            .await
            .map_err(|e| RagError::upstream(SERVICE, format!("managed identity unavailable: {e}")))?;
        read_token(response).await
    }
}
