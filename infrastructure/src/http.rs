use domain::error::{RagError, RagResult};
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::utils::truncate_chars;
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Builds the shared `reqwest::Client`. One client serves every upstream.
pub fn build_http_client(timeout: Duration) -> RagResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| RagError::config(format!("failed to build HTTP client: {e}")))
}

/// POSTs `body` as JSON and decodes a JSON reply. Transport failures, non-2xx
/// statuses and undecodable bodies all become `RagError::Upstream`.
pub async fn post_json<B, T>(
    client: &Client,
    service: &'static str,
    url: &str,
    headers: HeaderMap,
    body: &B,
) -> RagResult<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let response = client
        .post(url)
        .headers(headers)
        .json(body)
        .send()
        .await
        .map_err(|e| RagError::upstream(service, e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| RagError::upstream(service, e.to_string()))?;
    if !status.is_success() {
        return Err(RagError::upstream(service, describe_failure(status.as_u16(), &text)));
    }
    serde_json::from_str(&text)
        .map_err(|e| RagError::upstream(service, format!("unexpected response body: {e}")))
}

/// Renders a non-2xx reply, preferring the `error.message` field Azure services return.
pub fn describe_failure(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS));
    if detail.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {detail}")
    }
}
