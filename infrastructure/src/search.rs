use crate::auth::ServiceAuth;
use crate::config::{Config, SearchFields, SEARCH_API_VERSION};
use crate::http::post_json;
use async_trait::async_trait;
use domain::error::RagResult;
use domain::models::RetrievedChunk;
use domain::ports::Retriever;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

const UNKNOWN_TITLE: &str = "Unknown";

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
}

/// Vector queries against an Azure AI Search index.
///
/// Ranking (cosine similarity on the vector field) happens entirely inside the
/// service; results keep the order the service returned.
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    url: String,
    fields: SearchFields,
    auth: ServiceAuth,
}

impl SearchClient {
    pub fn new(client: Client, config: &Config, auth: ServiceAuth) -> RagResult<Self> {
        Ok(Self {
            client,
            url: format!(
                "{}/indexes/{}/docs/search?api-version={}",
                config.search_endpoint()?,
                config.search_index,
                SEARCH_API_VERSION
            ),
            fields: config.search_fields.clone(),
            auth,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn find_relevant_chunks(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> RagResult<Vec<RetrievedChunk>> {
        let body = build_search_body(query_embedding, top_k, &self.fields);
        let headers = self.auth.headers().await?;
        let response: SearchResponse =
            post_json(&self.client, "search", &self.url, headers, &body).await?;
        Ok(into_chunks(response, &self.fields, top_k))
    }
}

/// Only the content and title fields are selected to keep payloads small.
pub fn build_search_body(vector: &[f32], top_k: usize, fields: &SearchFields) -> Value {
    json!({
        "count": true,
        "select": format!("{}, {}", fields.content, fields.title),
        "vectorQueries": [{
            "vector": vector,
            "k": top_k,
            "fields": fields.vector,
            "kind": "vector"
        }]
    })
}

fn into_chunks(response: SearchResponse, fields: &SearchFields, top_k: usize) -> Vec<RetrievedChunk> {
    response
        .value
        .iter()
        .take(top_k)
        .map(|doc| {
            let text = |key: &str| doc.get(key).and_then(Value::as_str).map(str::to_string);
            RetrievedChunk {
                content: text(fields.content.as_str()).unwrap_or_default(),
                title: text(fields.title.as_str()).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
                score: doc
                    .get("@search.score")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0),
            }
        })
        .collect()
}

#[async_trait]
impl Retriever for SearchClient {
    async fn retrieve(&self, vector: &[f32], top_k: usize) -> RagResult<Vec<RetrievedChunk>> {
        self.find_relevant_chunks(vector, top_k).await
    }
}
