//! In-memory stand-ins for the embedding, search and chat services, with call
//! counters so tests can assert which stages ran.

use application::rag_service::RagService;
use async_trait::async_trait;
use domain::error::{RagError, RagResult};
use domain::models::{ChatMessage, EmbeddingVector, RetrievedChunk};
use domain::ports::{ChatCompletion, Embedder, Retriever};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const NO_INFORMATION: &str =
    "I'm sorry, but there is no relevant information available in the provided context.";

#[derive(Default)]
pub struct MockEmbedder {
    pub calls: AtomicUsize,
    pub fail_with: Option<RagError>,
}

impl MockEmbedder {
    pub fn failing(err: RagError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(err),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> RagResult<EmbeddingVector> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(vec![text.len() as f32, 1.0, 0.0])
    }
}

/// Returns a fixed result list, honoring `top_k` the way the search service does.
#[derive(Default)]
pub struct MockRetriever {
    pub calls: AtomicUsize,
    pub documents: Vec<RetrievedChunk>,
    pub fail_with: Option<RagError>,
    pub last_top_k: Mutex<Option<usize>>,
}

impl MockRetriever {
    pub fn with_documents(documents: Vec<RetrievedChunk>) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }

    pub fn failing(err: RagError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, _vector: &[f32], top_k: usize) -> RagResult<Vec<RetrievedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_top_k.lock().unwrap() = Some(top_k);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(self.documents.iter().take(top_k).cloned().collect())
    }
}

/// Echoes whether context was available: names every title it was given, or
/// answers with [`NO_INFORMATION`] when the context list is empty.
#[derive(Default)]
pub struct EchoChat {
    pub calls: AtomicUsize,
    pub fail_with: Option<RagError>,
    pub last_messages: Mutex<Vec<ChatMessage>>,
}

impl EchoChat {
    pub fn failing(err: RagError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatCompletion for EchoChat {
    async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> RagResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let user = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        let context = user.split("The context is: ").nth(1).unwrap_or("[]");
        let chunks: Vec<RetrievedChunk> = serde_json::from_str(context).unwrap_or_default();
        if chunks.is_empty() {
            return Ok(NO_INFORMATION.to_string());
        }
        let titles: Vec<&str> = chunks.iter().map(|c| c.title.as_str()).collect();
        Ok(format!("According to {}, here is what I found.", titles.join(", ")))
    }
}

pub struct Harness {
    pub embedder: Arc<MockEmbedder>,
    pub retriever: Arc<MockRetriever>,
    pub chat: Arc<EchoChat>,
    pub service: Arc<RagService>,
}

impl Harness {
    pub fn new(embedder: MockEmbedder, retriever: MockRetriever, chat: EchoChat) -> Self {
        let embedder = Arc::new(embedder);
        let retriever = Arc::new(retriever);
        let chat = Arc::new(chat);
        let service = Arc::new(RagService::new(
            embedder.clone(),
            retriever.clone(),
            chat.clone(),
        ));
        Self {
            embedder,
            retriever,
            chat,
            service,
        }
    }

    pub fn with_documents(documents: Vec<RetrievedChunk>) -> Self {
        Self::new(
            MockEmbedder::default(),
            MockRetriever::with_documents(documents),
            EchoChat::default(),
        )
    }
}

pub fn sustainability_report() -> RetrievedChunk {
    RetrievedChunk::new(
        "BMW pursues circularity via...",
        "Sustainability Report 2023",
        0.87,
    )
}

pub fn ranked_documents(n: usize) -> Vec<RetrievedChunk> {
    (0..n)
        .map(|i| {
            RetrievedChunk::new(
                format!("chunk {i}"),
                format!("Document {i}"),
                1.0 - i as f64 * 0.05,
            )
        })
        .collect()
}
