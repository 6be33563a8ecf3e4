//! Passage index: embeddings plus the Qdrant collection that stores them.

pub mod qdrant;

use async_trait::async_trait;

use crate::errors::Result;
use crate::streaming::OllamaClient;

pub use qdrant::{PassageIndex, QdrantSearch};

/// Turns texts into embedding vectors, one per input in input order
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        OllamaClient::embed(self, texts).await
    }
}
