// Passage index backed by Qdrant
use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        point_id::PointIdOptions, value::Kind, vectors_config::Config, with_payload_selector::SelectorOptions,
        CreateCollection, Distance, PointId, PointStruct, SearchPoints, Value as QdrantValue, VectorParams,
        VectorsConfig, WithPayloadSelector,
    },
};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::ProviderError;
use crate::index::Embedder;
use crate::rag::passage::Passage;
use crate::rag::retrieval::SimilaritySearch;

/// Payload key holding the passage text
const CONTENT_KEY: &str = "document";

/// Qdrant collection holding syllabus passages
pub struct PassageIndex {
    client: QdrantClient,
    collection: String,
}

impl PassageIndex {
    /// Connect to a Qdrant server; the collection is created on first write
    pub fn connect(url: &str, collection: &str) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .context("Failed to create Qdrant client")?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Whether the collection exists
    pub async fn exists(&self) -> Result<bool> {
        let collections = self
            .client
            .list_collections()
            .await
            .context("Failed to list collections")?;

        Ok(collections.collections.iter().any(|c| c.name == self.collection))
    }

    /// Create a cosine collection of `dim`-sized vectors if absent
    pub async fn ensure_collection(&self, dim: u64) -> Result<()> {
        if self.exists().await? {
            return Ok(());
        }

        self.client
            .create_collection(&CreateCollection {
                collection_name: self.collection.clone(),
                vectors_config: Some(VectorsConfig {
                    config: Some(Config::Params(VectorParams {
                        size: dim,
                        distance: Distance::Cosine.into(),
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .with_context(|| format!("Failed to create collection: {}", self.collection))?;

        info!(collection = %self.collection, dim, "created collection");
        Ok(())
    }

    /// Drop the collection and everything in it
    pub async fn reset(&self) -> Result<()> {
        if self.exists().await? {
            self.client
                .delete_collection(&self.collection)
                .await
                .with_context(|| format!("Failed to delete collection: {}", self.collection))?;
            info!(collection = %self.collection, "deleted collection");
        }
        Ok(())
    }

    /// Number of stored passages, 0 when the collection does not exist
    pub async fn count(&self) -> Result<u64> {
        if !self.exists().await? {
            return Ok(0);
        }

        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .context("Failed to get collection info")?;

        Ok(info.result.and_then(|r| r.points_count).unwrap_or(0))
    }

    /// Store passages with their precomputed embeddings
    pub async fn upsert(&self, passages: &[Passage], embeddings: Vec<Vec<f32>>) -> Result<()> {
        if passages.is_empty() {
            return Ok(());
        }
        anyhow::ensure!(
            passages.len() == embeddings.len(),
            "{} passages but {} embeddings",
            passages.len(),
            embeddings.len()
        );

        let points: Vec<PointStruct> = passages
            .iter()
            .zip(embeddings)
            .map(|(passage, embedding)| PointStruct::new(passage.id.clone(), embedding, passage_payload(passage)))
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .context("Failed to upsert points")?;

        Ok(())
    }

    /// Embed passages in batches and store them; `on_batch` receives the
    /// number of passages stored so far
    pub async fn add_passages<F>(
        &self,
        embedder: &dyn Embedder,
        passages: &[Passage],
        batch_size: usize,
        mut on_batch: F,
    ) -> Result<usize>
    where
        F: FnMut(usize),
    {
        let mut stored = 0;
        for batch in passages.chunks(batch_size.max(1)) {
            let texts: Vec<String> = batch.iter().map(|p| p.content.clone()).collect();
            let embeddings = embedder.embed(&texts).await.context("Failed to embed passages")?;

            if stored == 0 {
                let dim = embeddings.first().map(|e| e.len()).unwrap_or(0);
                anyhow::ensure!(dim > 0, "Embedding model returned empty vectors");
                self.ensure_collection(dim as u64).await?;
            }

            self.upsert(batch, embeddings).await?;
            stored += batch.len();
            on_batch(stored);
        }

        Ok(stored)
    }

    /// Nearest passages to `vector`, most similar first
    pub async fn search(&self, vector: Vec<f32>, limit: usize) -> Result<Vec<Passage>> {
        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector,
                limit: limit as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                ..Default::default()
            })
            .await
            .context("Failed to search points")?;

        Ok(search_result
            .result
            .into_iter()
            .map(|point| payload_to_passage(point_id_to_string(&point.id), point.payload))
            .collect())
    }
}

/// Similarity search provider: embeds the query with Ollama and asks Qdrant
/// for the `limit` nearest passages
pub struct QdrantSearch {
    index: Arc<PassageIndex>,
    embedder: Arc<dyn Embedder>,
    limit: usize,
}

impl QdrantSearch {
    pub fn new(index: Arc<PassageIndex>, embedder: Arc<dyn Embedder>, limit: usize) -> Self {
        Self { index, embedder, limit }
    }
}

#[async_trait]
impl SimilaritySearch for QdrantSearch {
    async fn search(&self, query: &str) -> Result<Vec<Passage>, ProviderError> {
        let vectors = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .map_err(|e| ProviderError::with_cause("failed to embed query", e))?;

        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::msg("embedding model returned no vector"))?;

        let passages = self
            .index
            .search(vector, self.limit)
            .await
            .map_err(|e| ProviderError::with_cause("qdrant search failed", e))?;

        debug!(limit = self.limit, found = passages.len(), "qdrant search");
        Ok(passages)
    }
}

fn passage_payload(passage: &Passage) -> HashMap<String, QdrantValue> {
    let mut payload: HashMap<String, QdrantValue> = passage
        .metadata
        .iter()
        .map(|(key, value)| (key.clone(), json_to_qdrant_value(value)))
        .collect();
    payload.insert(CONTENT_KEY.to_string(), QdrantValue::from(passage.content.clone()));
    payload
}

fn payload_to_passage(id: String, payload: HashMap<String, QdrantValue>) -> Passage {
    let mut content = String::new();
    let mut metadata = Map::new();

    for (key, value) in payload {
        if key == CONTENT_KEY {
            content = qdrant_value_to_string(&value).unwrap_or_default();
        } else if let Some(json) = qdrant_to_json_value(&value) {
            metadata.insert(key, json);
        }
    }

    Passage { id, content, metadata }
}

fn json_to_qdrant_value(json: &JsonValue) -> QdrantValue {
    match json {
        JsonValue::String(s) => QdrantValue::from(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                QdrantValue::from(i)
            } else {
                QdrantValue::from(n.as_f64().unwrap_or(0.0))
            }
        }
        JsonValue::Bool(b) => QdrantValue::from(*b),
        other => QdrantValue::from(other.to_string()),
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
        Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
        Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
        Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
        _ => None,
    })
}

fn qdrant_value_to_string(value: &QdrantValue) -> Option<String> {
    match value.kind.as_ref() {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn point_id_to_string(point_id: &Option<PointId>) -> String {
    match point_id.as_ref().and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        None => "unknown".to_string(),
    }
}
