// Hybrid retrieval engine: similarity search followed by keyword re-ranking
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{ProviderError, RetrievalError};
use crate::rag::keywords::KeywordExtractor;
use crate::rag::passage::Passage;
use crate::rag::reranking::{HybridReRanker, RankTier, RankedPassage, RelevanceScorer, SpecificTermVocabulary};

/// Semantic nearest-neighbour search over the passage index.
///
/// Implementations return passages most-similar first and must be
/// deterministic for a fixed index snapshot. Timeouts belong here.
#[async_trait]
pub trait SimilaritySearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Passage>, ProviderError>;
}

/// Retrieval engine combining semantic search with keyword overlap
pub struct HybridRetriever {
    provider: Arc<dyn SimilaritySearch>,
    extractor: KeywordExtractor,
    reranker: HybridReRanker,
}

impl HybridRetriever {
    /// Create with the default specific-term vocabulary
    pub fn new(provider: Arc<dyn SimilaritySearch>) -> Self {
        Self::with_vocabulary(provider, SpecificTermVocabulary::default())
    }

    /// Create with a custom vocabulary
    pub fn with_vocabulary(provider: Arc<dyn SimilaritySearch>, vocabulary: SpecificTermVocabulary) -> Self {
        Self {
            provider,
            extractor: KeywordExtractor::new(),
            reranker: HybridReRanker::new(RelevanceScorer::new(vocabulary)),
        }
    }

    /// Retrieve the `k` most relevant passages for `query`
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        let ranked = self.retrieve_ranked(query, k).await?;
        Ok(ranked.into_iter().map(|r| r.passage).collect())
    }

    /// Retrieve with the scores that placed each passage
    pub async fn retrieve_ranked(&self, query: &str, k: usize) -> Result<Vec<RankedPassage>, RetrievalError> {
        if k < 1 {
            return Err(RetrievalError::InvalidRequest("k must be at least 1".to_string()));
        }

        let candidates = self.provider.search(query).await?;
        let keywords = self.extractor.extract(query);
        debug!(
            candidates = candidates.len(),
            keywords = ?keywords,
            "similarity search returned"
        );

        let ranked = self.reranker.rerank(candidates, &keywords, k);

        let specific = ranked.iter().filter(|r| r.tier == RankTier::SpecificTerm).count();
        debug!(returned = ranked.len(), specific_hits = specific, "re-ranking complete");

        Ok(ranked)
    }

    pub fn reranker(&self) -> &HybridReRanker {
        &self.reranker
    }
}
