// Hybrid re-ranking: semantic position blended with keyword overlap
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::rag::passage::Passage;
use crate::rag::reranking::scorer::{KeywordScore, RelevanceScorer};

/// Offset reported for specific-term hits; ordering itself uses [`RankTier`]
pub const SPECIFIC_HIT_OFFSET: f64 = 1000.0;

/// Weight of the keyword score in the semantic tier
pub const KEYWORD_WEIGHT: f64 = 0.5;

/// Ranking tier. Every `SpecificTerm` candidate precedes every `Semantic` one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RankTier {
    Semantic,
    SpecificTerm,
}

/// Passage with the scores that placed it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPassage {
    pub passage: Passage,
    /// 0-based position in the similarity search output
    pub semantic_rank: usize,
    pub keyword_score: f64,
    pub tier: RankTier,
    /// Score within the tier
    pub tier_score: f64,
}

impl RankedPassage {
    fn new(passage: Passage, semantic_rank: usize, keyword: KeywordScore) -> Self {
        let (tier, tier_score) = if keyword.specific_hit {
            (RankTier::SpecificTerm, keyword.score)
        } else {
            (
                RankTier::Semantic,
                1.0 / (semantic_rank as f64 + 1.0) + KEYWORD_WEIGHT * keyword.score,
            )
        };

        Self {
            passage,
            semantic_rank,
            keyword_score: keyword.score,
            tier,
            tier_score,
        }
    }

    /// Single composite score: `1000 + kw` for specific hits,
    /// `1/(rank+1) + 0.5 * kw` otherwise
    pub fn final_score(&self) -> f64 {
        match self.tier {
            RankTier::SpecificTerm => SPECIFIC_HIT_OFFSET + self.tier_score,
            RankTier::Semantic => self.tier_score,
        }
    }

    fn cmp_desc(&self, other: &Self) -> Ordering {
        other
            .tier
            .cmp(&self.tier)
            .then_with(|| other.tier_score.total_cmp(&self.tier_score))
    }
}

/// Re-orders similarity search candidates using keyword evidence.
///
/// Pure and synchronous; the caller fetches candidates and extracts keywords.
#[derive(Debug, Clone, Default)]
pub struct HybridReRanker {
    scorer: RelevanceScorer,
}

impl HybridReRanker {
    pub fn new(scorer: RelevanceScorer) -> Self {
        Self { scorer }
    }

    /// Rank `candidates` (in similarity order) and keep the best `k`.
    ///
    /// With no keywords the similarity order is returned untouched.
    /// Ties keep similarity order (`sort_by` is stable).
    pub fn rerank(&self, candidates: Vec<Passage>, keywords: &[String], k: usize) -> Vec<RankedPassage> {
        if keywords.is_empty() {
            return candidates
                .into_iter()
                .take(k)
                .enumerate()
                .map(|(i, passage)| RankedPassage::new(passage, i, KeywordScore::NONE))
                .collect();
        }

        let mut ranked: Vec<RankedPassage> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, passage)| {
                let keyword = self.scorer.score(&passage.content, keywords);
                RankedPassage::new(passage, i, keyword)
            })
            .collect();

        ranked.sort_by(RankedPassage::cmp_desc);
        ranked.truncate(k);
        ranked
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }
}
