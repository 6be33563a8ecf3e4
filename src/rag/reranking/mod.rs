// Re-ranking of similarity search candidates
pub mod hybrid;
pub mod scorer;

pub use hybrid::{HybridReRanker, RankTier, RankedPassage, KEYWORD_WEIGHT, SPECIFIC_HIT_OFFSET};
pub use scorer::{KeywordScore, RelevanceScorer, SpecificTermVocabulary};
