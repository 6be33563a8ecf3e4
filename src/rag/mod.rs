// Retrieval-augmented answering over syllabus passages
//
// - keywords / reranking: lexical evidence blended with semantic rank
// - retrieval: similarity search followed by hybrid re-ranking
// - context / pipeline: prompt assembly and answer generation

pub mod context;
pub mod keywords;
pub mod passage;
pub mod pipeline;
pub mod reranking;
pub mod retrieval;

// Re-export key types
pub use context::{AssembledContext, ContextBuilder, PromptTemplate};
pub use keywords::KeywordExtractor;
pub use passage::Passage;
pub use pipeline::{AnswerGenerator, RagAnswer, RagPipeline};
pub use reranking::{HybridReRanker, RankTier, RankedPassage, RelevanceScorer, SpecificTermVocabulary};
pub use retrieval::{HybridRetriever, SimilaritySearch};
