//! silabo-rag - Syllabus question answering over a local Ollama model
//!
//! Syllabi are split along their numbered sections, embedded with Ollama and
//! stored in Qdrant. Questions go through hybrid retrieval: similarity search
//! for candidates, then keyword re-ranking that promotes passages naming the
//! exact course or topic asked about.
//!
//! # Architecture
//!
//! - **rag**: keyword extraction, hybrid re-ranking, retrieval, prompt assembly
//! - **index**: Qdrant passage index and the similarity search provider
//! - **ingest**: syllabus loading and structured chunking
//! - **streaming**: Ollama client (embeddings, streamed generation)

pub mod errors;
pub mod config;
pub mod logging;

pub mod rag;
pub mod index;
pub mod ingest;
pub mod streaming;

// Command-line surface
pub mod cli;
pub mod doctor;

// Re-export commonly used types
pub use config::Config;
pub use errors::{AppError, ProviderError, Result, RetrievalError};
pub use rag::{HybridReRanker, HybridRetriever, KeywordExtractor, Passage, RagPipeline, SimilaritySearch};
