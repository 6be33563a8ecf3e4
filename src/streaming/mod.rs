//! Ollama client module
//!
//! Provides the Ollama API client and the incremental NDJSON parser.

pub mod client;
pub mod parser;

// Re-export commonly used types
pub use client::{OllamaClient, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
pub use parser::{GenerateChunk, LineParser, MAX_LINE_SIZE};
