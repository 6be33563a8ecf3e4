//! Error types for silabo-rag
//!
//! Two layers: [`RetrievalError`] is the narrow taxonomy of the hybrid
//! retriever, [`AppError`] covers the Ollama client and the glue around it.
//! Ingestion, indexing and configuration report through `anyhow`.

use thiserror::Error;

/// Boxed cause carried by provider failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a similarity search provider
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl ProviderError {
    /// Provider failure with only a description
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Provider failure wrapping an underlying error
    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AppError> for ProviderError {
    fn from(err: AppError) -> Self {
        ProviderError::with_cause("similarity search failed", err)
    }
}

/// Errors surfaced by the hybrid retriever
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The similarity search provider failed or timed out
    #[error("Retrieval unavailable: {source}")]
    RetrievalUnavailable {
        #[source]
        source: ProviderError,
    },

    /// Rejected before any external call
    #[error("Invalid retrieval request: {0}")]
    InvalidRequest(String),
}

impl From<ProviderError> for RetrievalError {
    fn from(source: ProviderError) -> Self {
        RetrievalError::RetrievalUnavailable { source }
    }
}

/// Main error type for the assistant
#[derive(Error, Debug)]
pub enum AppError {
    /// Retrieval failures
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Streaming errors
    #[error("Streaming error: {0}")]
    StreamingError(String),

    /// JSON parsing errors
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    /// Ollama API errors
    #[error("Ollama API error: {0}")]
    OllamaApiError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Convert anyhow errors to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Generic(format!("{:#}", err))
    }
}
