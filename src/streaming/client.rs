//! Ollama API client
//!
//! Embeddings (`POST /api/embed`) for indexing and querying, and streamed
//! completions (`POST /api/generate`) for answers.

use crate::errors::{AppError, Result};
use crate::streaming::parser::{GenerateChunk, LineParser};
use futures_util::{stream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3.1";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ollama HTTP client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    embedding_model: String,
    temperature: f32,
    request_timeout: Duration,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create Ollama client with custom endpoint and model; the same model
    /// produces embeddings unless [`with_embedding_model`](Self::with_embedding_model) is used
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(AppError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            embedding_model: model.to_string(),
            temperature: 0.3,
            request_timeout: Duration::from_secs(120),
        })
    }

    /// Build from the `[ollama]` config section
    pub fn from_config(config: &crate::config::OllamaConfig) -> Result<Self> {
        Ok(Self::with_config(&config.url, &config.model)?
            .with_embedding_model(&config.embedding_model)
            .with_temperature(config.temperature)
            .with_timeout(Duration::from_secs(config.timeout_secs)))
    }

    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Timeout for embedding requests
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Embed texts, one vector per input in input order
    pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        let request = OllamaEmbedRequest {
            model: &self.embedding_model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .timeout(self.request_timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::OllamaApiError(format!("Failed to send embed request: {}", e)))?;

        let response = Self::check_status(response).await?;

        let body: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| AppError::OllamaApiError(format!("Failed to parse embeddings: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(AppError::OllamaApiError(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }

        debug!(count = texts.len(), model = %self.embedding_model, "embedded texts");
        Ok(body.embeddings)
    }

    /// Generate a streamed completion, one item per decoded line
    pub async fn generate_stream(
        &self,
        prompt: String,
    ) -> Result<impl Stream<Item = Result<GenerateChunk>>> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaGenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: true,
            options: Some(serde_json::json!({ "temperature": self.temperature })),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::OllamaApiError(format!("Failed to send request: {}", e)))?;

        let response = Self::check_status(response).await?;

        // `None` state ends the stream; the parser is flushed once the body is exhausted
        let state = Some((Box::pin(response.bytes_stream()), LineParser::new()));
        let chunks = stream::unfold(state, |state| async move {
            let (mut bytes, mut parser) = state?;
            let items: Vec<Result<GenerateChunk>> = match bytes.next().await {
                Some(Ok(data)) => {
                    let items = match parser.add_bytes(&data) {
                        Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                        Err(e) => vec![Err(e)],
                    };
                    return Some((items, Some((bytes, parser))));
                }
                Some(Err(e)) => vec![Err(AppError::StreamingError(e.to_string()))],
                None => parser.finish().transpose().into_iter().collect(),
            };
            Some((items, None))
        })
        .flat_map(stream::iter);

        Ok(chunks)
    }

    /// Generate a completion, handing each token to `on_token` as it arrives
    pub async fn generate_with<F>(&self, prompt: String, mut on_token: F) -> Result<String>
    where
        F: FnMut(&str) + Send,
    {
        let mut chunks = Box::pin(self.generate_stream(prompt).await?);
        let mut answer = String::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if let Some(error) = chunk.error {
                return Err(AppError::OllamaApiError(error));
            }
            on_token(&chunk.response);
            answer.push_str(&chunk.response);
            if chunk.done {
                break;
            }
        }

        Ok(answer)
    }

    /// Generate a completion and return the full text
    pub async fn generate(&self, prompt: String) -> Result<String> {
        self.generate_with(prompt, |_| {}).await
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).timeout(CONNECT_TIMEOUT).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .timeout(CONNECT_TIMEOUT)
            .send()
            .await
            .map_err(|e| AppError::OllamaApiError(format!("Failed to list models: {}", e)))?;

        let response = Self::check_status(response).await?;

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| AppError::OllamaApiError(format!("Failed to parse models: {}", e)))?;

        Ok(models_response.models.into_iter().map(|m| m.name).collect())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(AppError::OllamaApiError(format!("HTTP {}: {}", status, error_text)))
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Ollama generate request
#[derive(Debug, Clone, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Ollama models list response
#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

/// Model information
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OllamaConfig;

    #[test]
    fn test_client_creation() {
        let client = OllamaClient::new().unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.embedding_model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn test_client_from_config() {
        let config = OllamaConfig {
            url: "http://localhost:11434/".to_string(),
            model: "mistral".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            temperature: 0.0,
            timeout_secs: 5,
        };
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "mistral");
        assert_eq!(client.embedding_model(), "nomic-embed-text");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_embed_empty_input_skips_request() {
        // unroutable port: a request would fail
        let client = OllamaClient::with_config("http://127.0.0.1:9", "llama3.1").unwrap();
        assert!(client.embed(&[]).await.unwrap().is_empty());
    }

    /// Serves one HTTP response with `body` to the first request, after
    /// reading the full request
    async fn serve_once(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_generate_keeps_last_line_without_newline() {
        let url = serve_once(
            "{\"response\":\"Cuatro \",\"done\":false}\n{\"response\":\"créditos.\",\"done\":true}",
        )
        .await;
        let client = OllamaClient::with_config(&url, "llama3.1").unwrap();

        assert_eq!(client.generate("¿créditos?".to_string()).await.unwrap(), "Cuatro créditos.");
    }

    #[tokio::test]
    async fn test_generate_reports_error_in_last_line() {
        let url = serve_once("{\"response\":\"\",\"done\":true,\"error\":\"model not found\"}").await;
        let client = OllamaClient::with_config(&url, "llama3.1").unwrap();

        let err = client.generate("hola".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::OllamaApiError(ref msg) if msg == "model not found"));
    }

    #[tokio::test]
    async fn test_answer_generator_streams_borrowed_tokens() {
        use crate::rag::pipeline::AnswerGenerator;

        let url = serve_once("{\"response\":\"Ética \",\"done\":false}\n{\"response\":\"II\",\"done\":true}\n").await;
        let client = OllamaClient::with_config(&url, "llama3.1").unwrap();

        let mut tokens: Vec<String> = Vec::new();
        let answer = AnswerGenerator::generate(&client, "curso".to_string(), &mut |t: &str| {
            tokens.push(t.to_string())
        })
        .await
        .unwrap();

        assert_eq!(answer, "Ética II");
        assert_eq!(tokens, vec!["Ética ", "II"]);
    }

    #[test]
    fn test_generate_request_serialization() {
        let request = OllamaGenerateRequest {
            model: "llama3.1".to_string(),
            prompt: "hola".to_string(),
            stream: true,
            options: Some(serde_json::json!({ "temperature": 0.3 })),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], true);
        assert!(json["options"]["temperature"].is_number());
    }

    #[test]
    fn test_embed_response_parsing() {
        let body: OllamaEmbedResponse =
            serde_json::from_str(r#"{"model":"llama3.1","embeddings":[[0.1,0.2],[0.3,0.4]]}"#).unwrap();
        assert_eq!(body.embeddings.len(), 2);
        assert_eq!(body.embeddings[1], vec![0.3, 0.4]);
    }
}
