//! Incremental parser for Ollama's newline-delimited JSON stream
//!
//! Network chunks do not respect line boundaries: a chunk may end in the
//! middle of a JSON object or carry several objects. The parser buffers
//! bytes until a newline arrives and decodes each complete line.

use serde::Deserialize;

use crate::errors::{AppError, Result};

/// Maximum bytes buffered for a single line (1MB)
pub const MAX_LINE_SIZE: usize = 1_048_576;

/// One line of a `/api/generate` stream
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Line-buffering NDJSON parser
#[derive(Debug)]
pub struct LineParser {
    buffer: Vec<u8>,
    max_line_size: usize,
}

impl LineParser {
    /// Create new parser with default settings
    pub fn new() -> Self {
        Self::with_capacity(MAX_LINE_SIZE)
    }

    /// Create parser with custom line limit
    pub fn with_capacity(max_line_size: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            max_line_size,
        }
    }

    /// Add bytes and return every chunk completed by them
    pub fn add_bytes(&mut self, bytes: &[u8]) -> Result<Vec<GenerateChunk>> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(chunk) = Self::decode(&line)? {
                chunks.push(chunk);
            }
        }

        if self.buffer.len() > self.max_line_size {
            return Err(AppError::JsonParseError(format!(
                "Line exceeds maximum of {} bytes",
                self.max_line_size
            )));
        }

        Ok(chunks)
    }

    /// Decode whatever is left once the stream ends
    pub fn finish(&mut self) -> Result<Option<GenerateChunk>> {
        let rest = std::mem::take(&mut self.buffer);
        Self::decode(&rest)
    }

    fn decode(line: &[u8]) -> Result<Option<GenerateChunk>> {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        serde_json::from_str(text)
            .map(Some)
            .map_err(|e| AppError::JsonParseError(format!("{}: {}", e, text)))
    }

    /// Bytes waiting for a newline
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}
