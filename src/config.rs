//! Configuration management for silabo-rag
//!
//! TOML file at `~/.silabo-rag/config.toml`, created with defaults on first load.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::LoggingConfig;

/// Terms that signal an exact course-name match
pub const DEFAULT_SPECIFIC_TERMS: &[&str] = &[
    "investigación",
    "operativa",
    "ética",
    "deontología",
    "redes",
    "comunicaciones",
    "gestión",
    "calidad",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ollama connection and model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:11434".to_string(),
            model: "llama3.1".to_string(),
            embedding_model: "llama3.1".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
        }
    }
}

/// Qdrant location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub qdrant_url: String,
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "silabus_collection".to_string(),
        }
    }
}

/// Hybrid retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages requested from the similarity search
    pub candidate_count: usize,
    /// Passages kept after re-ranking
    pub top_k: usize,
    pub specific_terms: Vec<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_count: 15,
            top_k: 10,
            specific_terms: DEFAULT_SPECIFIC_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Document loading and chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub syllabus_dir: PathBuf,
    pub min_section_chars: usize,
    pub max_section_chars: usize,
    pub batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            syllabus_dir: PathBuf::from("silabus"),
            min_section_chars: 50,
            max_section_chars: 3000,
            batch_size: 16,
        }
    }
}

/// Presentation of retrieved context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub show_sources: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { show_sources: true }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating it if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        fs::write(path, self.to_toml()?).context("Failed to write config file")?;

        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".silabo-rag").join("config.toml"))
    }

    /// Reject settings the retriever and chunker cannot honor
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.top_k < 1 {
            bail!("retrieval.top_k must be at least 1");
        }
        if r.candidate_count < r.top_k {
            bail!(
                "retrieval.candidate_count ({}) must be >= retrieval.top_k ({})",
                r.candidate_count,
                r.top_k
            );
        }

        let i = &self.ingest;
        if i.min_section_chars >= i.max_section_chars {
            bail!(
                "ingest.min_section_chars ({}) must be < ingest.max_section_chars ({})",
                i.min_section_chars,
                i.max_section_chars
            );
        }
        if i.batch_size < 1 {
            bail!("ingest.batch_size must be at least 1");
        }

        Ok(())
    }
}
