//! Syllabus document loading
//!
//! Reads PDF (via pdf-extract) and plain-text files from a directory.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Raw text of one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path the text came from, used as the passage source
    pub source: String,
    pub text: String,
}

/// Loads every supported file of a syllabus directory
#[derive(Debug, Clone, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load `*.pdf`, `*.txt` and `*.md` files in path order. PDFs without
    /// extractable text are skipped with a warning.
    pub fn load_dir(&self, dir: &Path) -> Result<Vec<SourceDocument>> {
        if !dir.is_dir() {
            bail!("Syllabus directory not found: {}", dir.display());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && Self::is_supported(path))
            .collect();
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match self.load_file(&path) {
                Ok(doc) if doc.text.is_empty() => {
                    warn!(path = %path.display(), "no extractable text, skipping");
                }
                Ok(doc) => {
                    debug!(path = %path.display(), chars = doc.text.len(), "loaded document");
                    documents.push(doc);
                }
                Err(e) if Self::extension(&path) == "pdf" => {
                    warn!(path = %path.display(), error = %e, "unreadable PDF, skipping");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(documents)
    }

    /// Load a single file
    pub fn load_file(&self, path: &Path) -> Result<SourceDocument> {
        let raw = match Self::extension(path).as_str() {
            "pdf" => {
                let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
                pdf_extract::extract_text_from_mem(&bytes)
                    .with_context(|| format!("Failed to extract text from {}", path.display()))?
            }
            _ => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?,
        };

        Ok(SourceDocument {
            source: path.display().to_string(),
            text: clean_text(&raw),
        })
    }

    fn is_supported(path: &Path) -> bool {
        matches!(Self::extension(path).as_str(), "pdf" | "txt" | "md")
    }

    fn extension(path: &Path) -> String {
        path.extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }
}

/// Trim every line and collapse runs of blank lines into one
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .fold(Vec::new(), |mut acc: Vec<&str>, line| {
            if !line.is_empty() || acc.last().is_some_and(|l| !l.is_empty()) {
                acc.push(line);
            }
            acc
        })
        .join("\n")
        .trim()
        .to_string()
}
