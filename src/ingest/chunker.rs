//! Structure-aware chunking of syllabi
//!
//! Syllabi are organised in Roman-numeral sections ("I. DATOS GENERALES",
//! "VI. EVALUACIÓN", ...). Chunks follow those sections so an evaluation
//! formula or a weekly schedule stays in one passage. Oversized sections are
//! split again at numbered items ("1.", "2)").

use regex::Regex;
use serde_json::Value;

use crate::config::IngestConfig;
use crate::ingest::loader::SourceDocument;
use crate::rag::passage::Passage;

/// Splits documents into passages along their section structure
#[derive(Debug, Clone)]
pub struct StructuredChunker {
    section_header: Regex,
    numbered_item: Regex,
    min_chars: usize,
    max_chars: usize,
}

impl StructuredChunker {
    /// `min_chars`: shorter sections are dropped. `max_chars`: longer
    /// sections are split at numbered items.
    pub fn new(min_chars: usize, max_chars: usize) -> Self {
        Self {
            section_header: Regex::new(r"(?m)^([IVX]+)\.\s").expect("valid section regex"),
            numbered_item: Regex::new(r"(?m)^\d+[.)]\s").expect("valid item regex"),
            min_chars,
            max_chars,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.min_section_chars, config.max_section_chars)
    }

    /// Chunk one document. Ids are derived from the source and chunk
    /// position, so re-ingesting a file overwrites its points. Passages carry `source`, `chunk_index` and, when
    /// the passage starts a section, `section` (the Roman numeral).
    pub fn chunk(&self, doc: &SourceDocument) -> Vec<Passage> {
        let mut pieces: Vec<&str> = Vec::new();

        for section in split_at_matches(&doc.text, &self.section_header) {
            if char_len(section.trim()) < self.min_chars {
                continue;
            }

            if char_len(section) > self.max_chars {
                pieces.extend(
                    split_at_matches(section, &self.numbered_item)
                        .into_iter()
                        .filter(|sub| char_len(sub.trim()) > self.min_chars),
                );
            } else {
                pieces.push(section);
            }
        }

        pieces
            .into_iter()
            .enumerate()
            .map(|(i, piece)| {
                let content = piece.trim();
                let mut passage = Passage::new(passage_id(&doc.source, i), content, doc.source.clone())
                    .with_metadata("chunk_index", i as u64);
                if let Some(caps) = self.section_header.captures(content) {
                    if caps.get(0).map(|m| m.start()) == Some(0) {
                        passage = passage.with_metadata("section", Value::String(caps[1].to_string()));
                    }
                }
                passage
            })
            .collect()
    }

    /// Chunk several documents, keeping document order
    pub fn chunk_all(&self, docs: &[SourceDocument]) -> Vec<Passage> {
        docs.iter().flat_map(|doc| self.chunk(doc)).collect()
    }
}

impl Default for StructuredChunker {
    fn default() -> Self {
        Self::from_config(&IngestConfig::default())
    }
}

/// Split `text` so every match of `pattern` starts a new piece
fn split_at_matches<'a>(text: &'a str, pattern: &Regex) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for m in pattern.find_iter(text) {
        if m.start() > start {
            pieces.push(&text[start..m.start()]);
        }
        start = m.start();
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

/// Name-based UUID for the `index`-th chunk of `source`
fn passage_id(source: &str, index: usize) -> String {
    uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, format!("{}#{}", source, index).as_bytes()).to_string()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
