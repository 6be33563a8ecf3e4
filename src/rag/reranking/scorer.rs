// Keyword relevance scoring for retrieved passages
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::DEFAULT_SPECIFIC_TERMS;

/// Curated domain terms whose presence marks an exact-topic match
/// (fragments of course names such as "investigación operativa").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecificTermVocabulary {
    terms: HashSet<String>,
}

impl SpecificTermVocabulary {
    /// Build from arbitrary terms; terms are lowercased so they compare
    /// against extracted keywords
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.terms.contains(keyword)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for SpecificTermVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_SPECIFIC_TERMS)
    }
}

/// Keyword overlap between a passage and the query keywords
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywordScore {
    /// Fraction of keywords (with multiplicity) found in the passage, 0.0 to 1.0
    pub score: f64,
    /// A vocabulary keyword occurs in the passage
    pub specific_hit: bool,
}

impl KeywordScore {
    pub const NONE: KeywordScore = KeywordScore {
        score: 0.0,
        specific_hit: false,
    };
}

/// Scores passages by substring containment of query keywords.
///
/// A keyword sitting inside a longer unrelated word still counts.
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    vocabulary: SpecificTermVocabulary,
}

impl RelevanceScorer {
    pub fn new(vocabulary: SpecificTermVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Score passage content against the extracted keywords
    pub fn score(&self, content: &str, keywords: &[String]) -> KeywordScore {
        if keywords.is_empty() {
            return KeywordScore::NONE;
        }

        let content_lower = content.to_lowercase();

        let mut matches = 0usize;
        let mut specific_hit = false;
        for keyword in keywords {
            if content_lower.contains(keyword.as_str()) {
                matches += 1;
                specific_hit |= self.vocabulary.contains(keyword);
            }
        }

        KeywordScore {
            score: matches as f64 / keywords.len() as f64,
            specific_hit,
        }
    }

    pub fn vocabulary(&self) -> &SpecificTermVocabulary {
        &self.vocabulary
    }
}
