// Retrievable unit of syllabus text
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the origin document
pub const SOURCE_KEY: &str = "source";

/// Immutable chunk of a source document as stored in the index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
}

impl Passage {
    pub fn new(id: impl Into<String>, content: impl Into<String>, source: impl Into<String>) -> Self {
        let mut metadata = Map::new();
        metadata.insert(SOURCE_KEY.to_string(), Value::String(source.into()));
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Origin document identifier, usually a file path
    pub fn source_id(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }

    /// File name of the origin document, for citations
    pub fn source_label(&self) -> &str {
        match self.source_id() {
            Some(source) => source.rsplit(['/', '\\']).next().unwrap_or(source),
            None => "Desconocida",
        }
    }
}
