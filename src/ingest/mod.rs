//! Syllabus ingestion: load files, chunk them along their sections, index
//! the passages.

pub mod chunker;
pub mod loader;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::index::{Embedder, PassageIndex};

pub use chunker::StructuredChunker;
pub use loader::{DocumentLoader, SourceDocument};

/// Outcome of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    pub documents: usize,
    pub passages: usize,
}

/// Load, chunk, embed and store every syllabus under `dir`.
/// `on_progress(stored, total)` is called after each stored batch.
pub async fn ingest_dir<F>(
    dir: &Path,
    chunker: &StructuredChunker,
    index: &PassageIndex,
    embedder: &dyn Embedder,
    batch_size: usize,
    mut on_progress: F,
) -> Result<IngestReport>
where
    F: FnMut(usize, usize),
{
    let documents = DocumentLoader::new().load_dir(dir)?;
    info!(documents = documents.len(), dir = %dir.display(), "loaded syllabi");

    let passages = chunker.chunk_all(&documents);
    info!(passages = passages.len(), "structured chunking complete");

    let total = passages.len();
    let stored = index
        .add_passages(embedder, &passages, batch_size, |stored| on_progress(stored, total))
        .await
        .with_context(|| format!("Failed to index passages into {}", index.collection()))?;

    Ok(IngestReport {
        documents: documents.len(),
        passages: stored,
    })
}
