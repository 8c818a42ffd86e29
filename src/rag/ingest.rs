// Directory ingestion: load text files, split, embed, store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use super::embedder::Embedder;
use super::splitter::TextSplitter;
use super::store::VectorStore;
use crate::core::errors::RagError;
use crate::graph::state::Document;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub files: usize,
    pub chunks: usize,
    pub skipped: Vec<String>,
}

/// Recursively load every file under `dir` whose extension is listed.
/// Files are returned in path order; unreadable or non-UTF-8 files are
/// reported in the second element and skipped.
pub fn load_directory(
    dir: &Path,
    extensions: &[String],
) -> Result<(Vec<Document>, Vec<String>), RagError> {
    let mut paths = Vec::new();
    collect_files(dir, extensions, &mut paths)?;
    paths.sort();

    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                documents.push(
                    Document::new(content).with_metadata("source", path.display().to_string()),
                );
            }
            Ok(_) => tracing::debug!("Skipping empty file {}", path.display()),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                skipped.push(path.display().to_string());
            }
        }
    }
    Ok((documents, skipped))
}

fn collect_files(dir: &Path, extensions: &[String], out: &mut Vec<PathBuf>) -> Result<(), RagError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        RagError::InvalidInput(format!("Cannot read directory {}: {}", dir.display(), e))
    })?;
    for entry in entries {
        let path = entry.map_err(RagError::internal)?.path();
        if path.is_dir() {
            collect_files(&path, extensions, out)?;
        } else if has_extension(&path, extensions) {
            out.push(path);
        }
    }
    Ok(())
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

pub struct Ingestor {
    splitter: TextSplitter,
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
    // held for the whole of a directory re-ingest
    running: Mutex<()>,
}

impl Ingestor {
    pub fn new(splitter: TextSplitter, embedder: Embedder, store: Arc<dyn VectorStore>) -> Self {
        Self {
            splitter,
            embedder,
            store,
            running: Mutex::new(()),
        }
    }

    async fn embed_chunks(
        &self,
        documents: &[Document],
    ) -> Result<Vec<(Document, Vec<f32>)>, RagError> {
        let chunks = self.splitter.split_documents(documents);
        if chunks.is_empty() {
            return Ok(Vec::new());
        }
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_documents(&texts).await?;
        Ok(chunks.into_iter().zip(embeddings).collect())
    }

    /// Add `documents` to the store without touching what is already there
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<usize, RagError> {
        let items = self.embed_chunks(documents).await?;
        let count = items.len();
        if count > 0 {
            self.store.insert_batch(items).await?;
        }
        Ok(count)
    }

    /// Replace the store contents with the files found under `dirs`.
    ///
    /// Everything is embedded before the store is touched, so a failure
    /// leaves the previous index searchable. Concurrent calls run one
    /// after the other.
    pub async fn ingest_directories(
        &self,
        dirs: &[PathBuf],
        extensions: &[String],
    ) -> Result<IngestReport, RagError> {
        let _running = self.running.lock().await;
        let dirs = dirs.to_vec();
        let extensions = extensions.to_vec();
        let (documents, skipped) = tokio::task::spawn_blocking(move || {
            let mut documents = Vec::new();
            let mut skipped = Vec::new();
            for dir in &dirs {
                let (docs, bad) = load_directory(dir, &extensions)?;
                documents.extend(docs);
                skipped.extend(bad);
            }
            Ok::<_, RagError>((documents, skipped))
        })
        .await
        .map_err(RagError::internal)??;

        let items = self.embed_chunks(&documents).await?;
        let chunks = items.len();
        self.store.replace_all(items).await?;
        tracing::info!(
            "Ingested {} files into {} chunks ({} skipped)",
            documents.len(),
            chunks,
            skipped.len()
        );

        Ok(IngestReport {
            files: documents.len(),
            chunks,
            skipped,
        })
    }
}
