//! VectorStore trait: abstract interface for embedding storage backends.
//!
//! The bundled implementation is the brute-force `MemoryVectorStore`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::vector_math::rank_descending_by_cosine;
use crate::core::errors::RagError;
use crate::graph::state::Document;

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    /// Cosine similarity (higher = better).
    pub score: f32,
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert documents with their embedding vectors.
    async fn insert_batch(&self, items: Vec<(Document, Vec<f32>)>) -> Result<(), RagError>;

    /// The `limit` documents most similar to the query embedding.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, RagError>;

    async fn count(&self) -> Result<usize, RagError>;

    /// Swap the whole contents for `items` in one step. On error the
    /// previous contents stay in place.
    async fn replace_all(&self, items: Vec<(Document, Vec<f32>)>) -> Result<(), RagError>;

    async fn clear(&self) -> Result<(), RagError>;
}

#[derive(Default)]
struct Entries {
    documents: Vec<Document>,
    embeddings: Vec<Vec<f32>>,
}

/// Every embedding in `items` must be non-empty and share one length: the
/// store's current dimension when it holds vectors, else the first item's.
fn check_dimensions(
    stored: Option<usize>,
    items: &[(Document, Vec<f32>)],
) -> Result<(), RagError> {
    let Some(expected) = stored.or_else(|| items.first().map(|(_, e)| e.len())) else {
        return Ok(());
    };
    match items
        .iter()
        .find(|(_, embedding)| embedding.is_empty() || embedding.len() != expected)
    {
        Some((_, embedding)) => Err(RagError::InvalidInput(format!(
            "Embedding dimension {} does not match store dimension {}",
            embedding.len(),
            expected
        ))),
        None => Ok(()),
    }
}

/// In-memory store. Every search scores every stored vector.
#[derive(Default)]
pub struct MemoryVectorStore {
    entries: RwLock<Entries>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn insert_batch(&self, items: Vec<(Document, Vec<f32>)>) -> Result<(), RagError> {
        let mut entries = self.entries.write().await;
        check_dimensions(entries.embeddings.first().map(Vec::len), &items)?;
        for (document, embedding) in items {
            entries.documents.push(document);
            entries.embeddings.push(embedding);
        }
        Ok(())
    }

    async fn replace_all(&self, items: Vec<(Document, Vec<f32>)>) -> Result<(), RagError> {
        check_dimensions(None, &items)?;
        let (documents, embeddings) = items.into_iter().unzip();
        *self.entries.write().await = Entries {
            documents,
            embeddings,
        };
        Ok(())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredDocument>, RagError> {
        let entries = self.entries.read().await;
        if entries.embeddings.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let ranked = rank_descending_by_cosine(query_embedding, &entries.embeddings)?;
        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(idx, score)| ScoredDocument {
                document: entries.documents[idx].clone(),
                score,
            })
            .collect())
    }

    async fn count(&self) -> Result<usize, RagError> {
        Ok(self.entries.read().await.documents.len())
    }

    async fn clear(&self) -> Result<(), RagError> {
        let mut entries = self.entries.write().await;
        entries.documents.clear();
        entries.embeddings.clear();
        Ok(())
    }
}
