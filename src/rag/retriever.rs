use std::sync::Arc;

use async_trait::async_trait;

use super::embedder::Embedder;
use super::store::VectorStore;
use crate::collaborators::Retriever;
use crate::core::errors::RagError;
use crate::graph::state::Document;

/// Similarity-search retriever over a vector store
pub struct VectorRetriever {
    embedder: Embedder,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(embedder: Embedder, store: Arc<dyn VectorStore>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, RagError> {
        let query = self.embedder.embed_query(question).await?;
        let hits = self.store.search(&query, self.top_k).await?;
        tracing::debug!(
            "Retrieved {} chunks (best score {:?})",
            hits.len(),
            hits.first().map(|h| h.score)
        );
        Ok(hits.into_iter().map(|hit| hit.document).collect())
    }
}
