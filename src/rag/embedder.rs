use std::sync::Arc;

use crate::core::errors::RagError;
use crate::llm::LlmProvider;

/// Embedding model bound to a provider, sending inputs in fixed-size batches
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn LlmProvider>,
    model: String,
    batch_size: usize,
}

impl Embedder {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, batch_size: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            batch_size: batch_size.max(1),
        }
    }

    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = self.provider.embed(batch, &self.model).await?;
            if vectors.len() != batch.len() {
                return Err(RagError::collaborator(
                    self.provider.name(),
                    format!("expected {} embeddings, got {}", batch.len(), vectors.len()),
                ));
            }
            embeddings.extend(vectors);
        }
        Ok(embeddings)
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.provider
            .embed(&[text.to_string()], &self.model)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RagError::collaborator(self.provider.name(), "no embedding returned"))
    }
}
