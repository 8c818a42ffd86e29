//! External collaborators consumed by the graph nodes.
//!
//! Every suspension point of a run is a call through one of these traits.
//! Implementations backed by language models live in [`crate::chains`],
//! vector retrieval in [`crate::rag`] and web search in [`crate::tools`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::RagError;
use crate::graph::state::{BinaryJudgment, Datasource, Document};

/// Named template variables passed to judgment and generation models.
pub type PromptVars = HashMap<String, String>;

/// Variable names shared by the prompt templates and the nodes filling them.
pub mod vars {
    pub const QUESTION: &str = "question";
    pub const CONTENT: &str = "content";
    pub const CONTEXT: &str = "context";
    pub const GENERATION: &str = "generation";
}

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<Vec<Document>, RagError>;
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Returns the serialized search results.
    async fn search(&self, question: &str) -> Result<String, RagError>;
}

#[async_trait]
pub trait JudgmentModel: Send + Sync {
    async fn classify(&self, vars: &PromptVars) -> Result<BinaryJudgment, RagError>;
}

#[async_trait]
pub trait RoutingModel: Send + Sync {
    async fn route(&self, question: &str) -> Result<Datasource, RagError>;
}

#[async_trait]
pub trait GenerationModel: Send + Sync {
    async fn generate(&self, vars: &PromptVars) -> Result<String, RagError>;
}

#[async_trait]
pub trait RewriteModel: Send + Sync {
    async fn rewrite(&self, question: &str) -> Result<String, RagError>;
}

/// Everything a run needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub router: Arc<dyn RoutingModel>,
    pub retriever: Arc<dyn Retriever>,
    pub web_search: Arc<dyn WebSearch>,
    pub relevance_grader: Arc<dyn JudgmentModel>,
    pub hallucination_grader: Arc<dyn JudgmentModel>,
    pub answer_grader: Arc<dyn JudgmentModel>,
    pub generator: Arc<dyn GenerationModel>,
    pub rewriter: Arc<dyn RewriteModel>,
}

/// Builds a [`PromptVars`] map from `(name, value)` pairs.
pub fn prompt_vars<const N: usize>(pairs: [(&str, &str); N]) -> PromptVars {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}
