use thiserror::Error;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("Failed to initialize web search: {0}")]
    Search(#[source] anyhow::Error),

    #[error("Failed to initialize retrieval pipeline: {0}")]
    Retrieval(#[source] anyhow::Error),

    #[error("Failed to build adaptive RAG graph: {0}")]
    Graph(#[source] anyhow::Error),
}
