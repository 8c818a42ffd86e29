use std::path::PathBuf;
use std::sync::Arc;

use crate::chains::build_collaborators;
use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::core::errors::RagError;
use crate::graph::MemoryCheckpointStore;
use crate::llm::{build_provider, LlmProvider};
use crate::rag::{Embedder, IngestReport, Ingestor, MemoryVectorStore, TextSplitter, VectorRetriever, VectorStore};
use crate::service::RagService;
use crate::tools::WebSearchClient;

pub mod error;

use error::InitializationError;

/// Global application state shared across all routes and background tasks.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: ConfigService,
    pub settings: Settings,
    pub provider: Arc<dyn LlmProvider>,
    pub store: Arc<dyn VectorStore>,
    pub ingestor: Arc<Ingestor>,
    pub rag: Arc<RagService>,
}

impl AppState {
    /// Initializes the application state.
    ///
    /// Loads and validates configuration, connects the LLM provider and web
    /// search, wires the retrieval pipeline over an in-memory vector store
    /// and builds the graph.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let settings = config
            .load_settings()
            .map_err(|e| InitializationError::Config(e.into()))?;

        let provider =
            build_provider(&settings.llm).map_err(|e| InitializationError::Llm(e.into()))?;
        if !provider.health_check().await.unwrap_or(false) {
            tracing::warn!(
                "LLM provider {} at {} is not reachable yet",
                provider.name(),
                settings.llm.base_url
            );
        }

        let web_search = Arc::new(
            WebSearchClient::from_settings(&settings.search)
                .map_err(|e| InitializationError::Search(e.into()))?,
        );

        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let embedder = Embedder::new(
            provider.clone(),
            settings.llm.embedding_model.clone(),
            settings.retrieval.embed_batch_size,
        );
        let splitter = TextSplitter::new(settings.retrieval.chunk_size, settings.retrieval.chunk_overlap)
            .map_err(|e| InitializationError::Retrieval(e.into()))?;
        let ingestor = Arc::new(Ingestor::new(splitter, embedder.clone(), store.clone()));
        let retriever = Arc::new(VectorRetriever::new(
            embedder,
            store.clone(),
            settings.retrieval.top_k,
        ));

        let services = build_collaborators(provider.clone(), &settings.llm, retriever, web_search)
            .map_err(|e| InitializationError::Graph(e.into()))?;
        let rag = Arc::new(
            RagService::from_settings(&settings, services, Arc::new(MemoryCheckpointStore::new()))
                .map_err(|e| InitializationError::Graph(e.into()))?,
        );

        Ok(Arc::new(AppState {
            paths,
            config,
            settings,
            provider,
            store,
            ingestor,
            rag,
        }))
    }

    /// Configured source directories, relative entries resolved against the
    /// project root
    pub fn source_dirs(&self) -> Vec<PathBuf> {
        self.settings
            .retrieval
            .source_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    self.paths.project_root.join(dir)
                }
            })
            .collect()
    }

    pub async fn ingest(&self) -> Result<IngestReport, RagError> {
        let dirs = self.source_dirs();
        if dirs.is_empty() {
            tracing::warn!("No retrieval.source_dirs configured; vector store stays empty");
            return Ok(IngestReport::default());
        }
        self.ingestor
            .ingest_directories(&dirs, &self.settings.retrieval.extensions)
            .await
    }
}
