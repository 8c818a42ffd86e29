// Retrieval: splitting, embedding, storage and similarity search

pub mod context;
pub mod embedder;
pub mod ingest;
pub mod retriever;
pub mod splitter;
pub mod store;
pub mod vector_math;

pub use context::format_documents;
pub use embedder::Embedder;
pub use ingest::{IngestReport, Ingestor};
pub use retriever::VectorRetriever;
pub use splitter::TextSplitter;
pub use store::{MemoryVectorStore, VectorStore};
