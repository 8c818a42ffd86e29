// Adaptive RAG Graph Module
// StateGraph-style runtime plus the fixed retrieval topology

pub mod builder;
pub mod checkpoint;
pub mod node;
pub mod runtime;
pub mod state;

pub mod nodes;

pub use builder::build_adaptive_rag_graph;
pub use checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore};
pub use node::{GraphError, GraphErrorKind, Node, NodeContext, NodeOutput};
pub use runtime::{EdgeDescription, GraphRuntime, RunOptions, RunOutcome, RunStatus};
pub use state::{
    BinaryJudgment, Condition, Datasource, Document, GraphState, Score, StateUpdate, Step,
};
