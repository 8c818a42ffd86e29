// Decide Node
// Chooses between answering and rewriting the question

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{Condition, Document, GraphState, Step};

/// Generate when at least one graded document survived, otherwise rewrite.
pub fn decide_to_generate(documents: &[Document]) -> Condition {
    if documents.is_empty() {
        Condition::NoRelevantDocuments
    } else {
        Condition::DocumentsRelevant
    }
}

pub struct DecideNode;

impl DecideNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DecideNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for DecideNode {
    fn step(&self) -> Step {
        Step::Decide
    }

    fn name(&self) -> &'static str {
        "Decide To Generate"
    }

    async fn execute(
        &self,
        state: &GraphState,
        _ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let condition = decide_to_generate(&state.documents);
        match condition {
            Condition::NoRelevantDocuments => {
                tracing::info!("Decision: no relevant documents, transforming query")
            }
            _ => tracing::info!("Decision: generate from {} documents", state.documents.len()),
        }
        Ok(NodeOutput::Branch(condition))
    }
}
