// Retrieve Node
// Fetches candidate passages for the current question

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{GraphState, StateUpdate, Step};

pub struct RetrieveNode;

impl RetrieveNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RetrieveNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RetrieveNode {
    fn step(&self) -> Step {
        Step::Retrieve
    }

    fn name(&self) -> &'static str {
        "Retriever"
    }

    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let documents = ctx
            .services
            .retriever
            .retrieve(&state.question)
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        tracing::info!("Retrieve: {} documents", documents.len());

        Ok(NodeOutput::Continue(Some(StateUpdate::Documents(documents))))
    }
}
