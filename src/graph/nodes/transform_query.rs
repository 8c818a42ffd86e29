// Transform Query Node
// Rewrites the question into a form better suited to retrieval

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{GraphState, StateUpdate, Step};

pub struct TransformQueryNode;

impl TransformQueryNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TransformQueryNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for TransformQueryNode {
    fn step(&self) -> Step {
        Step::TransformQuery
    }

    fn name(&self) -> &'static str {
        "Question Rewriter"
    }

    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let rewritten = ctx
            .services
            .rewriter
            .rewrite(&state.question)
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        tracing::info!("Transform query: {:?} -> {:?}", state.question, rewritten);

        Ok(NodeOutput::Continue(Some(StateUpdate::Question(rewritten))))
    }
}
