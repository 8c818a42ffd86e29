// Generate Node
// Produces an answer grounded in the current documents

use async_trait::async_trait;

use crate::collaborators::{prompt_vars, vars};
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{GraphState, StateUpdate, Step};
use crate::rag::context::format_documents;

pub struct GenerateNode;

impl GenerateNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenerateNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GenerateNode {
    fn step(&self) -> Step {
        Step::Generate
    }

    fn name(&self) -> &'static str {
        "Generator"
    }

    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let context = format_documents(&state.documents);
        let generation = ctx
            .services
            .generator
            .generate(&prompt_vars([
                (vars::QUESTION, state.question.as_str()),
                (vars::CONTEXT, context.as_str()),
            ]))
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        tracing::info!(
            "Generate: {} chars from {} documents",
            generation.len(),
            state.documents.len()
        );

        Ok(NodeOutput::Continue(Some(StateUpdate::Generation(generation))))
    }
}
