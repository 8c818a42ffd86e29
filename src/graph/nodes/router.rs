// Router Node
// Entry point that sends the question to web search or the vector store

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{Datasource, GraphState, Step};

pub struct RouterNode;

impl RouterNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RouterNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RouterNode {
    fn step(&self) -> Step {
        Step::Route
    }

    fn name(&self) -> &'static str {
        "Question Router"
    }

    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let datasource = ctx
            .services
            .router
            .route(&state.question)
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        let target = match datasource {
            Datasource::WebSearch => "web search",
            Datasource::Vectorstore => "vector store",
        };
        tracing::info!("Router: question {:?} routed to {}", state.question, target);

        Ok(NodeOutput::Branch(datasource.into()))
    }
}
