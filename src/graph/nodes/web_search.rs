// Web Search Node
// Fallback retrieval path: the whole result blob becomes one document

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{Document, GraphState, StateUpdate, Step};

pub struct WebSearchNode;

impl WebSearchNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebSearchNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for WebSearchNode {
    fn step(&self) -> Step {
        Step::WebSearch
    }

    fn name(&self) -> &'static str {
        "Web Search"
    }

    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let results = ctx
            .services
            .web_search
            .search(&state.question)
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        tracing::info!("Web search: {} bytes of results", results.len());

        let document = Document::new(results).with_metadata("source", "web_search");
        Ok(NodeOutput::Continue(Some(StateUpdate::Documents(vec![
            document,
        ]))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{docs, ScriptedServices};

    #[tokio::test]
    async fn replaces_documents_with_single_result_document() {
        let blob = r#"[{"title":"t","url":"https://example.com","snippet":"s"}]"#;
        let scripted = ScriptedServices::new().web_results(blob);
        let services = scripted.build();
        let mut state = GraphState::new("latest rust release");
        state.documents = docs(&["stale one", "stale two"]);

        let output = WebSearchNode::new()
            .execute(&state, &NodeContext::new(&services))
            .await
            .unwrap();

        let NodeOutput::Continue(Some(StateUpdate::Documents(documents))) = output else {
            panic!("expected a documents update");
        };
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].content, blob);
        assert_eq!(documents[0].source(), Some("web_search"));
        assert_eq!(
            *scripted.web_search.calls.lock().unwrap(),
            vec!["latest rust release"]
        );
    }
}
