// Grade Documents Node
// Keeps only the passages a relevance judgment accepts

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt, TryStreamExt};

use crate::collaborators::{prompt_vars, vars};
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{GraphState, StateUpdate, Step};

pub struct GradeDocumentsNode;

impl GradeDocumentsNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GradeDocumentsNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GradeDocumentsNode {
    fn step(&self) -> Step {
        Step::GradeDocuments
    }

    fn name(&self) -> &'static str {
        "Relevance Grader"
    }

    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let grader = &ctx.services.relevance_grader;
        let question = state.question.as_str();

        // Futures own their prompt variables so the stream borrows nothing
        // per item. `buffered` still yields results in input order.
        let judgments: Vec<_> = state
            .documents
            .iter()
            .map(|document| {
                let prompt = prompt_vars([
                    (vars::QUESTION, question),
                    (vars::CONTENT, document.content.as_str()),
                ]);
                let grader = Arc::clone(grader);
                async move { grader.classify(&prompt).await.map(|j| j.is_yes()) }
            })
            .collect();

        let verdicts: Vec<bool> = stream::iter(judgments)
            .buffered(ctx.grading_concurrency.max(1))
            .try_collect()
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        let relevant: Vec<_> = state
            .documents
            .iter()
            .zip(verdicts)
            .filter_map(|(document, keep)| keep.then(|| document.clone()))
            .collect();

        tracing::info!(
            "Grade documents: {} of {} relevant",
            relevant.len(),
            state.documents.len()
        );

        Ok(NodeOutput::Continue(Some(StateUpdate::Documents(relevant))))
    }
}
