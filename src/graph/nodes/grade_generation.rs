// Grade Generation Node
// Checks the answer is grounded in the documents, then that it answers
// the question

use async_trait::async_trait;

use crate::collaborators::{prompt_vars, vars};
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{Condition, GraphState, Step};
use crate::rag::context::format_documents;

pub struct GradeGenerationNode;

impl GradeGenerationNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GradeGenerationNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for GradeGenerationNode {
    fn step(&self) -> Step {
        Step::GradeGeneration
    }

    fn name(&self) -> &'static str {
        "Generation Grader"
    }

    async fn execute(
        &self,
        state: &GraphState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let generation = state.generation.as_deref().unwrap_or_default();
        let context = format_documents(&state.documents);

        let grounded = ctx
            .services
            .hallucination_grader
            .classify(&prompt_vars([
                (vars::GENERATION, generation),
                (vars::CONTEXT, context.as_str()),
            ]))
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        if !grounded.is_yes() {
            tracing::info!("Grade generation: not grounded in documents, retrying");
            return Ok(NodeOutput::Branch(Condition::NotSupported));
        }

        let answers = ctx
            .services
            .answer_grader
            .classify(&prompt_vars([
                (vars::QUESTION, state.question.as_str()),
                (vars::GENERATION, generation),
            ]))
            .await
            .map_err(|e| GraphError::new(self.step(), e))?;

        if answers.is_yes() {
            tracing::info!("Grade generation: grounded and addresses the question");
            Ok(NodeOutput::Branch(Condition::Useful))
        } else {
            tracing::info!("Grade generation: grounded but does not address the question");
            Ok(NodeOutput::Branch(Condition::NotUseful))
        }
    }
}
