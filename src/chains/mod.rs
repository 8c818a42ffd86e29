// LLM-backed implementations of the graph's model collaborators

pub mod generation;
pub mod graders;
pub mod json;
pub mod model;
pub mod prompt;
pub mod prompts;
pub mod routing;

use std::sync::Arc;

use crate::collaborators::{Collaborators, Retriever, WebSearch};
use crate::core::config::settings::LlmSettings;
use crate::core::errors::RagError;
use crate::llm::LlmProvider;

pub use generation::{LlmGenerator, LlmRewriter};
pub use graders::LlmJudge;
pub use model::ChatModel;
pub use prompt::PromptTemplate;
pub use routing::LlmRouter;

/// Wire every model-backed collaborator to one chat model
pub fn build_collaborators(
    provider: Arc<dyn LlmProvider>,
    settings: &LlmSettings,
    retriever: Arc<dyn Retriever>,
    web_search: Arc<dyn WebSearch>,
) -> Result<Collaborators, RagError> {
    let model = ChatModel::new(provider, settings.clone());

    Ok(Collaborators {
        router: Arc::new(LlmRouter::new(model.clone())),
        retriever,
        web_search,
        relevance_grader: Arc::new(LlmJudge::relevance(model.clone())?),
        hallucination_grader: Arc::new(LlmJudge::hallucination(model.clone())?),
        answer_grader: Arc::new(LlmJudge::answer(model.clone())?),
        generator: Arc::new(LlmGenerator::new(model.clone())?),
        rewriter: Arc::new(LlmRewriter::new(model)?),
    })
}
