// Free-text chains: answer generation and question rewriting

use async_trait::async_trait;

use super::model::ChatModel;
use super::prompt::PromptTemplate;
use super::prompts;
use crate::collaborators::{prompt_vars, vars, GenerationModel, PromptVars, RewriteModel};
use crate::core::errors::RagError;
use crate::llm::ChatMessage;

async fn complete_text(model: &ChatModel, prompt: String, chain: &str) -> Result<String, RagError> {
    let reply = model.complete(vec![ChatMessage::user(prompt)], false).await?;
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(RagError::collaborator(
            model.provider_name(),
            format!("{} returned an empty reply", chain),
        ));
    }
    Ok(trimmed.to_string())
}

pub struct LlmGenerator {
    model: ChatModel,
    template: PromptTemplate,
}

impl LlmGenerator {
    pub fn new(model: ChatModel) -> Result<Self, RagError> {
        Ok(Self {
            model,
            template: PromptTemplate::parse(prompts::GENERATOR)?,
        })
    }
}

#[async_trait]
impl GenerationModel for LlmGenerator {
    async fn generate(&self, vars: &PromptVars) -> Result<String, RagError> {
        let prompt = self.template.render(vars)?;
        complete_text(&self.model, prompt, "generator").await
    }
}

pub struct LlmRewriter {
    model: ChatModel,
    template: PromptTemplate,
}

impl LlmRewriter {
    pub fn new(model: ChatModel) -> Result<Self, RagError> {
        Ok(Self {
            model,
            template: PromptTemplate::parse(prompts::REWRITER)?,
        })
    }
}

#[async_trait]
impl RewriteModel for LlmRewriter {
    async fn rewrite(&self, question: &str) -> Result<String, RagError> {
        let prompt = self.template.render(&prompt_vars([(vars::QUESTION, question)]))?;
        complete_text(&self.model, prompt, "question_rewriter").await
    }
}
