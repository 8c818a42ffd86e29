// Binary yes/no judges backed by a JSON-mode chat model

use async_trait::async_trait;

use super::json::parse_binary_judgment;
use super::model::ChatModel;
use super::prompt::PromptTemplate;
use super::prompts;
use crate::collaborators::{JudgmentModel, PromptVars};
use crate::core::errors::RagError;
use crate::graph::state::BinaryJudgment;
use crate::llm::ChatMessage;

pub struct LlmJudge {
    name: &'static str,
    model: ChatModel,
    template: PromptTemplate,
}

impl LlmJudge {
    pub fn new(name: &'static str, model: ChatModel, template: &str) -> Result<Self, RagError> {
        Ok(Self {
            name,
            model,
            template: PromptTemplate::parse(template)?,
        })
    }

    /// Is the document relevant to the question? Expects `question`, `content`.
    pub fn relevance(model: ChatModel) -> Result<Self, RagError> {
        Self::new("relevance_grader", model, prompts::RELEVANCE_GRADER)
    }

    /// Is the generation supported by the context? Expects `generation`, `context`.
    pub fn hallucination(model: ChatModel) -> Result<Self, RagError> {
        Self::new("hallucination_grader", model, prompts::HALLUCINATION_GRADER)
    }

    /// Does the generation resolve the question? Expects `question`, `generation`.
    pub fn answer(model: ChatModel) -> Result<Self, RagError> {
        Self::new("answer_grader", model, prompts::ANSWER_GRADER)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[async_trait]
impl JudgmentModel for LlmJudge {
    async fn classify(&self, vars: &PromptVars) -> Result<BinaryJudgment, RagError> {
        let prompt = self.template.render(vars)?;
        let reply = self
            .model
            .complete(vec![ChatMessage::user(prompt)], true)
            .await?;
        tracing::debug!("{} reply: {}", self.name, reply);
        parse_binary_judgment(self.name, &reply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::collaborators::{prompt_vars, vars};
    use crate::core::config::settings::LlmSettings;
    use crate::testing::ScriptedProvider;

    fn model(provider: &Arc<ScriptedProvider>) -> ChatModel {
        ChatModel::new(provider.clone(), LlmSettings::default())
    }

    #[tokio::test]
    async fn relevance_prompt_carries_document_and_question() {
        let provider = Arc::new(ScriptedProvider::replying(&[r#"{"score": "yes"}"#]));
        let judge = LlmJudge::relevance(model(&provider)).unwrap();

        let judgment = judge
            .classify(&prompt_vars([
                (vars::QUESTION, "agent memory"),
                (vars::CONTENT, "Memory lets agents recall past steps."),
            ]))
            .await
            .unwrap();

        assert!(judgment.is_yes());
        let prompt = provider.last_prompt();
        assert!(prompt.contains("<document>\nMemory lets agents recall past steps.\n</document>"));
        assert!(prompt.contains("agent memory"));
        assert!(provider.requests.lock().unwrap()[0].json_mode);
    }

    #[tokio::test]
    async fn unparseable_reply_is_malformed() {
        let provider = Arc::new(ScriptedProvider::replying(&["Sure! The answer is yes."]));
        let judge = LlmJudge::answer(model(&provider)).unwrap();

        let err = judge
            .classify(&prompt_vars([
                (vars::QUESTION, "q"),
                (vars::GENERATION, "g"),
            ]))
            .await
            .unwrap_err();
        assert!(err.is_malformed_judgment());
        assert!(err.to_string().contains("answer_grader"));
    }

    #[tokio::test]
    async fn missing_variable_fails_before_calling_the_model() {
        let provider = Arc::new(ScriptedProvider::replying(&[r#"{"score": "yes"}"#]));
        let judge = LlmJudge::hallucination(model(&provider)).unwrap();

        assert!(judge
            .classify(&prompt_vars([(vars::GENERATION, "g")]))
            .await
            .is_err());
        assert!(provider.requests.lock().unwrap().is_empty());
    }
}
