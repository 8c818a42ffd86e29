use async_trait::async_trait;

use super::json::parse_datasource;
use super::model::ChatModel;
use super::prompts;
use crate::collaborators::RoutingModel;
use crate::core::errors::RagError;
use crate::graph::state::Datasource;
use crate::llm::ChatMessage;

/// Routes questions with a JSON-mode chat model
pub struct LlmRouter {
    model: ChatModel,
}

impl LlmRouter {
    pub fn new(model: ChatModel) -> Self {
        Self { model }
    }
}

#[async_trait]
impl RoutingModel for LlmRouter {
    async fn route(&self, question: &str) -> Result<Datasource, RagError> {
        let reply = self
            .model
            .complete(
                vec![
                    ChatMessage::system(prompts::ROUTER_SYSTEM),
                    ChatMessage::user(question),
                ],
                true,
            )
            .await?;
        tracing::debug!("question_router reply: {}", reply);
        parse_datasource(&reply)
    }
}
