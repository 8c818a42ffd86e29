use std::sync::Arc;

use crate::core::config::settings::LlmSettings;
use crate::core::errors::RagError;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};

/// A provider bound to the configured chat model and sampling options
#[derive(Clone)]
pub struct ChatModel {
    provider: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl ChatModel {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        json_mode: bool,
    ) -> Result<String, RagError> {
        let mut request = ChatRequest::new(messages).with_settings(&self.settings);
        if json_mode {
            request = request.json();
        }
        self.provider.chat(request, &self.settings.chat_model).await
    }
}
