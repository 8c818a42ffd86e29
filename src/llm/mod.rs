pub mod ollama;
pub mod openai_compat;
pub mod provider;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::core::config::settings::LlmSettings;
use crate::core::errors::RagError;

pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use provider::LlmProvider;
pub use types::{ChatMessage, ChatRequest};

/// Construct the provider named in `llm.provider`
pub fn build_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>, RagError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(RagError::internal)?;

    match settings.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaProvider::new(&settings.base_url, client))),
        "lmstudio" | "llama_cpp" | "openai_compat" => Ok(Arc::new(OpenAiCompatProvider::new(
            settings.provider.as_str(),
            &settings.base_url,
            settings.api_key.clone(),
            client,
        ))),
        other => Err(RagError::Config(format!("Unknown LLM provider: {}", other))),
    }
}
