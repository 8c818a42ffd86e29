// Typed view of the merged configuration tree

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::RagError;
use crate::graph::state::Step;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppSettings,
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub grading: GradingSettings,
    pub graph: GraphSettings,
    pub search: SearchSettings,
}

impl Settings {
    pub fn from_value(value: &Value) -> Result<Self, RagError> {
        serde_json::from_value(value.clone()).map_err(|e| RagError::Config(e.to_string()))
    }
}

/// Built-in defaults, used as the base layer of the merged config.
pub fn default_config() -> Value {
    serde_json::to_value(Settings::default()).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub max_input_length: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_input_length: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// `ollama`, `lmstudio`, `llama_cpp` or `openai_compat`.
    pub provider: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub max_tokens: Option<i32>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            api_key: None,
            chat_model: "llama3".to_string(),
            embedding_model: "mxbai-embed-large".to_string(),
            temperature: 0.0,
            top_p: None,
            max_tokens: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub source_dirs: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub embed_batch_size: usize,
    pub ingest_on_startup: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 4,
            chunk_size: 250,
            chunk_overlap: 0,
            source_dirs: Vec::new(),
            extensions: vec!["txt".to_string(), "md".to_string()],
            embed_batch_size: 32,
            ingest_on_startup: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingSettings {
    /// Number of relevance judgments in flight at once.
    pub concurrency: usize,
}

impl Default for GradingSettings {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub max_steps: usize,
    /// Steps to pause before. Empty keeps `/api/ask` a single round trip;
    /// `["web_search"]` requires a resume before any web lookup.
    pub interrupt_before: Vec<Step>,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_steps: 25,
            interrupt_before: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// `duckduckgo`, `brave` or `tavily`.
    pub provider: String,
    pub api_key: Option<String>,
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            provider: "duckduckgo".to_string(),
            api_key: None,
            max_results: 5,
            timeout_secs: 20,
        }
    }
}
