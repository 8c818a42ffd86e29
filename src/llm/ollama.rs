use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};

use crate::core::errors::RagError;
use super::provider::LlmProvider;
use super::types::ChatRequest;

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn chat_body(request: &ChatRequest, model_id: &str) -> Value {
        let mut options = Map::new();
        if let Some(t) = request.temperature { options.insert("temperature".to_string(), json!(t)); }
        if let Some(t) = request.top_p { options.insert("top_p".to_string(), json!(t)); }
        if let Some(t) = request.max_tokens { options.insert("num_predict".to_string(), json!(t)); }
        if let Some(s) = &request.stop { options.insert("stop".to_string(), json!(s)); }

        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });
        if let Some(obj) = body.as_object_mut() {
            if request.json_mode {
                obj.insert("format".to_string(), json!("json"));
            }
            if !options.is_empty() {
                obj.insert("options".to_string(), Value::Object(options));
            }
        }
        body
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, RagError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RagError::collaborator(self.name(), e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::collaborator(
                self.name(),
                format!("{} returned {}: {}", path, status, text),
            ));
        }

        res.json().await.map_err(|e| RagError::collaborator(self.name(), e))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, RagError> {
        let payload = self.post("/api/chat", &Self::chat_body(&request, model_id)).await?;

        payload["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RagError::collaborator(self.name(), "chat response has no message content"))
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "model": model_id,
            "input": inputs,
        });
        let payload = self.post("/api/embed", &body).await?;

        let embeddings: Vec<Vec<f32>> = payload["embeddings"]
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|vals| vals.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .unwrap_or_default();

        if embeddings.len() != inputs.len() {
            return Err(RagError::collaborator(
                self.name(),
                format!("expected {} embeddings, got {}", inputs.len(), embeddings.len()),
            ));
        }
        Ok(embeddings)
    }
}
