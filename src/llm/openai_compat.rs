use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::errors::RagError;
use super::provider::LlmProvider;
use super::types::ChatRequest;

/// Client for servers that speak the OpenAI chat/embeddings API
/// (LM Studio, llama.cpp server, vLLM and similar).
#[derive(Clone)]
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        if self.base_url.ends_with("/v1") {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/v1{}", self.base_url, path)
        }
    }

    fn chat_body(request: &ChatRequest, model_id: &str) -> Value {
        let mut body = json!({
            "model": model_id,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
            if let Some(t) = request.top_p { obj.insert("top_p".to_string(), json!(t)); }
            if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
            if let Some(s) = &request.stop { obj.insert("stop".to_string(), json!(s)); }
            if request.json_mode {
                obj.insert("response_format".to_string(), json!({"type": "json_object"}));
            }
        }
        body
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, RagError> {
        let mut req = self.client.post(self.endpoint(path)).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req
            .send()
            .await
            .map_err(|e| RagError::collaborator(&self.name, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RagError::collaborator(
                &self.name,
                format!("{} returned {}: {}", path, status, text),
            ));
        }

        res.json().await.map_err(|e| RagError::collaborator(&self.name, e))
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> Result<bool, RagError> {
        let mut req = self.client.get(self.endpoint("/models"));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        match req.send().await {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, RagError> {
        let payload = self
            .post("/chat/completions", &Self::chat_body(&request, model_id))
            .await?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RagError::collaborator(&self.name, "chat response has no choices"))
    }

    async fn embed(&self, inputs: &[String], model_id: &str) -> Result<Vec<Vec<f32>>, RagError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "model": model_id,
            "input": inputs,
        });
        let payload = self.post("/embeddings", &body).await?;

        let mut embeddings = Vec::new();
        if let Some(data) = payload["data"].as_array() {
            for item in data {
                if let Some(vals) = item["embedding"].as_array() {
                    let vec: Vec<f32> = vals.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect();
                    embeddings.push(vec);
                }
            }
        }

        if embeddings.len() != inputs.len() {
            return Err(RagError::collaborator(
                &self.name,
                format!("expected {} embeddings, got {}", inputs.len(), embeddings.len()),
            ));
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ChatMessage;
    use axum::{http::HeaderMap, routing::post, Json, Router};

    #[test]
    fn endpoint_appends_v1_once() {
        let a = OpenAiCompatProvider::new("lmstudio", "http://localhost:1234/", None, Client::new());
        let b = OpenAiCompatProvider::new("llama_cpp", "http://localhost:8080/v1", None, Client::new());
        assert_eq!(a.endpoint("/models"), "http://localhost:1234/v1/models");
        assert_eq!(b.endpoint("/models"), "http://localhost:8080/v1/models");
    }

    #[test]
    fn json_mode_requests_json_object() {
        let body = OpenAiCompatProvider::chat_body(
            &ChatRequest::new(vec![ChatMessage::system("s")]).json(),
            "m",
        );
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn chat_sends_bearer_token() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"choices": [{"message": {"content": auth}}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let provider = OpenAiCompatProvider::new(
            "openai_compat",
            format!("http://{}", addr),
            Some("sk-test".to_string()),
            Client::new(),
        );
        let reply = provider.chat(ChatRequest::new(vec![]), "m").await.unwrap();
        assert_eq!(reply, "Bearer sk-test");
    }
}
