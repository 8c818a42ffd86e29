use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::collaborators::WebSearch;
use crate::core::config::settings::SearchSettings;
use crate::core::errors::RagError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchProvider {
    DuckDuckGo,
    Brave { api_key: String },
    Tavily { api_key: String },
}

impl SearchProvider {
    pub fn name(&self) -> &'static str {
        match self {
            SearchProvider::DuckDuckGo => "duckduckgo",
            SearchProvider::Brave { .. } => "brave",
            SearchProvider::Tavily { .. } => "tavily",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            SearchProvider::DuckDuckGo => "https://api.duckduckgo.com",
            SearchProvider::Brave { .. } => "https://api.search.brave.com",
            SearchProvider::Tavily { .. } => "https://api.tavily.com",
        }
    }
}

/// Web search collaborator returning results as a JSON array string
pub struct WebSearchClient {
    provider: SearchProvider,
    base_url: String,
    max_results: usize,
    client: Client,
}

impl WebSearchClient {
    pub fn new(provider: SearchProvider, max_results: usize, client: Client) -> Self {
        Self {
            base_url: provider.default_base_url().to_string(),
            provider,
            max_results,
            client,
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Result<Self, RagError> {
        let api_key = settings.api_key.clone().filter(|k| !k.is_empty());
        let provider = match (settings.provider.as_str(), api_key) {
            ("duckduckgo", _) => SearchProvider::DuckDuckGo,
            ("brave", Some(api_key)) => SearchProvider::Brave { api_key },
            ("tavily", Some(api_key)) => SearchProvider::Tavily { api_key },
            ("brave" | "tavily", None) => {
                return Err(RagError::Config(format!(
                    "search.api_key is required for the {} provider",
                    settings.provider
                )))
            }
            (other, _) => {
                return Err(RagError::Config(format!("Unknown search provider: {}", other)))
            }
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(RagError::internal)?;
        Ok(Self::new(provider, settings.max_results, client))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn search_results(&self, query: &str) -> Result<Vec<SearchResult>, RagError> {
        let name = self.provider.name();
        let request = match &self.provider {
            SearchProvider::DuckDuckGo => self.client.get(format!(
                "{}/?q={}&format=json&no_redirect=1&no_html=1",
                self.base_url,
                urlencoding::encode(query)
            )),
            SearchProvider::Brave { api_key } => self
                .client
                .get(format!(
                    "{}/res/v1/web/search?q={}&count={}",
                    self.base_url,
                    urlencoding::encode(query),
                    self.max_results
                ))
                .header("X-Subscription-Token", api_key)
                .header("Accept", "application/json"),
            SearchProvider::Tavily { api_key } => self
                .client
                .post(format!("{}/search", self.base_url))
                .json(&json!({
                    "api_key": api_key,
                    "query": query,
                    "max_results": self.max_results,
                })),
        };

        let response = request
            .send()
            .await
            .map_err(|e| RagError::collaborator(name, e))?;
        if !response.status().is_success() {
            return Err(RagError::collaborator(
                name,
                format!("search failed: {}", response.status()),
            ));
        }
        let payload: Value = response
            .json()
            .await
            .map_err(|e| RagError::collaborator(name, e))?;

        let mut results = match self.provider {
            SearchProvider::DuckDuckGo => parse_duckduckgo(&payload),
            SearchProvider::Brave { .. } => parse_brave(&payload),
            SearchProvider::Tavily { .. } => parse_tavily(&payload),
        };
        results.truncate(self.max_results);
        Ok(results)
    }
}

#[async_trait]
impl WebSearch for WebSearchClient {
    async fn search(&self, question: &str) -> Result<String, RagError> {
        let results = self.search_results(question).await?;
        tracing::debug!("{} returned {} results", self.provider.name(), results.len());
        serde_json::to_string(&results).map_err(RagError::internal)
    }
}

fn str_field<'a>(item: &'a Value, key: &str) -> &'a str {
    item.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn push_result(results: &mut Vec<SearchResult>, title: &str, url: &str, snippet: &str) {
    if !title.is_empty() && !url.is_empty() {
        results.push(SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        });
    }
}

pub fn parse_duckduckgo(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    let abstract_text = str_field(payload, "AbstractText");
    let abstract_url = str_field(payload, "AbstractURL");
    let heading = str_field(payload, "Heading");
    let title = if heading.is_empty() {
        abstract_text.split(" - ").next().unwrap_or(abstract_text)
    } else {
        heading
    };
    push_result(&mut results, title, abstract_url, abstract_text);

    if let Some(items) = payload.get("Results").and_then(|v| v.as_array()) {
        extract_ddg_topics(items, &mut results);
    }
    if let Some(items) = payload.get("RelatedTopics").and_then(|v| v.as_array()) {
        extract_ddg_topics(items, &mut results);
    }
    results
}

fn extract_ddg_topics(items: &[Value], results: &mut Vec<SearchResult>) {
    for item in items {
        if let Some(topics) = item.get("Topics").and_then(|v| v.as_array()) {
            extract_ddg_topics(topics, results);
            continue;
        }
        let text = str_field(item, "Text");
        let title = text.split(" - ").next().unwrap_or(text);
        push_result(results, title, str_field(item, "FirstURL"), text);
    }
}

pub fn parse_brave(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();
    if let Some(items) = payload
        .get("web")
        .and_then(|w| w.get("results"))
        .and_then(|v| v.as_array())
    {
        for item in items {
            push_result(
                &mut results,
                str_field(item, "title"),
                str_field(item, "url"),
                str_field(item, "description"),
            );
        }
    }
    results
}

pub fn parse_tavily(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();
    if let Some(items) = payload.get("results").and_then(|v| v.as_array()) {
        for item in items {
            push_result(
                &mut results,
                str_field(item, "title"),
                str_field(item, "url"),
                str_field(item, "content"),
            );
        }
    }
    results
}
