//! Tavily search client.

use super::WebSearchProvider;
use crate::llm::{LlmHttpConfig, build_http_client};
use crate::models::{WebResult, WebSearchResponse};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Tavily connection settings.
#[derive(Debug, Clone)]
pub struct TavilyConfig {
    /// API endpoint.
    pub endpoint: String,
    /// Search depth: `"basic"` or `"advanced"`.
    pub search_depth: String,
    /// Answer synthesis mode: `"basic"` or `"advanced"`.
    pub include_answer: String,
}

impl Default for TavilyConfig {
    fn default() -> Self {
        Self {
            endpoint: TavilyClient::DEFAULT_ENDPOINT.to_string(),
            search_depth: "advanced".to_string(),
            include_answer: "advanced".to_string(),
        }
    }
}

/// Tavily web search client.
pub struct TavilyClient {
    /// API key.
    api_key: Option<SecretString>,
    /// Connection settings.
    config: TavilyConfig,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl TavilyClient {
    /// Default API endpoint.
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.tavily.com";

    /// Search timeout; shorter than the model-call timeout because the
    /// fallback path already sits behind a failed retrieval round-trip.
    const TIMEOUT_MS: u64 = 10_000;

    /// Creates a new client with the key from `TAVILY_API_KEY`.
    #[must_use]
    pub fn new(config: TavilyConfig) -> Self {
        let api_key = std::env::var("TAVILY_API_KEY").ok().map(SecretString::from);
        Self {
            api_key,
            config,
            client: build_http_client(LlmHttpConfig {
                timeout_ms: Self::TIMEOUT_MS,
                ..LlmHttpConfig::from_env()
            }),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }
}

impl WebSearchProvider for TavilyClient {
    fn search(&self, query: &str, max_results: usize) -> Result<WebSearchResponse> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }
        if max_results > 20 {
            return Err(Error::InvalidInput(
                "max_results must be between 0 and 20".to_string(),
            ));
        }

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| Error::MissingCredential("TAVILY_API_KEY".to_string()))?;

        let request = SearchRequest {
            query: query.to_string(),
            max_results,
            search_depth: self.config.search_depth.clone(),
            include_answer: self.config.include_answer.clone(),
            include_images: false,
        };

        let response = self
            .client
            .post(format!("{}/search", self.config.endpoint))
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .map_err(|e| Error::OperationFailed {
                operation: "tavily_search".to_string(),
                cause: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::OperationFailed {
                operation: "tavily_search".to_string(),
                cause: format!("API returned status: {status} - {body}"),
            });
        }

        let response: SearchResponse = response.json().map_err(|e| Error::OperationFailed {
            operation: "tavily_search".to_string(),
            cause: e.to_string(),
        })?;

        Ok(WebSearchResponse {
            results: response
                .results
                .into_iter()
                .map(|item| WebResult {
                    title: item.title,
                    url: item.url,
                    snippet: item.content,
                })
                .collect(),
            answer: response.answer,
        })
    }
}

/// Request to the search API.
#[derive(Debug, Serialize)]
struct SearchRequest {
    query: String,
    max_results: usize,
    search_depth: String,
    include_answer: String,
    include_images: bool,
}

/// Response from the search API.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
    #[serde(default)]
    answer: Option<String>,
}

/// One result item; `content` maps to the snippet field.
#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TavilyConfig::default();
        assert_eq!(config.search_depth, "advanced");
        assert_eq!(config.include_answer, "advanced");
    }

    #[test]
    fn test_empty_query_rejected() {
        let client = TavilyClient::new(TavilyConfig::default()).with_api_key("test-key");
        assert!(matches!(
            client.search("", 3),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_excessive_max_results_rejected() {
        let client = TavilyClient::new(TavilyConfig::default()).with_api_key("test-key");
        assert!(matches!(
            client.search("leadership", 21),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_key_is_credential_error() {
        let client = TavilyClient {
            api_key: None,
            config: TavilyConfig::default(),
            client: reqwest::blocking::Client::new(),
        };
        assert!(matches!(
            client.search("leadership", 3),
            Err(Error::MissingCredential(_))
        ));
    }

    #[test]
    fn test_response_item_maps_content_to_snippet() {
        let json = r#"{
            "results": [{"title": "T", "url": "https://x", "content": "S"}],
            "answer": "synthesized"
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results[0].content, "S");
        assert_eq!(parsed.answer.as_deref(), Some("synthesized"));
    }
}
