use crate::config::Config;
use crate::errors::{AppError, SearchFailure};
use crate::models::SearchResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Maximum number of hits requested per company.
pub const SEARCH_RESULT_LIMIT: usize = 10;
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A web search backend queried once per lead.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Returns at least one result, or the reason there are none.
    async fn search(&self, company_name: &str) -> Result<Vec<SearchResult>, SearchFailure>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<SearchData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    #[serde(default)]
    web: Vec<SearchResult>,
}

/// Client for a Firecrawl-compatible `/v1/search` endpoint, hosted or self-hosted.
#[derive(Clone)]
pub struct FirecrawlSearchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FirecrawlSearchClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to create search client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(config.search_base_url(), config.firecrawl_api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SearchBackend for FirecrawlSearchClient {
    async fn search(&self, company_name: &str) -> Result<Vec<SearchResult>, SearchFailure> {
        let url = format!("{}/v1/search", self.base_url);
        let payload = json!({
            "query": company_name,
            "limit": SEARCH_RESULT_LIMIT,
        });

        tracing::info!(company = company_name, "Searching web for company");

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchFailure::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SearchFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchFailure::Malformed(e.to_string()))?;

        if !body.success {
            return Err(SearchFailure::Backend(
                body.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }

        let mut results = body.data.map(|d| d.web).unwrap_or_default();
        if results.is_empty() {
            return Err(SearchFailure::NoResults);
        }
        results.truncate(SEARCH_RESULT_LIMIT);

        tracing::info!(
            company = company_name,
            results = results.len(),
            "Search returned results"
        );
        Ok(results)
    }
}
