use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{SearchError, SearchProvider, WebHit};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";


#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}


/// Tavily search API (requires a key).
pub struct TavilySearch {
    api_key: String,
    client: Client,
}

impl TavilySearch {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { api_key, client })
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>, SearchError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
        };

        let response = self.client.post(TAVILY_ENDPOINT).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Provider(format!("Tavily API error {}: {}", status, body)));
        }

        let parsed: TavilyResponse = response.json().await?;
        Ok(parsed
            .results
            .into_iter()
            .map(|r| WebHit {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }

    fn provider_name(&self) -> &str {
        "tavily"
    }
}
