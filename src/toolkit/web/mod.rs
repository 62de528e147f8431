pub mod duckduckgo;
pub mod plausibility;
pub mod tavily;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::{DocsimConfig, SearchProviderKind};
use crate::core::error::{DocsimError, Result};

pub use duckduckgo::DuckDuckGoSearch;
pub use plausibility::{web_plausibility, SearchOptions, WebPlausibility};
pub use tavily::TavilySearch;


#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search provider error: {0}")]
    Provider(String),

    #[error("Search timed out")]
    Timeout,
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}


#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> std::result::Result<Vec<WebHit>, SearchError>;

    fn provider_name(&self) -> &str;
}


/// Used when web search is switched off; always finds nothing.
pub struct NoopSearch;

#[async_trait]
impl SearchProvider for NoopSearch {
    async fn search(&self, _query: &str, _max_results: usize) -> std::result::Result<Vec<WebHit>, SearchError> {
        tracing::debug!("NoopSearch: web search disabled");
        Ok(vec![])
    }

    fn provider_name(&self) -> &str {
        "none"
    }
}


pub fn search_provider_from_config(config: &DocsimConfig) -> Result<Arc<dyn SearchProvider>> {
    let provider: Arc<dyn SearchProvider> = match config.search_provider {
        SearchProviderKind::Duckduckgo => Arc::new(DuckDuckGoSearch::new(config.search_timeout_secs)?),
        SearchProviderKind::Tavily => {
            let key = config
                .search_api_key
                .clone()
                .ok_or_else(|| DocsimError::Config("tavily search requires search_api_key".into()))?;
            Arc::new(TavilySearch::new(key, config.search_timeout_secs)?)
        }
        SearchProviderKind::None => Arc::new(NoopSearch),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_finds_nothing() {
        let hits = NoopSearch.search("anything", 3).await;
        assert_eq!(tokio_test::assert_ok!(hits), vec![]);
    }

    #[test]
    fn test_provider_from_config() {
        let config = DocsimConfig {
            search_provider: SearchProviderKind::None,
            ..Default::default()
        };
        assert_eq!(search_provider_from_config(&config).unwrap().provider_name(), "none");

        let config = DocsimConfig::default();
        assert_eq!(search_provider_from_config(&config).unwrap().provider_name(), "duckduckgo");

        let config = DocsimConfig {
            search_provider: SearchProviderKind::Tavily,
            ..Default::default()
        };
        assert!(search_provider_from_config(&config).is_err());
    }
}
