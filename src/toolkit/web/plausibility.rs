use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{SearchProvider, WebHit};
use crate::core::config::DocsimConfig;
use crate::utils::safe_truncate;

const POINTS_PER_HIT: usize = 15;


#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub max_results: usize,
    pub timeout: Duration,
    pub excerpt_max_chars: usize,
}

impl SearchOptions {
    pub fn from_config(config: &DocsimConfig) -> Self {
        Self {
            max_results: config.search_max_results,
            timeout: Duration::from_secs(config.search_timeout_secs),
            excerpt_max_chars: config.excerpt_max_chars,
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&DocsimConfig::default())
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebPlausibility {
    pub evidence: Vec<WebHit>,
    pub score: f64,
    pub query: String,
}


/// First sentence of `text` (up to the first period), trimmed and cut to
/// `max_chars` characters.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let sentence = text.split('.').next().unwrap_or_default();
    safe_truncate(sentence.trim(), max_chars).trim().to_string()
}


pub fn plausibility_score(hit_count: usize) -> f64 {
    (hit_count.saturating_mul(POINTS_PER_HIT)).min(100) as f64
}


/// Searches the web for an excerpt of `text` and turns the hit count into a
/// score. Never fails: errors and timeouts yield no evidence and 0.
pub async fn web_plausibility(
    text: &str,
    provider: &dyn SearchProvider,
    options: &SearchOptions,
) -> WebPlausibility {
    let query = excerpt(text, options.excerpt_max_chars);
    if query.is_empty() {
        debug!("Blank excerpt, skipping web search");
        return WebPlausibility::default();
    }

    let hits = match tokio::time::timeout(options.timeout, provider.search(&query, options.max_results)).await {
        Ok(Ok(hits)) => hits,
        Ok(Err(e)) => {
            warn!("Web search via {} failed: {}", provider.provider_name(), e);
            Vec::new()
        }
        Err(_) => {
            warn!(
                "Web search via {} timed out after {:?}",
                provider.provider_name(),
                options.timeout
            );
            Vec::new()
        }
    };

    let score = plausibility_score(hits.len());
    let mut evidence = hits;
    evidence.truncate(options.max_results);
    debug!("Web plausibility {} from {} evidence entries", score, evidence.len());

    WebPlausibility { evidence, score, query }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::super::{SearchError, SearchProvider, WebHit};

    /// Returns a fixed number of hits and remembers the queries it saw.
    pub struct FixedSearch {
        pub hits: usize,
        pub fail: bool,
        pub queries: Mutex<Vec<String>>,
    }

    impl FixedSearch {
        pub fn new(hits: usize) -> Self {
            Self {
                hits,
                fail: false,
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(0)
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, query: &str, _max_results: usize) -> Result<Vec<WebHit>, SearchError> {
            self.queries.lock().push(query.to_string());
            if self.fail {
                return Err(SearchError::Provider("rate limited".to_string()));
            }
            Ok((0..self.hits)
                .map(|i| WebHit {
                    title: format!("Result {}", i),
                    url: format!("https://example.com/{}", i),
                    snippet: String::new(),
                })
                .collect())
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }
}
