use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{SearchError, SearchProvider, WebHit};

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com/";


#[derive(Debug, Default, Deserialize)]
struct DuckDuckGoResponse {
    #[serde(rename = "Heading", default)]
    heading: String,
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<DuckDuckGoTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DuckDuckGoTopic {
    Entry {
        #[serde(rename = "FirstURL")]
        first_url: String,
        #[serde(rename = "Text", default)]
        text: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<DuckDuckGoTopic>,
    },
}


/// DuckDuckGo instant-answer API; needs no key. It answers topic lookups,
/// so a sentence query usually comes back with no hits.
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {

    pub fn new(timeout_secs: u64) -> Result<Self, SearchError> {
        Self::with_endpoint(DEFAULT_ENDPOINT, timeout_secs)
    }


    pub fn with_endpoint(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

fn is_web_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn flatten_topics(topics: Vec<DuckDuckGoTopic>, out: &mut Vec<WebHit>) {
    for topic in topics {
        match topic {
            DuckDuckGoTopic::Entry { first_url, text } => {
                if !is_web_url(&first_url) {
                    continue;
                }
                let title = text
                    .split(" - ")
                    .next()
                    .filter(|t| !t.is_empty())
                    .unwrap_or("Untitled")
                    .to_string();
                out.push(WebHit {
                    title,
                    url: first_url,
                    snippet: text,
                });
            }
            DuckDuckGoTopic::Group { topics } => flatten_topics(topics, out),
        }
    }
}

fn hits_from_response(response: DuckDuckGoResponse) -> Vec<WebHit> {
    let mut hits = Vec::new();
    if is_web_url(&response.abstract_url) {
        hits.push(WebHit {
            title: if response.heading.is_empty() {
                "Untitled".to_string()
            } else {
                response.heading
            },
            url: response.abstract_url,
            snippet: response.abstract_text,
        });
    }
    flatten_topics(response.related_topics, &mut hits);
    hits
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebHit>, SearchError> {
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| SearchError::Provider(e.to_string()))?;

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<DuckDuckGoResponse>()
            .await?;

        let mut hits = hits_from_response(response);
        hits.truncate(max_results);
        debug!("DuckDuckGo returned {} hits", hits.len());
        Ok(hits)
    }

    fn provider_name(&self) -> &str {
        "duckduckgo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_abstract_and_nested_topics() {
        let body = r#"{
            "Heading": "Rust (programming language)",
            "AbstractText": "Rust is a systems language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust_(programming_language)",
            "RelatedTopics": [
                {"FirstURL": "https://duckduckgo.com/Cargo", "Text": "Cargo - Rust package manager", "Result": "..."},
                {"Name": "See also", "Topics": [
                    {"FirstURL": "https://duckduckgo.com/Ferris", "Text": "Ferris - the crab"}
                ]},
                {"FirstURL": "", "Text": "broken"}
            ]
        }"#;
        let response: DuckDuckGoResponse = serde_json::from_str(body).unwrap();
        let hits = hits_from_response(response);

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Rust (programming language)");
        assert_eq!(hits[1].title, "Cargo");
        assert_eq!(hits[1].snippet, "Cargo - Rust package manager");
        assert_eq!(hits[2].url, "https://duckduckgo.com/Ferris");
    }

    #[test]
    fn test_empty_answer_has_no_hits() {
        let response: DuckDuckGoResponse =
            serde_json::from_str(r#"{"Heading": "", "AbstractURL": "", "RelatedTopics": []}"#).unwrap();
        assert!(hits_from_response(response).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let search = DuckDuckGoSearch::with_endpoint("http://127.0.0.1:9/", 1).unwrap();
        assert!(search.search("query", 3).await.is_err());
    }
}
