//! DuckDuckGo instant-answer search
//!
//! Uses the keyless JSON API (`api.duckduckgo.com/?format=json`). Hits are
//! collected from `Results`, the abstract, and `RelatedTopics` (including
//! nested topic groups), in that order.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

use super::{SearchBackend, SearchHit};

const DEFAULT_ENDPOINT: &str = "https://api.duckduckgo.com";
const USER_AGENT: &str = concat!("expenseflow/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct DuckDuckGoSearch {
    http_client: Client,
    endpoint: String,
}

impl Default for DuckDuckGoSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl DuckDuckGoSearch {
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Point at a different server (tests, proxies)
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            http_client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    results: Vec<Topic>,
    #[serde(default)]
    related_topics: Vec<Topic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Topic {
    #[serde(default)]
    text: String,
    #[serde(default, rename = "FirstURL")]
    first_url: String,
    /// Present on topic groups instead of text/url
    #[serde(default)]
    topics: Vec<Topic>,
}

/// "Title - rest of the text" -> "Title"
fn title_of(text: &str) -> String {
    text.split(" - ")
        .next()
        .unwrap_or(text)
        .chars()
        .take(80)
        .collect::<String>()
        .trim()
        .to_string()
}

fn collect_topics(topics: &[Topic], hits: &mut Vec<SearchHit>) {
    for topic in topics {
        if !topic.topics.is_empty() {
            collect_topics(&topic.topics, hits);
        } else if !topic.text.is_empty() && !topic.first_url.is_empty() {
            hits.push(SearchHit::new(
                title_of(&topic.text),
                topic.first_url.clone(),
                topic.text.clone(),
            ));
        }
    }
}

fn hits_from_answer(answer: InstantAnswer) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    collect_topics(&answer.results, &mut hits);

    if !answer.abstract_text.is_empty() && !answer.abstract_url.is_empty() {
        let title = if answer.heading.is_empty() {
            title_of(&answer.abstract_text)
        } else {
            answer.heading.clone()
        };
        hits.push(SearchHit::new(title, answer.abstract_url, answer.abstract_text));
    }

    collect_topics(&answer.related_topics, &mut hits);
    hits
}

#[async_trait]
impl SearchBackend for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .http_client
            .get(&self.endpoint)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::BackendUnavailable(format!(
                "DuckDuckGo returned {}",
                response.status()
            )));
        }

        // The API sometimes answers with an empty body for unknown queries
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let answer: InstantAnswer = serde_json::from_str(&body)?;
        let hits = hits_from_answer(answer);
        debug!(query = query, hits = hits.len(), "DuckDuckGo search");
        Ok(hits)
    }

    async fn health_check(&self) -> bool {
        self.search("duckduckgo").await.is_ok()
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hits_from_answer() {
        let json = r#"{
            "Heading": "MacBook Air",
            "AbstractText": "The MacBook Air is a line of laptops.",
            "AbstractURL": "https://en.wikipedia.org/wiki/MacBook_Air",
            "Results": [
                {"Text": "Apple - Official site", "FirstURL": "https://apple.com"}
            ],
            "RelatedTopics": [
                {"Text": "MacBook Pro - A line of laptops", "FirstURL": "https://example.com/pro"},
                {"Name": "Similar", "Topics": [
                    {"Text": "iPad - Tablet", "FirstURL": "https://example.com/ipad"}
                ]},
                {"Text": "", "FirstURL": ""}
            ]
        }"#;
        let answer: InstantAnswer = serde_json::from_str(json).unwrap();
        let hits = hits_from_answer(answer);

        assert_eq!(hits.len(), 4);
        assert_eq!(hits[0].title, "Apple");
        assert_eq!(hits[1].title, "MacBook Air");
        assert_eq!(hits[1].link, "https://en.wikipedia.org/wiki/MacBook_Air");
        assert_eq!(hits[2].title, "MacBook Pro");
        assert_eq!(hits[3].link, "https://example.com/ipad");
    }

    #[test]
    fn test_empty_answer_has_no_hits() {
        let answer: InstantAnswer = serde_json::from_str("{}").unwrap();
        assert!(hits_from_answer(answer).is_empty());
    }
}
