//! Market-price web search
//!
//! - `SearchBackend` trait: product price lookup returning title/link/snippet hits
//! - `SearchClient` enum: concrete wrapper with compile-time dispatch
//! - Implementations: `DuckDuckGoSearch` (HTTP), `MockSearch` (tests)
//!
//! `SEARCH_BACKEND` selects the implementation: `duckduckgo` (default),
//! `mock`, or `none` to disable lookups.

mod duckduckgo;
mod mock;

pub use duckduckgo::DuckDuckGoSearch;
pub use mock::MockSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Suffix appended to product queries ("price" in Turkish)
pub const PRICE_QUERY_SUFFIX: &str = "fiyat";

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(title: impl Into<String>, link: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Build the query used for a product price lookup
pub fn price_query(product: &str) -> String {
    format!("{} {}", product.trim(), PRICE_QUERY_SUFFIX)
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Raw web search. No results is `Ok(vec![])`.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Search for a product's market price
    async fn search_product_price(&self, product: &str) -> Result<Vec<SearchHit>> {
        self.search(&price_query(product)).await
    }

    async fn health_check(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Concrete search client enum
#[derive(Clone)]
pub enum SearchClient {
    DuckDuckGo(DuckDuckGoSearch),
    Mock(MockSearch),
}

impl SearchClient {
    /// Create a search client from `SEARCH_BACKEND` (None when disabled)
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("SEARCH_BACKEND").unwrap_or_else(|_| "duckduckgo".to_string());

        match backend.to_lowercase().as_str() {
            "duckduckgo" | "ddg" => Some(SearchClient::DuckDuckGo(DuckDuckGoSearch::new())),
            "mock" => Some(SearchClient::Mock(MockSearch::new())),
            "none" | "off" | "disabled" => None,
            _ => {
                tracing::warn!(backend = %backend, "Unknown SEARCH_BACKEND, falling back to duckduckgo");
                Some(SearchClient::DuckDuckGo(DuckDuckGoSearch::new()))
            }
        }
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        match self {
            SearchClient::DuckDuckGo(b) => b.search(query).await,
            SearchClient::Mock(b) => b.search(query).await,
        }
    }

    async fn search_product_price(&self, product: &str) -> Result<Vec<SearchHit>> {
        match self {
            SearchClient::DuckDuckGo(b) => b.search_product_price(product).await,
            SearchClient::Mock(b) => b.search_product_price(product).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            SearchClient::DuckDuckGo(b) => b.health_check().await,
            SearchClient::Mock(b) => b.health_check().await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            SearchClient::DuckDuckGo(b) => b.name(),
            SearchClient::Mock(b) => b.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_query() {
        assert_eq!(price_query(" laptop "), "laptop fiyat");
    }

    #[tokio::test]
    async fn test_client_dispatch_to_mock() {
        let mock = MockSearch::new().with_results(
            "laptop",
            vec![SearchHit::new("Laptop", "https://example.com", "25.000 TL")],
        );
        let client = SearchClient::Mock(mock.clone());
        let hits = client.search_product_price("laptop").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(mock.queries(), vec!["laptop fiyat"]);
        assert_eq!(client.name(), "mock");
    }
}
