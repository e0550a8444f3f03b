//! HTTP implementation of [`SearchClient`]

use crate::client::{decode_page, FetchError, PageResponse, SearchClient};
use crate::config::ClientConfig;
use crate::types::{Page, Query};
use async_trait::async_trait;
use std::time::Duration;

/// Fetches pages from the keyword-search endpoint with one GET per page.
#[derive(Debug, Clone)]
pub struct HttpSearchClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpSearchClient {
    pub fn new(config: ClientConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    fn request(&self, query: &Query, page: Page) -> reqwest::RequestBuilder {
        let page = page.to_string();
        let mut request = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("keyword", query.as_str()),
                ("page", page.as_str()),
                ("sortBy", self.config.sort_by.as_str()),
            ])
            .header("content-type", "application/json")
            .header("x-rapidapi-key", &self.config.api_key);

        if let Some(host) = &self.config.api_host {
            request = request.header("x-rapidapi-host", host);
        }
        request
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn fetch_page(&self, query: &Query, page: Page) -> Result<PageResponse, FetchError> {
        log::debug!("GET page {} for '{}'", page, query);

        let response = self
            .request(query, page)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Network(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let page_response = decode_page(&body)?;
        log::debug!(
            "Page {} for '{}': {} records, {} products",
            page,
            query,
            page_response.raw_count,
            page_response.products.len()
        );
        Ok(page_response)
    }
}
