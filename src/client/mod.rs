//! Remote search client
//!
//! The controller only sees the [`SearchClient`] trait: one call fetches one
//! page of products for a query. [`HttpSearchClient`] talks to the vendor's
//! keyword-search endpoint, and [`mapping`] turns its nested JSON into
//! [`Product`](crate::types::Product) rows.

pub mod http;
pub mod mapping;

pub use http::HttpSearchClient;
pub use mapping::{decode_page, map_response};

use crate::types::{Page, Product, Query};
use async_trait::async_trait;
use std::sync::Arc;

/// Fetch failures. Cloneable so it can be kept in state and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("request cancelled")]
    Cancelled,
}

/// One fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResponse {
    /// Products that survived mapping, in vendor order
    pub products: Vec<Product>,
    /// Items the vendor returned before records without name or price were dropped
    pub raw_count: usize,
}

impl PageResponse {
    /// A page where every returned record mapped to a product.
    pub fn from_products(products: Vec<Product>) -> Self {
        Self {
            raw_count: products.len(),
            products,
        }
    }
}

#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn fetch_page(&self, query: &Query, page: Page) -> Result<PageResponse, FetchError>;
}

#[async_trait]
impl<C: SearchClient + ?Sized> SearchClient for Arc<C> {
    async fn fetch_page(&self, query: &Query, page: Page) -> Result<PageResponse, FetchError> {
        (**self).fetch_page(query, page).await
    }
}
