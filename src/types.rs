use serde::{Deserialize, Serialize};
use std::fmt;

/// Items the remote API returns for a full page. Fewer means the query is exhausted.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// 1-based page cursor.
pub type Page = u32;

pub const FIRST_PAGE: Page = 1;

/// A non-empty, trimmed search string.
///
/// Equality is exact string equality on the trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query(String);

impl Query {
    /// Trim `raw` and wrap it. Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Query {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| "query must not be empty".to_string())
    }
}

impl From<Query> for String {
    fn from(query: Query) -> Self {
        query.0
    }
}

impl PartialEq<str> for Query {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Query {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A product row. `name` and `price` are never empty; records lacking either
/// are dropped while mapping the raw response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: String,
    pub image_url: Option<String>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            image_url: None,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

/// Identifies one outstanding page fetch so that its completion can be
/// correlated with the controller's current intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    /// Monotonic per controller instance
    pub id: u64,
    pub query: Query,
    pub page: Page,
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} '{}' page {}", self.id, self.query, self.page)
    }
}
