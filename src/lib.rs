//! incsearch - incremental product search
//!
//! Debounced keystrokes become committed queries, committed queries become
//! paginated fetches against a remote product API, and only responses for the
//! active query ever reach the result list. Successful queries are kept in a
//! bounded, persisted history.

pub mod app;
pub mod client;
pub mod config;
pub mod controller;
pub mod core;
pub mod debouncer;
pub mod error;
pub mod history;
pub mod presenter;
pub mod types;

pub use client::{FetchError, HttpSearchClient, PageResponse, SearchClient};
pub use config::{ClientConfig, SearchConfig};
pub use controller::{ControllerState, Phase, SearchController, SearchEvent, SearchSession};
pub use debouncer::QueryDebouncer;
pub use error::{ConfigError, HistoryError};
pub use history::{HistoryList, HistoryStore, JsonFileHistoryStore, MemoryHistoryStore};
pub use presenter::{Presenter, TerminalPresenter};
pub use types::{Page, Product, Query, RequestTag};
