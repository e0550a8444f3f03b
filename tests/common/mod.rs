//! Shared fixtures for session tests

#![allow(dead_code)]

use async_trait::async_trait;
use incsearch::{
    ControllerState, FetchError, Page, PageResponse, Product, Query, SearchClient, SearchConfig,
    SearchSession,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(5);

struct Script {
    delay: Duration,
    result: Result<PageResponse, FetchError>,
}

/// Client answering from a fixed table keyed by query and page.
///
/// Unscripted requests return an empty page immediately.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    scripts: Arc<Mutex<HashMap<(String, Page), Script>>>,
    calls: Arc<Mutex<Vec<(String, Page)>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, query: &str, page: Page, count: usize, delay: Duration) -> &Self {
        let products = products(&format!("{} p{}", query, page), count);
        self.script(query, page, delay, Ok(PageResponse::from_products(products)))
    }

    pub fn fail(&self, query: &str, page: Page, error: FetchError) -> &Self {
        self.script(query, page, Duration::ZERO, Err(error))
    }

    fn script(
        &self,
        query: &str,
        page: Page,
        delay: Duration,
        result: Result<PageResponse, FetchError>,
    ) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .insert((query.to_string(), page), Script { delay, result });
        self
    }

    pub fn calls(&self) -> Vec<(String, Page)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchClient for ScriptedClient {
    async fn fetch_page(&self, query: &Query, page: Page) -> Result<PageResponse, FetchError> {
        let key = (query.to_string(), page);
        self.calls.lock().unwrap().push(key.clone());

        let (delay, result) = match self.scripts.lock().unwrap().get(&key) {
            Some(script) => (script.delay, script.result.clone()),
            None => (Duration::ZERO, Ok(PageResponse::default())),
        };
        tokio::time::sleep(delay).await;
        result
    }
}

pub fn products(prefix: &str, count: usize) -> Vec<Product> {
    (0..count)
        .map(|i| Product::new(format!("{} #{}", prefix, i), format!("${}.99", i)))
        .collect()
}

pub fn config(history_path: &Path) -> SearchConfig {
    SearchConfig {
        debounce_ms: 30,
        history_path: history_path.to_path_buf(),
        ..SearchConfig::default()
    }
}

/// Wait until the session state satisfies `predicate` and return that state.
pub async fn wait_until<F>(session: &SearchSession, predicate: F) -> ControllerState
where
    F: Fn(&ControllerState) -> bool,
{
    let mut state = session.watch();
    let matched = timeout(WAIT, state.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for session state")
        .expect("session stopped")
        .clone();
    matched
}

/// Names of the loaded products, in order.
pub fn names(state: &ControllerState) -> Vec<String> {
    state.results.iter().map(|p| p.name.clone()).collect()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
