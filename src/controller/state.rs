use crate::client::FetchError;
use crate::history::HistoryList;
use crate::types::{Page, Product, Query, FIRST_PAGE};

/// Everything the controller knows. Owned and mutated only by
/// [`SearchController`](super::SearchController); observers get clones.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub active_query: Option<Query>,
    /// Page the next load-more will request
    pub current_page: Page,
    pub is_searching: bool,
    pub can_load_more: bool,
    /// Accumulated products for `active_query`
    pub results: Vec<Product>,
    pub history: HistoryList,
    /// Failure of the last applied fetch, cleared by the next commit or success
    pub last_error: Option<FetchError>,
}

/// Coarse state derived from the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LoadingReset,
    LoadingAppend,
    Loaded,
    Failed,
}

impl ControllerState {
    pub fn new(history: HistoryList) -> Self {
        Self {
            active_query: None,
            current_page: FIRST_PAGE,
            is_searching: false,
            can_load_more: false,
            results: Vec::new(),
            history,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.active_query, self.is_searching) {
            (None, _) => Phase::Idle,
            (Some(_), true) if self.current_page == FIRST_PAGE => Phase::LoadingReset,
            (Some(_), true) => Phase::LoadingAppend,
            (Some(_), false) if self.last_error.is_some() => Phase::Failed,
            (Some(_), false) => Phase::Loaded,
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(HistoryList::default())
    }
}
