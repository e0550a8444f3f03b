//! Search controller state machine
//!
//! The controller decides which page to fetch and how each completion changes
//! state; it never performs I/O on the network itself. Methods that start a
//! fetch return the [`RequestTag`] the caller must fetch and later report back
//! through [`SearchController::on_fetch_succeeded`] or
//! [`SearchController::on_fetch_failed`].
//!
//! Only one fetch is current at a time. A completion is applied only if its
//! tag is the current one, which implies its query is still the active query;
//! everything else is a stale response and is discarded untouched.

use crate::client::{FetchError, PageResponse};
use crate::controller::state::ControllerState;
use crate::history::{HistoryList, HistoryStore};
use crate::types::{Page, Query, RequestTag, FIRST_PAGE};

pub struct SearchController {
    state: ControllerState,
    store: Box<dyn HistoryStore>,
    page_size: usize,
    next_request_id: u64,
    in_flight: Option<RequestTag>,
}

impl SearchController {
    /// Create a controller, hydrating history from `store`.
    ///
    /// A store that fails to load starts the session with empty history.
    pub fn new(store: Box<dyn HistoryStore>, page_size: usize, history_limit: usize) -> Self {
        let history = match store.load() {
            Ok(entries) => HistoryList::from_entries(entries, history_limit),
            Err(e) => {
                log::warn!("Failed to load search history, starting empty: {}", e);
                HistoryList::new(history_limit)
            }
        };
        log::debug!("Controller created with {} history entries", history.len());

        Self {
            state: ControllerState::new(history),
            store,
            page_size,
            next_request_id: 1,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Copy-out of the current state.
    pub fn snapshot(&self) -> ControllerState {
        self.state.clone()
    }

    /// The fetch whose completion would currently be applied.
    pub fn in_flight(&self) -> Option<&RequestTag> {
        self.in_flight.as_ref()
    }

    /// A debounced query was committed.
    ///
    /// Blank input returns to idle without fetching. Anything else resets
    /// results and returns the page-1 request to issue, even when the query
    /// equals the active one.
    pub fn on_query_committed(&mut self, raw: &str) -> Option<RequestTag> {
        let Some(query) = Query::parse(raw) else {
            log::debug!("Empty query committed, clearing results");
            self.in_flight = None;
            self.state.active_query = None;
            self.state.current_page = FIRST_PAGE;
            self.state.can_load_more = false;
            self.state.is_searching = false;
            self.state.results.clear();
            self.state.last_error = None;
            return None;
        };

        if let Some(superseded) = self.in_flight.take() {
            log::debug!("Request {} superseded by '{}'", superseded, query);
        }

        self.state.active_query = Some(query.clone());
        self.state.current_page = FIRST_PAGE;
        self.state.can_load_more = true;
        self.state.results.clear();
        self.state.is_searching = true;
        self.state.last_error = None;

        let tag = self.issue(query, FIRST_PAGE);
        log::info!("Searching {}", tag);
        Some(tag)
    }

    /// Request the next page of the active query.
    ///
    /// No-op while a fetch is in flight, when the last page was short, when
    /// there is no active query, or before the first page has loaded.
    pub fn load_more(&mut self) -> Option<RequestTag> {
        let Some(query) = self.state.active_query.clone() else {
            log::trace!("load_more ignored: no active query");
            return None;
        };
        if self.state.is_searching {
            log::trace!("load_more ignored: fetch in flight");
            return None;
        }
        if !self.state.can_load_more {
            log::trace!("load_more ignored: no more pages for '{}'", query);
            return None;
        }
        if self.state.current_page <= FIRST_PAGE {
            log::trace!("load_more ignored: first page of '{}' not loaded", query);
            return None;
        }

        self.state.is_searching = true;
        let tag = self.issue(query, self.state.current_page);
        log::info!("Loading more {}", tag);
        Some(tag)
    }

    /// Apply a successful fetch. Returns `false` if it was stale.
    pub fn on_fetch_succeeded(&mut self, tag: &RequestTag, page: PageResponse) -> bool {
        if !self.is_current(tag) {
            log::debug!("Discarding stale response for {}", tag);
            return false;
        }
        self.in_flight = None;

        let received = page.products.len();
        if tag.page == FIRST_PAGE {
            self.state.results = page.products;
        } else {
            self.state.results.extend(page.products);
        }
        self.state.can_load_more = page.raw_count >= self.page_size;
        self.state.current_page = tag.page + 1;
        self.state.is_searching = false;
        self.state.last_error = None;

        log::info!(
            "Applied {}: {} products ({} raw), {} total, more: {}",
            tag,
            received,
            page.raw_count,
            self.state.results.len(),
            self.state.can_load_more
        );

        self.record_history(&tag.query);
        true
    }

    /// Apply a failed fetch. Returns `false` if it was stale.
    ///
    /// Results and pagination are left as they were.
    pub fn on_fetch_failed(&mut self, tag: &RequestTag, error: FetchError) -> bool {
        if !self.is_current(tag) {
            log::debug!("Discarding stale failure for {}: {}", tag, error);
            return false;
        }
        self.in_flight = None;

        log::warn!("Search {} failed: {}", tag, error);
        self.state.is_searching = false;
        self.state.last_error = Some(error);
        true
    }

    /// Forget all history, in memory and in the store.
    pub fn clear_history(&mut self) {
        self.state.history.clear();
        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear persisted search history: {}", e);
        }
        log::info!("Search history cleared");
    }

    fn issue(&mut self, query: Query, page: Page) -> RequestTag {
        let tag = RequestTag {
            id: self.next_request_id,
            query,
            page,
        };
        self.next_request_id += 1;
        self.in_flight = Some(tag.clone());
        tag
    }

    fn is_current(&self, tag: &RequestTag) -> bool {
        self.in_flight.as_ref() == Some(tag) && self.state.active_query.as_ref() == Some(&tag.query)
    }

    fn record_history(&mut self, query: &Query) {
        self.state.history.record(query);
        // Store-side record is idempotent, so repeat pages are harmless
        if let Err(e) = self.store.record(query) {
            log::warn!("Failed to persist search history: {}", e);
        }
    }
}
