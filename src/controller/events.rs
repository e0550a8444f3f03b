//! Messages flowing into and out of the search actor

use crate::client::{FetchError, PageResponse};
use crate::controller::state::ControllerState;
use crate::core::Message;
use crate::debouncer::DebounceTicket;
use crate::types::{Product, RequestTag};

/// Inbound messages handled by the search actor
#[derive(Debug)]
pub enum SearchCommand {
    /// Raw search-field text changed
    TextChanged(String),
    /// A debounce timer armed for this ticket elapsed
    DebounceElapsed(DebounceTicket),
    /// User picked an entry from the history list
    HistoryItemSelected(String),
    /// Result view scrolled near its end
    ScrolledNearEnd,
    ClearHistory,
    /// A spawned fetch finished, successfully or not
    FetchCompleted {
        tag: RequestTag,
        result: Result<PageResponse, FetchError>,
    },
}

impl SearchCommand {
    pub fn method(&self) -> &'static str {
        match self {
            SearchCommand::TextChanged(_) => "textChanged",
            SearchCommand::DebounceElapsed(_) => "debounceElapsed",
            SearchCommand::HistoryItemSelected(_) => "historyItemSelected",
            SearchCommand::ScrolledNearEnd => "scrolledNearEnd",
            SearchCommand::ClearHistory => "clearHistory",
            SearchCommand::FetchCompleted { .. } => "fetchCompleted",
        }
    }

    pub fn into_message(self) -> Message<SearchCommand> {
        Message::new(self.method(), self)
    }
}

/// Outbound notifications for presentation observers.
///
/// Each carries the full new value, not a delta.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    ResultsChanged(Vec<Product>),
    SearchingChanged(bool),
    HistoryChanged(Vec<String>),
    ErrorChanged(Option<FetchError>),
}

impl SearchEvent {
    pub fn method(&self) -> &'static str {
        match self {
            SearchEvent::ResultsChanged(_) => "resultsChanged",
            SearchEvent::SearchingChanged(_) => "searchingChanged",
            SearchEvent::HistoryChanged(_) => "historyChanged",
            SearchEvent::ErrorChanged(_) => "errorChanged",
        }
    }

    pub fn into_message(self) -> Message<SearchEvent> {
        Message::new(self.method(), self)
    }
}

/// Events for every observable value that differs between two states.
pub fn changes(before: &ControllerState, after: &ControllerState) -> Vec<SearchEvent> {
    let mut events = Vec::new();
    if before.results != after.results {
        events.push(SearchEvent::ResultsChanged(after.results.clone()));
    }
    if before.is_searching != after.is_searching {
        events.push(SearchEvent::SearchingChanged(after.is_searching));
    }
    if before.history != after.history {
        events.push(SearchEvent::HistoryChanged(after.history.entries().to_vec()));
    }
    if before.last_error != after.last_error {
        events.push(SearchEvent::ErrorChanged(after.last_error.clone()));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryList;
    use crate::types::Query;

    #[test]
    fn test_unchanged_state_produces_no_events() {
        let state = ControllerState::default();
        assert!(changes(&state, &state.clone()).is_empty());
    }

    #[test]
    fn test_commit_reports_searching_only() {
        let before = ControllerState::default();
        let mut after = before.clone();
        after.active_query = Query::parse("milk");
        after.is_searching = true;
        after.can_load_more = true;

        assert_eq!(changes(&before, &after), vec![SearchEvent::SearchingChanged(true)]);
    }

    #[test]
    fn test_success_reports_results_searching_and_history() {
        let mut before = ControllerState::new(HistoryList::new(10));
        before.is_searching = true;
        let mut after = before.clone();
        after.is_searching = false;
        after.results = vec![Product::new("Milk", "$1.00")];
        after.history.record(&Query::parse("milk").unwrap());

        let events = changes(&before, &after);
        let methods: Vec<_> = events.iter().map(SearchEvent::method).collect();
        assert_eq!(methods, ["resultsChanged", "searchingChanged", "historyChanged"]);
        assert_eq!(events[2], SearchEvent::HistoryChanged(vec!["milk".to_string()]));
    }

    #[test]
    fn test_error_change_carries_new_value() {
        let before = ControllerState::default();
        let mut after = before.clone();
        after.last_error = Some(FetchError::Network("offline".into()));

        assert_eq!(
            changes(&before, &after),
            vec![SearchEvent::ErrorChanged(Some(FetchError::Network("offline".into())))]
        );
    }

    #[test]
    fn test_command_methods() {
        let message = SearchCommand::TextChanged("m".into()).into_message();
        assert_eq!(message.method, "textChanged");
        assert_eq!(SearchCommand::ScrolledNearEnd.method(), "scrolledNearEnd");
    }
}
