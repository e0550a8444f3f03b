//! Query debounce control
//!
//! Turns raw text-change events into committed queries. A value commits only
//! after the quiet interval passes with no newer input, and a commit equal to
//! the previous commit is suppressed. The empty string is a value like any
//! other; committing it triggers the controller's clear path.
//!
//! The debouncer itself never sleeps. [`QueryDebouncer::push`] hands back a
//! [`DebounceTicket`]; the owner arms a timer for `ticket.delay` and calls
//! [`QueryDebouncer::fire`] with the ticket when it elapses. Tickets from
//! superseded input are recognised by their generation and yield nothing.

use std::time::Duration;

/// Token for one armed debounce timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTicket {
    pub generation: u64,
    pub delay: Duration,
}

#[derive(Debug, Clone)]
struct PendingCommit {
    value: String,
    generation: u64,
}

#[derive(Debug)]
pub struct QueryDebouncer {
    quiet_interval: Duration,
    pending: Option<PendingCommit>,
    last_committed: Option<String>,
    generation: u64,
    disposed: bool,
}

impl QueryDebouncer {
    pub fn new(quiet_interval: Duration) -> Self {
        Self {
            quiet_interval,
            pending: None,
            last_committed: None,
            generation: 0,
            disposed: false,
        }
    }

    /// Register a raw text value, replacing any pending one.
    ///
    /// The value is trimmed. Returns `None` once disposed.
    pub fn push(&mut self, raw: &str) -> Option<DebounceTicket> {
        if self.disposed {
            return None;
        }
        self.generation += 1;
        self.pending = Some(PendingCommit {
            value: raw.trim().to_string(),
            generation: self.generation,
        });
        Some(DebounceTicket {
            generation: self.generation,
            delay: self.quiet_interval,
        })
    }

    /// Timer for `ticket` elapsed. Returns the committed value, if any.
    pub fn fire(&mut self, ticket: DebounceTicket) -> Option<String> {
        if self.disposed {
            return None;
        }
        match &self.pending {
            Some(pending) if pending.generation == ticket.generation => {}
            _ => return None,
        }
        let pending = self.pending.take()?;

        if self.last_committed.as_deref() == Some(pending.value.as_str()) {
            log::trace!("Suppressing duplicate commit '{}'", pending.value);
            return None;
        }
        self.last_committed = Some(pending.value.clone());
        Some(pending.value)
    }

    /// Treat `value` as the latest commit, for commits that bypass the timer.
    pub fn mark_committed(&mut self, value: &str) {
        self.pending = None;
        self.last_committed = Some(value.trim().to_string());
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending value and refuse all further input.
    pub fn dispose(&mut self) {
        self.pending = None;
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debouncer() -> QueryDebouncer {
        QueryDebouncer::new(Duration::from_millis(650))
    }

    #[test]
    fn test_ticket_carries_quiet_interval() {
        let mut debouncer = debouncer();
        let ticket = debouncer.push("m").unwrap();
        assert_eq!(ticket.delay, Duration::from_millis(650));
        assert!(debouncer.has_pending());
    }

    #[test]
    fn test_rapid_input_commits_only_last_value() {
        let mut debouncer = debouncer();
        let tickets: Vec<_> = ["m", "mi", "mil", "milk"]
            .iter()
            .map(|raw| debouncer.push(raw).unwrap())
            .collect();

        // Earlier timers elapse without emitting
        for ticket in &tickets[..3] {
            assert_eq!(debouncer.fire(*ticket), None);
            assert!(debouncer.has_pending());
        }
        assert_eq!(debouncer.fire(tickets[3]), Some("milk".to_string()));
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_duplicate_commit_suppressed() {
        let mut debouncer = debouncer();
        let ticket = debouncer.push("milk").unwrap();
        assert_eq!(debouncer.fire(ticket), Some("milk".to_string()));

        // Typing and deleting a character lands on the same value
        debouncer.push("milks").unwrap();
        let ticket = debouncer.push("milk").unwrap();
        assert_eq!(debouncer.fire(ticket), None);
    }

    #[test]
    fn test_non_adjacent_repeat_is_emitted() {
        let mut debouncer = debouncer();
        let inputs = [("milk", Some("milk")), ("bread", Some("bread")), ("milk", Some("milk"))];
        for (raw, expected) in inputs {
            let ticket = debouncer.push(raw).unwrap();
            assert_eq!(debouncer.fire(ticket).as_deref(), expected);
        }
    }

    #[test]
    fn test_empty_value_commits() {
        let mut debouncer = debouncer();
        let ticket = debouncer.push("milk").unwrap();
        debouncer.fire(ticket);

        let ticket = debouncer.push("   ").unwrap();
        assert_eq!(debouncer.fire(ticket), Some(String::new()));
    }

    #[test]
    fn test_mark_committed_cancels_pending_and_suppresses_echo() {
        let mut debouncer = debouncer();
        let stale = debouncer.push("mi").unwrap();
        debouncer.mark_committed("milk");

        assert_eq!(debouncer.fire(stale), None);
        let ticket = debouncer.push("milk").unwrap();
        assert_eq!(debouncer.fire(ticket), None);
    }

    #[test]
    fn test_dispose_stops_emission() {
        let mut debouncer = debouncer();
        let ticket = debouncer.push("milk").unwrap();
        debouncer.dispose();

        assert_eq!(debouncer.fire(ticket), None);
        assert!(debouncer.push("bread").is_none());
        assert!(debouncer.is_disposed());
    }
}
