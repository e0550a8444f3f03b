//! Search actor and session handle
//!
//! [`SearchActor`] owns the debouncer and the [`SearchController`] and is the
//! only place either is mutated. It runs inside an [`Actor`], so every input
//! event, timer expiry and fetch completion is handled one at a time on the
//! actor's control thread. Timers and fetches run as spawned tasks that post
//! their outcome back into the mailbox.
//!
//! After each message the actor diffs the state and publishes a
//! [`SearchEvent`] per changed observable value.

use crate::client::{FetchError, PageResponse, SearchClient};
use crate::config::SearchConfig;
use crate::controller::events::{changes, SearchCommand, SearchEvent};
use crate::controller::machine::SearchController;
use crate::controller::state::ControllerState;
use crate::core::{
    Actor, ActorController, ActorError, ActorSendError, Broadcaster, Message, MessageHandler,
};
use crate::debouncer::{DebounceTicket, QueryDebouncer};
use crate::history::HistoryStore;
use crate::types::RequestTag;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type SearchActorController = ActorController<SearchCommand, SearchEvent>;

struct PendingFetch {
    id: u64,
    token: CancellationToken,
}

pub struct SearchActor {
    controller: SearchController,
    debouncer: QueryDebouncer,
    client: Arc<dyn SearchClient>,
    debounce_timer: Option<JoinHandle<()>>,
    fetch: Option<PendingFetch>,
    cancel_superseded: bool,
    state_sender: watch::Sender<ControllerState>,
}

impl SearchActor {
    pub fn new(
        controller: SearchController,
        debouncer: QueryDebouncer,
        client: Arc<dyn SearchClient>,
        cancel_superseded: bool,
        state_sender: watch::Sender<ControllerState>,
    ) -> Self {
        Self {
            controller,
            debouncer,
            client,
            debounce_timer: None,
            fetch: None,
            cancel_superseded,
            state_sender,
        }
    }

    fn on_text_changed(&mut self, raw: &str, ctl: &SearchActorController) {
        let Some(ticket) = self.debouncer.push(raw) else {
            log::trace!("Ignoring input after dispose");
            return;
        };
        self.arm_timer(ticket, ctl);
    }

    fn on_debounce_elapsed(&mut self, ticket: DebounceTicket, ctl: &SearchActorController) {
        if let Some(value) = self.debouncer.fire(ticket) {
            log::debug!("Debounced commit '{}'", value);
            self.commit(&value, ctl);
        }
    }

    /// History picks commit immediately and replace any pending keystrokes.
    fn on_history_item_selected(&mut self, query: &str, ctl: &SearchActorController) {
        if self.debouncer.has_pending() {
            log::debug!("History pick replaces pending input");
        }
        self.disarm_timer();
        self.debouncer.mark_committed(query);
        log::debug!("History item '{}' selected", query);
        self.commit(query, ctl);
    }

    fn on_scrolled_near_end(&mut self, ctl: &SearchActorController) {
        if let Some(tag) = self.controller.load_more() {
            self.start_fetch(tag, ctl);
        }
    }

    fn on_fetch_completed(&mut self, tag: RequestTag, result: Result<PageResponse, FetchError>) {
        if self.fetch.as_ref().is_some_and(|fetch| fetch.id == tag.id) {
            self.fetch = None;
        }
        match result {
            Ok(page) => {
                self.controller.on_fetch_succeeded(&tag, page);
            }
            Err(error) => {
                self.controller.on_fetch_failed(&tag, error);
            }
        }
    }

    fn commit(&mut self, value: &str, ctl: &SearchActorController) {
        self.supersede_fetch();
        if let Some(tag) = self.controller.on_query_committed(value) {
            self.start_fetch(tag, ctl);
        }
    }

    fn arm_timer(&mut self, ticket: DebounceTicket, ctl: &SearchActorController) {
        self.disarm_timer();
        let mailbox = ctl.mailbox();
        self.debounce_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(ticket.delay).await;
            if mailbox
                .send(SearchCommand::DebounceElapsed(ticket).into_message())
                .is_err()
            {
                log::trace!("Debounce timer fired after shutdown");
            }
        }));
    }

    fn disarm_timer(&mut self) {
        if let Some(timer) = self.debounce_timer.take() {
            timer.abort();
        }
    }

    fn supersede_fetch(&mut self) {
        if let Some(fetch) = self.fetch.take() {
            if self.cancel_superseded {
                log::debug!("Cancelling superseded request #{}", fetch.id);
                fetch.token.cancel();
            }
        }
    }

    fn start_fetch(&mut self, tag: RequestTag, ctl: &SearchActorController) {
        let token = CancellationToken::new();
        self.fetch = Some(PendingFetch {
            id: tag.id,
            token: token.clone(),
        });

        let client = self.client.clone();
        let mailbox = ctl.mailbox();
        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(FetchError::Cancelled),
                result = client.fetch_page(&tag.query, tag.page) => result,
            };
            if mailbox
                .send(SearchCommand::FetchCompleted { tag, result }.into_message())
                .is_err()
            {
                log::trace!("Fetch completed after shutdown");
            }
        });
    }

    fn publish(&self, before: &ControllerState, ctl: &SearchActorController) {
        let after = self.controller.snapshot();
        if after == *before {
            return;
        }
        for event in changes(before, &after) {
            if let Err(e) = ctl.send_message(event.method(), event) {
                log::warn!("Failed to publish search event: {}", e);
            }
        }
        self.state_sender.send_replace(after);
    }
}

#[async_trait]
impl MessageHandler<SearchCommand, SearchEvent> for SearchActor {
    async fn on_message(
        &mut self,
        message: Message<SearchCommand>,
        controller: &SearchActorController,
    ) {
        log::trace!("SearchActor received message: {}", message.method);
        let before = self.controller.snapshot();

        match message.payload {
            SearchCommand::TextChanged(raw) => self.on_text_changed(&raw, controller),
            SearchCommand::DebounceElapsed(ticket) => self.on_debounce_elapsed(ticket, controller),
            SearchCommand::HistoryItemSelected(query) => {
                self.on_history_item_selected(&query, controller)
            }
            SearchCommand::ScrolledNearEnd => self.on_scrolled_near_end(controller),
            SearchCommand::ClearHistory => self.controller.clear_history(),
            SearchCommand::FetchCompleted { tag, result } => self.on_fetch_completed(tag, result),
        }

        self.publish(&before, controller);
    }

    async fn on_shutdown(&mut self, _controller: &SearchActorController) {
        if self.debouncer.is_disposed() {
            return;
        }
        log::debug!("SearchActor shutting down");
        self.debouncer.dispose();
        self.disarm_timer();
        if let Some(fetch) = self.fetch.take() {
            fetch.token.cancel();
        }
    }
}

/// Running search session: the search actor plus its observer fan-out.
///
/// Commands are fire-and-forget. Observers either [`subscribe`](Self::subscribe)
/// to change events or read the latest [`snapshot`](Self::snapshot).
pub struct SearchSession {
    actor: Actor<SearchCommand, SearchEvent>,
    broadcaster: Broadcaster<SearchEvent>,
    state: watch::Receiver<ControllerState>,
}

impl SearchSession {
    /// Hydrate history from `store` and start the session threads.
    pub fn start(
        config: &SearchConfig,
        client: Arc<dyn SearchClient>,
        store: Box<dyn HistoryStore>,
    ) -> Result<Self, ActorError> {
        let controller = SearchController::new(store, config.page_size, config.history_limit);
        let (state_sender, state) = watch::channel(controller.snapshot());
        let handler = SearchActor::new(
            controller,
            QueryDebouncer::new(config.debounce()),
            client,
            config.cancel_superseded,
            state_sender,
        );

        let (broadcaster, sender) = Broadcaster::new()?;
        let actor = Actor::new(handler, sender)?;
        log::info!(
            "Search session started (debounce {:?}, page size {})",
            config.debounce(),
            config.page_size
        );

        Ok(Self {
            actor,
            broadcaster,
            state,
        })
    }

    /// Receive every change event published from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Message<SearchEvent>> {
        let receiver = self.broadcaster.subscribe();
        log::debug!("Observer subscribed ({} registered)", self.broadcaster.subscriber_count());
        receiver
    }

    pub fn snapshot(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    /// Receiver that tracks the latest state.
    pub fn watch(&self) -> watch::Receiver<ControllerState> {
        self.state.clone()
    }

    pub fn on_text_changed(&self, text: impl Into<String>) -> Result<(), ActorSendError> {
        self.send(SearchCommand::TextChanged(text.into()))
    }

    pub fn on_history_item_selected(&self, query: impl Into<String>) -> Result<(), ActorSendError> {
        self.send(SearchCommand::HistoryItemSelected(query.into()))
    }

    pub fn on_scrolled_near_end(&self) -> Result<(), ActorSendError> {
        self.send(SearchCommand::ScrolledNearEnd)
    }

    pub fn clear_history(&self) -> Result<(), ActorSendError> {
        self.send(SearchCommand::ClearHistory)
    }

    /// Stop the actor, then the broadcaster. Pending timers and fetches are dropped.
    pub fn shutdown(&mut self) {
        self.actor.shutdown();
        self.broadcaster.shutdown();
    }

    fn send(&self, command: SearchCommand) -> Result<(), ActorSendError> {
        self.actor.send(command.into_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use crate::types::{Page, Product, Query};
    use std::time::Duration;

    /// Answers after `delay`, or never if `hang` is set.
    struct StubClient {
        delay: Duration,
        hang: bool,
    }

    #[async_trait]
    impl SearchClient for StubClient {
        async fn fetch_page(&self, query: &Query, page: Page) -> Result<PageResponse, FetchError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(self.delay).await;
            Ok(PageResponse::from_products(vec![Product::new(
                format!("{} p{}", query, page),
                "$1.00",
            )]))
        }
    }

    struct Harness {
        actor: SearchActor,
        ctl: SearchActorController,
        mailbox: mpsc::UnboundedReceiver<Message<SearchCommand>>,
        events: mpsc::UnboundedReceiver<Message<SearchEvent>>,
        state: watch::Receiver<ControllerState>,
    }

    impl Harness {
        fn new(client: StubClient, cancel_superseded: bool) -> Self {
            let controller = SearchController::new(Box::new(MemoryHistoryStore::new(10)), 20, 10);
            let (state_sender, state) = watch::channel(controller.snapshot());
            let actor = SearchActor::new(
                controller,
                QueryDebouncer::new(Duration::from_millis(5)),
                Arc::new(client),
                cancel_superseded,
                state_sender,
            );
            let (event_tx, events) = mpsc::unbounded_channel();
            let (mailbox_tx, mailbox) = mpsc::unbounded_channel();
            Self {
                actor,
                ctl: ActorController::new(event_tx, mailbox_tx),
                mailbox,
                events,
                state,
            }
        }

        async fn handle(&mut self, command: SearchCommand) {
            self.actor.on_message(command.into_message(), &self.ctl).await;
        }

        /// Feed the next self-posted message back into the actor.
        async fn pump(&mut self) -> &'static str {
            let message = tokio::time::timeout(Duration::from_secs(2), self.mailbox.recv())
                .await
                .expect("timed out waiting for mailbox")
                .expect("mailbox closed");
            let method = message.payload.method();
            self.actor.on_message(message, &self.ctl).await;
            method
        }

        fn drain_events(&mut self) -> Vec<String> {
            let mut methods = Vec::new();
            while let Ok(message) = self.events.try_recv() {
                methods.push(message.method);
            }
            methods
        }
    }

    #[tokio::test]
    async fn test_keystrokes_debounce_into_one_fetch() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut harness = Harness::new(StubClient { delay: Duration::ZERO, hang: false }, true);

        for raw in ["m", "mi", "milk"] {
            harness.handle(SearchCommand::TextChanged(raw.to_string())).await;
        }
        // Earlier timers were aborted, so the first post is the last ticket
        assert_eq!(harness.pump().await, "debounceElapsed");
        assert!(harness.state.borrow().is_searching);
        assert_eq!(harness.pump().await, "fetchCompleted");

        let state = harness.state.borrow().clone();
        assert!(!state.is_searching);
        assert_eq!(state.results[0].name, "milk p1");
        assert_eq!(state.history.entries(), ["milk"]);
        assert_eq!(
            harness.drain_events(),
            ["searchingChanged", "resultsChanged", "searchingChanged", "historyChanged"]
        );
    }

    #[tokio::test]
    async fn test_history_selection_cancels_superseded_fetch() {
        let mut harness = Harness::new(StubClient { delay: Duration::ZERO, hang: true }, true);

        harness.handle(SearchCommand::HistoryItemSelected("apples".into())).await;
        harness.handle(SearchCommand::HistoryItemSelected("bananas".into())).await;

        // Only the cancelled fetch can complete; its result is discarded
        assert_eq!(harness.pump().await, "fetchCompleted");
        let state = harness.state.borrow().clone();
        assert!(state.is_searching);
        assert_eq!(state.active_query.as_ref().map(Query::as_str), Some("bananas"));
        assert!(state.last_error.is_none());
    }

    #[tokio::test]
    async fn test_superseded_fetch_runs_on_when_not_cancelling() {
        let client = StubClient {
            delay: Duration::from_millis(5),
            hang: false,
        };
        let mut harness = Harness::new(client, false);

        harness.handle(SearchCommand::HistoryItemSelected("apples".into())).await;
        harness.handle(SearchCommand::HistoryItemSelected("bananas".into())).await;
        harness.pump().await;
        harness.pump().await;

        let state = harness.state.borrow().clone();
        assert_eq!(state.results.len(), 1);
        assert_eq!(state.results[0].name, "bananas p1");
        assert_eq!(state.history.entries(), ["bananas"]);
    }

    #[tokio::test]
    async fn test_history_selection_suppresses_pending_keystrokes() {
        let mut harness = Harness::new(StubClient { delay: Duration::ZERO, hang: false }, true);

        harness.handle(SearchCommand::TextChanged("bre".into())).await;
        harness.handle(SearchCommand::HistoryItemSelected("bread".into())).await;
        assert_eq!(harness.pump().await, "fetchCompleted");

        // Echo of the picked value from the text field does not refetch
        harness.handle(SearchCommand::TextChanged("bread".into())).await;
        assert_eq!(harness.pump().await, "debounceElapsed");
        assert!(!harness.state.borrow().is_searching);
    }

    #[tokio::test]
    async fn test_shutdown_disposes_debouncer() {
        let mut harness = Harness::new(StubClient { delay: Duration::ZERO, hang: false }, true);
        let ctl = harness.ctl.clone();
        harness.actor.on_shutdown(&ctl).await;

        harness.handle(SearchCommand::TextChanged("milk".into())).await;
        let next = tokio::time::timeout(Duration::from_millis(50), harness.mailbox.recv()).await;
        assert!(next.is_err());
    }
}
