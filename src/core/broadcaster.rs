//! Broadcaster for fanning actor notifications out to observers
//!
//! The broadcaster owns the receiving end of an actor's outbound channel and
//! relays every message to all current subscribers. Subscribers only hold a
//! receiver; a subscriber whose receiver was dropped is pruned on the next
//! message, so observers never keep the publishing actor alive.

use crate::core::actor::ActorError;
use crate::core::message::Message;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};

type Subscribers<T> = Arc<Mutex<Vec<mpsc::UnboundedSender<Message<T>>>>>;

/// A broadcaster that relays one message stream to any number of subscribers
pub struct Broadcaster<T: Clone + Send + 'static> {
    subscribers: Subscribers<T>,
    /// Handle to the broadcast loop thread
    thread_handle: Option<JoinHandle<()>>,
    /// Channel for sending shutdown signal
    shutdown_sender: Option<oneshot::Sender<()>>,
}

impl<T: Clone + Send + 'static> Broadcaster<T> {
    /// Create a new broadcaster.
    ///
    /// Returns the broadcaster instance and the sender that the publishing
    /// actor should use as its outbound channel.
    pub fn new() -> Result<(Self, mpsc::UnboundedSender<Message<T>>), ActorError> {
        let (shared_sender, broadcast_receiver) = mpsc::unbounded_channel();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();
        let subscribers: Subscribers<T> = Arc::new(Mutex::new(Vec::new()));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ActorError::Runtime)?;

        let loop_subscribers = subscribers.clone();
        let thread_handle = std::thread::Builder::new()
            .name("incsearch-broadcast".to_string())
            .spawn(move || {
                runtime.block_on(Self::run_broadcast_loop(
                    broadcast_receiver,
                    loop_subscribers,
                    shutdown_receiver,
                ));
            })
            .map_err(ActorError::Spawn)?;

        let broadcaster = Self {
            subscribers,
            thread_handle: Some(thread_handle),
            shutdown_sender: Some(shutdown_sender),
        };

        Ok((broadcaster, shared_sender))
    }

    /// Register a new observer. Only messages published after this call are delivered.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Message<T>> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(sender);
        receiver
    }

    /// Number of live subscribers as of the last broadcast.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn run_broadcast_loop(
        mut broadcast_receiver: mpsc::UnboundedReceiver<Message<T>>,
        subscribers: Subscribers<T>,
        mut shutdown_receiver: oneshot::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown_receiver => {
                    log::debug!("Received shutdown signal, stopping broadcast loop");
                    break;
                }
                message = broadcast_receiver.recv() => {
                    match message {
                        Some(message) => Self::broadcast_to_all(&subscribers, message),
                        None => {
                            log::debug!("Broadcast receiver channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }

    fn broadcast_to_all(subscribers: &Subscribers<T>, message: Message<T>) {
        let mut subscribers = subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        log::trace!(
            "Broadcasting message to {} subscribers: method={}",
            subscribers.len(),
            message.method
        );
        subscribers.retain(|sender| match sender.send(message.clone()) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("Dropping closed subscriber");
                false
            }
        });
    }

    /// Manually shutdown the broadcaster
    pub fn shutdown(&mut self) {
        if let Some(shutdown_sender) = self.shutdown_sender.take() {
            let _ = shutdown_sender.send(());
        }

        if let Some(thread_handle) = self.thread_handle.take() {
            log::debug!("Waiting for broadcast loop thread to finish");
            if thread_handle.join().is_err() {
                log::error!("Broadcast thread panicked");
            }
        }
    }
}

impl<T: Clone + Send + 'static> Drop for Broadcaster<T> {
    fn drop(&mut self) {
        if self.shutdown_sender.is_some() || self.thread_handle.is_some() {
            log::debug!("Broadcaster dropped without explicit shutdown, performing cleanup");
            self.shutdown();
        }
    }
}
