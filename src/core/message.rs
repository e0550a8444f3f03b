//! Message types and handler traits for the Actor system.

use crate::core::actor::ActorController;
use async_trait::async_trait;

/// A generic message in the Actor system.
/// T represents the payload type, which can be any type that satisfies the required bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Message<T> {
    /// The method name for this message
    pub method: String,
    /// The message payload
    pub payload: T,
}

impl<T> Message<T> {
    /// Create a new Message with the specified method and payload.
    pub fn new(method: impl Into<String>, payload: T) -> Self {
        Self {
            method: method.into(),
            payload,
        }
    }
}

/// Trait for handling messages in the Actor system.
///
/// `T` is the payload type the actor receives in its mailbox, `O` the payload
/// type it publishes to external listeners. Every call on one handler runs on
/// the actor's control thread, one message at a time.
#[async_trait]
pub trait MessageHandler<T: Send + 'static, O: Send + 'static>: Send {
    /// Handle an incoming message.
    ///
    /// # Arguments
    /// * `message` - The incoming message to process
    /// * `controller` - Publishes outbound notifications and posts follow-up
    ///   messages back into this actor's mailbox
    async fn on_message(&mut self, message: Message<T>, controller: &ActorController<T, O>);

    /// Called once on the control thread before the message loop exits.
    async fn on_shutdown(&mut self, _controller: &ActorController<T, O>) {}
}
