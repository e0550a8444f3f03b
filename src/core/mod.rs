//! Core module for notification-based communication
//!
//! This module provides a lightweight actor system based on notification
//! messages. An actor serializes every transition of its handler on one
//! control thread; a broadcaster fans its outbound notifications out to
//! observers.

pub mod actor;
pub mod broadcaster;
pub mod message;

// Re-exports for convenience
pub use actor::{Actor, ActorController, ActorError, ActorSendError};
pub use broadcaster::Broadcaster;
pub use message::{Message, MessageHandler};
