//! Actor implementation for notification-based communication
//!
//! An [`Actor`] owns a dedicated thread running a tokio runtime. All messages
//! sent to its mailbox are handled sequentially on that thread, so a handler
//! never observes two transitions running concurrently. Background work
//! spawned by a handler reports back by posting into the same mailbox
//! through [`ActorController::mailbox`].

use crate::core::message::{Message, MessageHandler};
use std::marker::PhantomData;
use std::thread::JoinHandle;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// A lightweight actor that handles notification messages on its own thread.
pub struct Actor<T: Send + 'static, O: Send + 'static> {
    /// Sender feeding this actor's mailbox
    mailbox: mpsc::UnboundedSender<Message<T>>,
    /// Channel for sending shutdown signal
    shutdown_sender: Option<oneshot::Sender<()>>,
    /// Handle to the message processing thread
    thread_handle: Option<JoinHandle<()>>,
    _phantom: PhantomData<O>,
}

impl<T: Send + 'static, O: Send + 'static> Actor<T, O> {
    /// Start an actor for `handler`. Outbound notifications go to `sender`.
    ///
    /// The runtime is built before the thread is spawned so that a failure is
    /// reported to the caller instead of being lost on the worker thread.
    pub fn new<H>(handler: H, sender: mpsc::UnboundedSender<Message<O>>) -> Result<Self, ActorError>
    where
        H: MessageHandler<T, O> + 'static,
    {
        let (mailbox, receiver) = mpsc::unbounded_channel();
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ActorError::Runtime)?;

        let controller = ActorController::new(sender, mailbox.clone());

        let thread_handle = std::thread::Builder::new()
            .name("incsearch-actor".to_string())
            .spawn(move || {
                runtime.block_on(Self::run_message_loop(
                    receiver,
                    controller,
                    handler,
                    shutdown_receiver,
                ));
            })
            .map_err(ActorError::Spawn)?;

        Ok(Self {
            mailbox,
            shutdown_sender: Some(shutdown_sender),
            thread_handle: Some(thread_handle),
            _phantom: PhantomData,
        })
    }

    /// Send a message into this actor's mailbox.
    pub fn send(&self, message: Message<T>) -> Result<(), ActorSendError> {
        self.mailbox
            .send(message)
            .map_err(|_| ActorSendError::ChannelClosed)
    }

    /// Main message processing loop.
    async fn run_message_loop<H>(
        mut receiver: mpsc::UnboundedReceiver<Message<T>>,
        controller: ActorController<T, O>,
        mut handler: H,
        mut shutdown_receiver: oneshot::Receiver<()>,
    ) where
        H: MessageHandler<T, O>,
    {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown_receiver => {
                    log::debug!("Received shutdown signal, stopping message loop");
                    break;
                }
                message = receiver.recv() => {
                    match message {
                        Some(message) => {
                            log::trace!("Received message: method={}", message.method);
                            handler.on_message(message, &controller).await;
                        }
                        None => {
                            log::debug!("Receiver channel closed");
                            break;
                        }
                    }
                }
            }
        }

        handler.on_shutdown(&controller).await;
    }

    /// Manually shutdown the actor.
    /// This will be called automatically on Drop if not called explicitly.
    pub fn shutdown(&mut self) {
        if let Some(shutdown_sender) = self.shutdown_sender.take() {
            log::debug!("Sending shutdown signal");
            let _ = shutdown_sender.send(());
        }

        if let Some(thread_handle) = self.thread_handle.take() {
            log::debug!("Waiting for message loop thread to finish");
            if thread_handle.join().is_err() {
                log::error!("Actor thread panicked");
            }
            log::info!("Actor shutdown completed");
        }
    }
}

impl<T: Send + 'static, O: Send + 'static> Drop for Actor<T, O> {
    fn drop(&mut self) {
        if self.shutdown_sender.is_some() || self.thread_handle.is_some() {
            log::debug!("Actor dropped without explicit shutdown, performing cleanup");
            self.shutdown();
        }
    }
}

/// Error type for Actor startup.
#[derive(Debug, Error)]
pub enum ActorError {
    #[error("failed to build actor runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to spawn actor thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Error type for Actor message sending operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActorSendError {
    #[error("Actor channel is closed")]
    ChannelClosed,
}

/// Handle given to a [`MessageHandler`] for talking to the outside world and
/// to its own mailbox.
pub struct ActorController<T, O> {
    sender: mpsc::UnboundedSender<Message<O>>,
    mailbox: mpsc::UnboundedSender<Message<T>>,
}

impl<T: Send + 'static, O: Send + 'static> ActorController<T, O> {
    pub fn new(
        sender: mpsc::UnboundedSender<Message<O>>,
        mailbox: mpsc::UnboundedSender<Message<T>>,
    ) -> Self {
        Self { sender, mailbox }
    }

    /// Send a message to external recipients.
    pub fn send_message(
        &self,
        method: impl Into<String>,
        payload: O,
    ) -> Result<(), ActorSendError> {
        self.sender
            .send(Message::new(method, payload))
            .map_err(|_| ActorSendError::ChannelClosed)
    }

    /// Clone of the mailbox sender, for tasks that outlive the current call.
    pub fn mailbox(&self) -> mpsc::UnboundedSender<Message<T>> {
        self.mailbox.clone()
    }
}

impl<T, O> Clone for ActorController<T, O> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            mailbox: self.mailbox.clone(),
        }
    }
}
