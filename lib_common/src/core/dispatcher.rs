//! # Fan-out Dispatcher
//!
//! Delivers each accepted event to every connected live consumer (WebSocket
//! sessions). The event is rendered to its wire line once and shared through an
//! `Arc<str>`, so fan-out cost does not grow with line length.
//!
//! Each client owns the receiving half of an unbounded channel; a failed send
//! means the receiver is gone, and that client alone is dropped from the list.
//! Unregistering also cancels the client's token, which the session task selects
//! on, so no delivery happens after removal even if one was already queued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::wire;
use crate::model::ServerEvent;

/// Line as sent to consumers.
pub type WireLine = Arc<str>;

struct ClientHandle {
    id: String,
    sender: mpsc::UnboundedSender<WireLine>,
    cancel: CancellationToken,
}

/// What a registered consumer gets back: its line stream and its removal signal.
pub struct ClientSubscription {
    pub id: String,
    pub lines: mpsc::UnboundedReceiver<WireLine>,
    pub cancelled: CancellationToken,
}

#[derive(Default)]
pub struct Dispatcher {
    clients: Mutex<Vec<ClientHandle>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn clients(&self) -> MutexGuard<'_, Vec<ClientHandle>> {
        self.clients.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// # Register
    ///
    /// Adds a consumer. Registering an id that is already present replaces the
    /// old registration, which is cancelled.
    pub fn register(&self, id: &str) -> ClientSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let mut clients = self.clients();
        clients.retain(|c| {
            if c.id == id {
                c.cancel.cancel();
                false
            } else {
                true
            }
        });
        clients.push(ClientHandle {
            id: id.to_string(),
            sender: tx,
            cancel: cancel.clone(),
        });
        log::info!("Client '{}' registered ({} connected)", id, clients.len());

        ClientSubscription {
            id: id.to_string(),
            lines: rx,
            cancelled: cancel,
        }
    }

    /// Removes a consumer. Effective immediately: its token is cancelled and
    /// it receives nothing further.
    pub fn unregister(&self, id: &str) {
        let mut clients = self.clients();
        clients.retain(|c| {
            if c.id == id {
                c.cancel.cancel();
                false
            } else {
                true
            }
        });
        log::info!("Client '{}' removed ({} connected)", id, clients.len());
    }

    /// # Broadcast
    ///
    /// Serializes `event` once and sends the line to every client. A client whose
    /// send fails is removed; the failure never reaches the caller. Returns the
    /// number of clients the line was handed to.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let line: WireLine = Arc::from(wire::to_wire_line(event));
        self.broadcast_line(line)
    }

    pub fn broadcast_line(&self, line: WireLine) -> usize {
        let mut clients = self.clients();
        clients.retain(|client| match client.sender.send(Arc::clone(&line)) {
            Ok(()) => true,
            Err(_) => {
                log::info!("Client '{}' disconnected. Removing from dispatcher.", client.id);
                client.cancel.cancel();
                false
            }
        });
        clients.len()
    }

    pub fn client_count(&self) -> usize {
        self.clients().len()
    }
}
