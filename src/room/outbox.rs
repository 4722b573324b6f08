//! Broadcast channel handle used by the coordinator and engines.
//!
//! Delivery is fire-and-forget: the coordinator never waits on clients, and
//! a send with no connected receivers is not an error.

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::ws::protocol::ServerMsg;

/// Who an envelope is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    One(Uuid),
}

/// A message plus its delivery target
#[derive(Debug, Clone)]
pub struct Envelope {
    pub to: Recipient,
    pub msg: ServerMsg,
}

/// Sending half of a room's broadcast channel
#[derive(Clone)]
pub struct Outbox {
    tx: broadcast::Sender<Envelope>,
}

impl Outbox {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Deliver to every connected client of the room
    pub fn broadcast(&self, msg: ServerMsg) {
        let _ = self.tx.send(Envelope {
            to: Recipient::All,
            msg,
        });
    }

    /// Deliver to a single client
    pub fn send_to(&self, player_id: Uuid, msg: ServerMsg) {
        let _ = self.tx.send(Envelope {
            to: Recipient::One(player_id),
            msg,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Outbox plus a receiver that collects everything sent, for engine tests
    pub fn capturing_outbox() -> (Outbox, broadcast::Receiver<Envelope>) {
        let outbox = Outbox::new(64);
        let rx = outbox.subscribe();
        (outbox, rx)
    }

    /// Drain every envelope currently buffered on the receiver
    pub fn drain(rx: &mut broadcast::Receiver<Envelope>) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(env) = rx.try_recv() {
            out.push(env);
        }
        out
    }
}
