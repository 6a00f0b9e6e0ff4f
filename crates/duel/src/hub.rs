//! Outbound fan-out: per-connection mailboxes and room subscriptions.
//!
//! Each connection registers an unbounded sender whose receiving half is
//! drained by that connection's writer task. Delivering a message is a
//! channel push, so the hub never performs network I/O and can be used
//! while the registry lock is held.

use std::collections::{HashMap, HashSet};

use duel_protocol::{PlayerId, RoomCode, ServerMessage};
use tokio::sync::mpsc;

/// Sending half of a connection's outbound queue.
pub(crate) type Outbox = mpsc::UnboundedSender<ServerMessage>;

#[derive(Default)]
pub(crate) struct Hub {
    outboxes: HashMap<PlayerId, Outbox>,
    subscribers: HashMap<RoomCode, HashSet<PlayerId>>,
}

impl Hub {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, player: PlayerId, outbox: Outbox) {
        self.outboxes.insert(player, outbox);
    }

    /// Drops the connection's outbox and every subscription it held.
    ///
    /// Dropping the outbox closes the queue, which ends the writer task
    /// once it has flushed what was already queued.
    pub(crate) fn unregister(&mut self, player: PlayerId) {
        self.outboxes.remove(&player);
        self.subscribers.retain(|_, members| {
            members.remove(&player);
            !members.is_empty()
        });
    }

    pub(crate) fn subscribe(&mut self, code: &RoomCode, player: PlayerId) {
        self.subscribers
            .entry(code.clone())
            .or_default()
            .insert(player);
    }

    /// Forgets a room's subscriber group entirely.
    pub(crate) fn close_room(&mut self, code: &RoomCode) {
        self.subscribers.remove(code);
    }

    /// Queues `msg` for one connection. Unknown or closed connections are
    /// skipped.
    pub(crate) fn send_to(&self, player: PlayerId, msg: ServerMessage) {
        if let Some(outbox) = self.outboxes.get(&player) {
            if outbox.send(msg).is_err() {
                tracing::debug!(%player, "outbox closed, message dropped");
            }
        }
    }

    /// Queues `msg` for every connection subscribed to `code`.
    pub(crate) fn broadcast(&self, code: &RoomCode, msg: &ServerMessage) {
        let Some(members) = self.subscribers.get(code) else {
            return;
        };
        for &player in members {
            self.send_to(player, msg.clone());
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self, code: &RoomCode) -> usize {
        self.subscribers.get(code).map_or(0, HashSet::len)
    }
}
