//! Owned mapping from peer id to that peer's open connections.
//!
//! Insertion order is preserved both per peer and across peers, because
//! teardown closes connections in registration order. The per-peer lists
//! are tiny (bounded by the number of connection kinds), so lookups are
//! linear scans.

use crate::connection::Connection;
use crate::types::{ConnectionId, PeerId};

struct PeerEntry {
    peer: PeerId,
    connections: Vec<Connection>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    entries: Vec<PeerEntry>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connection to the peer's list, creating the entry if this
    /// is the first connection for that peer.
    pub fn add(&mut self, peer: PeerId, connection: Connection) {
        match self.entries.iter_mut().find(|e| e.peer == peer) {
            Some(entry) => entry.connections.push(connection),
            None => self.entries.push(PeerEntry {
                peer,
                connections: vec![connection],
            }),
        }
    }

    /// Look up a connection by peer and connection id. Never fails; an
    /// unknown pair is `None`.
    pub fn get(&self, peer: &PeerId, id: &ConnectionId) -> Option<&Connection> {
        self.entries
            .iter()
            .find(|e| e.peer == *peer)?
            .connections
            .iter()
            .find(|c| c.id() == id)
    }

    pub fn get_mut(&mut self, peer: &PeerId, id: &ConnectionId) -> Option<&mut Connection> {
        self.entries
            .iter_mut()
            .find(|e| e.peer == *peer)?
            .connections
            .iter_mut()
            .find(|c| c.id() == id)
    }

    pub fn contains(&self, peer: &PeerId, id: &ConnectionId) -> bool {
        self.get(peer, id).is_some()
    }

    /// Forget every connection registered for `peer`, removing the entry
    /// entirely. The connections are dropped, not closed.
    pub fn remove(&mut self, peer: &PeerId) {
        self.entries.retain(|e| e.peer != *peer);
    }

    /// Flattened, order-preserving view across all peers.
    pub fn all_connections(&self) -> impl Iterator<Item = &Connection> {
        self.entries.iter().flat_map(|e| e.connections.iter())
    }

    /// Take every registered connection out, in registration order,
    /// leaving the registry empty. Used by room teardown.
    pub fn drain(&mut self) -> Vec<Connection> {
        self.entries
            .drain(..)
            .flat_map(|e| e.connections)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn connection_count(&self) -> usize {
        self.entries.iter().map(|e| e.connections.len()).sum()
    }
}
