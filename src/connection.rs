//! Capability surface of the external connection layer.
//!
//! The room never sees concrete connection internals (ICE, SDP, channel
//! binding). It drives connections exclusively through the traits below:
//! identity, per-event callbacks, remote answer/candidate input, close.
//! Connections come in two variants with disjoint extra events, so the
//! registry stores a tagged [`Connection`] and the room dispatches on the
//! tag once, when the connection is wired.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::ConnectionConfig;
use crate::types::{ConnectionId, MediaStream, PeerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Media,
    Data,
}

impl ConnectionKind {
    /// Parse the wire form of an offer's kind field. Unrecognized kinds
    /// yield `None`; the room ignores such offers instead of failing.
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "media" => Some(ConnectionKind::Media),
            "data" => Some(ConnectionKind::Data),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionKind::Media => write!(f, "media"),
            ConnectionKind::Data => write!(f, "data"),
        }
    }
}

/// A negotiation event the connection wants relayed to its remote
/// counterpart. The payload already carries whatever the remote layer
/// needs for routing (connection id, kind, destination peer); the room
/// only annotates it with the room name.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationSignal {
    Offer(Value),
    Answer(Value),
    Candidate(Value),
}

pub type SignalCallback = Box<dyn FnMut(NegotiationSignal) + Send>;
pub type StreamCallback = Box<dyn FnMut(MediaStream) + Send>;
pub type DataCallback = Box<dyn FnMut(Value) + Send>;

/// Capabilities common to both connection variants.
pub trait ConnectionControl: Send {
    /// Globally unique id minted by the negotiation layer, never by the
    /// room. Unique across peers and kinds within a room.
    fn id(&self) -> &ConnectionId;

    fn remote_peer(&self) -> &PeerId;

    /// Install the callback fired for every outbound negotiation signal,
    /// including renegotiation after initial establishment.
    fn on_signal(&mut self, callback: SignalCallback);

    /// Feed a remote answer into the negotiation layer. Failures surface
    /// through the connection's own events, not here.
    fn accept_answer(&mut self, payload: Value);

    /// Feed a remotely discovered candidate into the negotiation layer.
    fn accept_candidate(&mut self, payload: Value);

    fn close(&mut self);
}

pub trait MediaConnection: ConnectionControl {
    /// Install the callback fired when the remote stream becomes available.
    fn on_stream(&mut self, callback: StreamCallback);
}

pub trait DataConnection: ConnectionControl {
    /// Install the callback fired for every payload received on the
    /// data channel.
    fn on_data(&mut self, callback: DataCallback);
}

/// A registered connection, tagged by variant. Each variant exposes only
/// the event subscriptions valid for it.
pub enum Connection {
    Media(Box<dyn MediaConnection>),
    Data(Box<dyn DataConnection>),
}

impl Connection {
    pub fn id(&self) -> &ConnectionId {
        match self {
            Connection::Media(c) => c.id(),
            Connection::Data(c) => c.id(),
        }
    }

    pub fn kind(&self) -> ConnectionKind {
        match self {
            Connection::Media(_) => ConnectionKind::Media,
            Connection::Data(_) => ConnectionKind::Data,
        }
    }

    pub fn remote_peer(&self) -> &PeerId {
        match self {
            Connection::Media(c) => c.remote_peer(),
            Connection::Data(c) => c.remote_peer(),
        }
    }

    pub fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id().clone(),
            kind: self.kind(),
            remote_peer: self.remote_peer().clone(),
        }
    }

    pub fn on_signal(&mut self, callback: SignalCallback) {
        match self {
            Connection::Media(c) => c.on_signal(callback),
            Connection::Data(c) => c.on_signal(callback),
        }
    }

    pub fn accept_answer(&mut self, payload: Value) {
        match self {
            Connection::Media(c) => c.accept_answer(payload),
            Connection::Data(c) => c.accept_answer(payload),
        }
    }

    pub fn accept_candidate(&mut self, payload: Value) {
        match self {
            Connection::Media(c) => c.accept_candidate(payload),
            Connection::Data(c) => c.accept_candidate(payload),
        }
    }

    pub fn close(&mut self) {
        match self {
            Connection::Media(c) => c.close(),
            Connection::Data(c) => c.close(),
        }
    }
}

/// Descriptor the room hands to the application in place of the connection
/// itself; the room owns every connection for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub kind: ConnectionKind,
    pub remote_peer: PeerId,
}

/// Offer half of a handshake initiated by the remote side, carrying the
/// connection id the remote negotiation layer minted.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOffer {
    pub connection_id: ConnectionId,
    pub payload: Value,
}

/// Constructs connection variants. `open_*` start a locally initiated
/// handshake; `answer_*` adopt the connection id and offer of a remotely
/// initiated one.
pub trait ConnectionFactory: Send {
    fn open_media(
        &mut self,
        remote: &PeerId,
        config: &ConnectionConfig,
        stream: Option<&MediaStream>,
    ) -> Result<Box<dyn MediaConnection>>;

    fn answer_media(
        &mut self,
        remote: &PeerId,
        config: &ConnectionConfig,
        stream: Option<&MediaStream>,
        offer: RemoteOffer,
    ) -> Result<Box<dyn MediaConnection>>;

    fn open_data(
        &mut self,
        remote: &PeerId,
        config: &ConnectionConfig,
    ) -> Result<Box<dyn DataConnection>>;

    fn answer_data(
        &mut self,
        remote: &PeerId,
        config: &ConnectionConfig,
        offer: RemoteOffer,
    ) -> Result<Box<dyn DataConnection>>;
}
