//! Wire messages exchanged with the external signaling transport.
//!
//! The transport owns delivery and validation; this module only fixes the
//! envelope shapes. Negotiation payloads stay opaque `serde_json::Value`s
//! produced and consumed by the connection layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::connection::ConnectionKind;
use crate::types::{ConnectionId, PeerId, RoomName};

/// Messages delivered by the transport from remote participants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Join { src: PeerId },
    Leave { src: PeerId },
    Offer(OfferMessage),
    Answer(SignalMessage),
    Candidate(SignalMessage),
    Data(DataMessage),
    Log(LogMessage),
}

/// An inbound offer naming the connection the remote side wants to open.
///
/// `connection_kind` is kept as the raw wire string; kinds this core does
/// not recognize are ignored rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferMessage {
    pub src: PeerId,
    pub connection_id: ConnectionId,
    pub connection_kind: String,
    #[serde(default)]
    pub payload: Value,
}

/// Inbound answer or candidate addressed to an already-open connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMessage {
    pub src: PeerId,
    pub connection_id: ConnectionId,
    #[serde(default)]
    pub payload: Value,
}

/// Application payload relayed from a remote peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataMessage {
    pub src: PeerId,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogMessage {
    pub entries: Vec<String>,
}

/// Messages the room emits for the transport to deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Ask the roster for the ids of the other participants; answered out
    /// of band via `make_media_connections` / `make_data_connections`.
    DiscoverPeers { room: RoomName, kind: ConnectionKind },
    Offer { room: RoomName, payload: Value },
    Answer { room: RoomName, payload: Value },
    Candidate { room: RoomName, payload: Value },
    /// Broadcast fanned out to every participant by the transport itself.
    Broadcast { room: RoomName, data: Value },
    /// Broadcast fanned out over each open data connection by its driver.
    DataBroadcast { room: RoomName, data: Value },
    GetLog { room: RoomName },
}
