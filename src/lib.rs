//! Room orchestration core for a peer-to-peer communication SDK.
//!
//! A [`Room`] maintains a full-mesh set of media/data connections to every
//! other participant of a named room. Connection negotiation, the signaling
//! transport and peer discovery are external collaborators: the room drives
//! connections through the capability traits in [`connection`], emits
//! [`OutboundMessage`]s for a transport to deliver, and republishes
//! connection-level events as [`RoomEvent`]s for the application.
//!
//! ```no_run
//! use mesh_room::{ConnectionConfig, ConnectionFactory, PeerId, Room};
//!
//! fn join(factory: Box<dyn ConnectionFactory>) -> mesh_room::Result<()> {
//!     let (mut room, mut channels) =
//!         Room::open("lobby", "alice", ConnectionConfig::default(), factory);
//!     room.call(None)?;
//!     // Deliver `channels.signaling` to the transport, and feed transport
//!     // messages back through `room.handle_message`. When discovery
//!     // answers:
//!     room.make_media_connections(&[PeerId::from("bob")])?;
//!     // `channels.events` now carries the room-level event stream.
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod room;
pub mod signaling;
pub mod types;

pub use config::{ConnectionConfig, IceServer};
pub use connection::{
    Connection, ConnectionControl, ConnectionFactory, ConnectionInfo, ConnectionKind,
    DataCallback, DataConnection, MediaConnection, NegotiationSignal, RemoteOffer,
    SignalCallback, StreamCallback,
};
pub use error::{Error, Result};
pub use room::{ConnectionRegistry, Room, RoomChannels, RoomEvent};
pub use signaling::{DataMessage, InboundMessage, OfferMessage, OutboundMessage, SignalMessage};
pub use types::{ConnectionId, MediaStream, PeerId, RoomName};
