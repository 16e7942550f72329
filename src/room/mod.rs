//! Room orchestration core.
//!
//! A [`Room`] binds a local participant into a named full-mesh room: it
//! decides which peers to connect to, owns every connection it creates,
//! deduplicates inbound offers, and translates between room-level intents
//! and connection-level signaling. Intents and inbound handlers run to
//! completion synchronously; everything network-bound lives in the
//! connection layer and the external transport, which feed results back
//! as events.

mod registry;

pub use registry::ConnectionRegistry;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::ConnectionConfig;
use crate::connection::{
    Connection, ConnectionFactory, ConnectionInfo, ConnectionKind, NegotiationSignal, RemoteOffer,
};
use crate::error::{Error, Result};
use crate::signaling::{DataMessage, InboundMessage, OfferMessage, OutboundMessage, SignalMessage};
use crate::types::{MediaStream, PeerId, RoomName};

/// Events the room publishes to the hosting application.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    PeerJoined { peer: PeerId },
    PeerLeft { peer: PeerId },
    /// A remote peer opened a media connection to us.
    IncomingCall(ConnectionInfo),
    /// A remote peer opened a data connection to us.
    IncomingConnection(ConnectionInfo),
    /// Remote stream, tagged with the peer it originates from.
    Stream { src: PeerId, stream: MediaStream },
    Data(DataMessage),
    Log(Vec<String>),
    Closed,
}

/// Receiver halves handed to the host on [`Room::open`]: `signaling` feeds
/// the external transport, `events` feeds the application.
pub struct RoomChannels {
    pub signaling: mpsc::UnboundedReceiver<OutboundMessage>,
    pub events: mpsc::UnboundedReceiver<RoomEvent>,
}

pub struct Room {
    name: RoomName,
    local_peer: PeerId,
    stream: Option<MediaStream>,
    config: ConnectionConfig,
    factory: Box<dyn ConnectionFactory>,
    registry: ConnectionRegistry,
    signaling_tx: mpsc::UnboundedSender<OutboundMessage>,
    events_tx: mpsc::UnboundedSender<RoomEvent>,
    closed: bool,
}

impl Room {
    /// Join `name` as `local_peer`. The config snapshot is reused for every
    /// connection the room opens for its whole lifetime.
    pub fn open(
        name: impl Into<RoomName>,
        local_peer: impl Into<PeerId>,
        config: ConnectionConfig,
        factory: Box<dyn ConnectionFactory>,
    ) -> (Self, RoomChannels) {
        let (signaling_tx, signaling_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let room = Self {
            name: name.into(),
            local_peer: local_peer.into(),
            stream: None,
            config,
            factory,
            registry: ConnectionRegistry::new(),
            signaling_tx,
            events_tx,
            closed: false,
        };
        let channels = RoomChannels {
            signaling: signaling_rx,
            events: events_rx,
        };
        (room, channels)
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn local_peer(&self) -> &PeerId {
        &self.local_peer
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// Start (or renegotiate) a media call: replace the outbound stream if
    /// one is given and ask the roster for peers to call. Connections are
    /// created later, when discovery answers via
    /// [`Room::make_media_connections`].
    pub fn call(&mut self, stream: Option<MediaStream>) -> Result<()> {
        self.ensure_open()?;
        if let Some(stream) = stream {
            self.stream = Some(stream);
        }
        self.emit_signal(OutboundMessage::DiscoverPeers {
            room: self.name.clone(),
            kind: ConnectionKind::Media,
        })
    }

    /// Data-channel counterpart of [`Room::call`].
    pub fn connect(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.emit_signal(OutboundMessage::DiscoverPeers {
            room: self.name.clone(),
            kind: ConnectionKind::Data,
        })
    }

    /// Open one media connection per discovered peer, skipping ourselves.
    /// Each connection is wired and registered before the next one is
    /// created; a factory failure leaves earlier connections registered.
    pub fn make_media_connections(&mut self, peers: &[PeerId]) -> Result<()> {
        self.ensure_open()?;
        for peer in peers {
            if *peer == self.local_peer {
                debug!(peer = %peer, "not connecting to ourselves");
                continue;
            }
            let connection = self
                .factory
                .open_media(peer, &self.config, self.stream.as_ref())?;
            self.install(Connection::Media(connection));
        }
        Ok(())
    }

    /// Open one data connection per discovered peer, skipping ourselves.
    pub fn make_data_connections(&mut self, peers: &[PeerId]) -> Result<()> {
        self.ensure_open()?;
        for peer in peers {
            if *peer == self.local_peer {
                debug!(peer = %peer, "not connecting to ourselves");
                continue;
            }
            let connection = self.factory.open_data(peer, &self.config)?;
            self.install(Connection::Data(connection));
        }
        Ok(())
    }

    /// Broadcast to every participant through the transport. Fan-out is the
    /// transport's job; no connection is touched here.
    pub fn send_by_transport(&mut self, data: Value) -> Result<()> {
        self.ensure_open()?;
        self.emit_signal(OutboundMessage::Broadcast {
            room: self.name.clone(),
            data,
        })
    }

    /// Broadcast over the open data channels. Fan-out is the data
    /// connections' driver's job; no connection is touched here.
    pub fn send_by_data_channel(&mut self, data: Value) -> Result<()> {
        self.ensure_open()?;
        self.emit_signal(OutboundMessage::DataBroadcast {
            room: self.name.clone(),
            data,
        })
    }

    /// Ask remote participants for their logs.
    pub fn get_log(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.emit_signal(OutboundMessage::GetLog {
            room: self.name.clone(),
        })
    }

    /// Close every registered connection exactly once, in registration
    /// order, and emit a single [`RoomEvent::Closed`]. Any intent after
    /// this returns [`Error::RoomClosed`].
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        for mut connection in self.registry.drain() {
            connection.close();
        }
        self.emit_event(RoomEvent::Closed);
        Ok(())
    }

    /// Dispatch a deserialized transport message to the matching handler.
    pub fn handle_message(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Join { src } => self.handle_join(src),
            InboundMessage::Leave { src } => self.handle_leave(src),
            InboundMessage::Offer(message) => self.handle_offer(message),
            InboundMessage::Answer(message) => self.handle_answer(message),
            InboundMessage::Candidate(message) => self.handle_candidate(message),
            InboundMessage::Data(message) => self.handle_data(message),
            InboundMessage::Log(message) => self.handle_log(message.entries),
        }
    }

    /// A peer joined the room. Connection creation is not implied; it is
    /// driven separately through peer discovery.
    pub fn handle_join(&mut self, src: PeerId) {
        if self.ignore_when_closed("join") {
            return;
        }
        self.emit_event(RoomEvent::PeerJoined { peer: src });
    }

    /// A peer left: forget its whole registry entry (the connections are
    /// dropped, not closed) and tell the application.
    pub fn handle_leave(&mut self, src: PeerId) {
        if self.ignore_when_closed("leave") {
            return;
        }
        self.registry.remove(&src);
        self.emit_event(RoomEvent::PeerLeft { peer: src });
    }

    /// A remote peer wants to open a connection to us. Retransmitted
    /// offers, and offers racing a locally initiated connection with the
    /// same id, are no-ops; unrecognized kinds are ignored.
    pub fn handle_offer(&mut self, message: OfferMessage) {
        if self.ignore_when_closed("offer") {
            return;
        }
        if self.registry.contains(&message.src, &message.connection_id) {
            debug!(
                src = %message.src,
                connection = %message.connection_id,
                "ignoring offer for already-registered connection",
            );
            return;
        }
        let Some(kind) = ConnectionKind::from_wire(&message.connection_kind) else {
            debug!(
                kind = %message.connection_kind,
                "ignoring offer with unrecognized connection kind",
            );
            return;
        };
        let offer = RemoteOffer {
            connection_id: message.connection_id,
            payload: message.payload,
        };
        let built = match kind {
            ConnectionKind::Media => self
                .factory
                .answer_media(&message.src, &self.config, self.stream.as_ref(), offer)
                .map(Connection::Media),
            ConnectionKind::Data => self
                .factory
                .answer_data(&message.src, &self.config, offer)
                .map(Connection::Data),
        };
        match built {
            Ok(connection) => {
                let info = self.install(connection);
                let event = match kind {
                    ConnectionKind::Media => RoomEvent::IncomingCall(info),
                    ConnectionKind::Data => RoomEvent::IncomingConnection(info),
                };
                self.emit_event(event);
            }
            Err(error) => {
                warn!(src = %message.src, error = %error, "factory failed to answer inbound offer");
            }
        }
    }

    /// Forward a remote answer to the connection it addresses. Unknown
    /// connection ids are dropped; signaling relay is best effort.
    pub fn handle_answer(&mut self, message: SignalMessage) {
        if self.ignore_when_closed("answer") {
            return;
        }
        match self.registry.get_mut(&message.src, &message.connection_id) {
            Some(connection) => connection.accept_answer(message.payload),
            None => debug!(
                src = %message.src,
                connection = %message.connection_id,
                "dropping answer for unknown connection",
            ),
        }
    }

    /// Forward a remote candidate; same drop policy as answers.
    pub fn handle_candidate(&mut self, message: SignalMessage) {
        if self.ignore_when_closed("candidate") {
            return;
        }
        match self.registry.get_mut(&message.src, &message.connection_id) {
            Some(connection) => connection.accept_candidate(message.payload),
            None => debug!(
                src = %message.src,
                connection = %message.connection_id,
                "dropping candidate for unknown connection",
            ),
        }
    }

    /// Republish a relayed payload verbatim on the room event surface.
    pub fn handle_data(&mut self, message: DataMessage) {
        if self.ignore_when_closed("data") {
            return;
        }
        self.emit_event(RoomEvent::Data(message));
    }

    /// Republish remote log entries on the room event surface.
    pub fn handle_log(&mut self, entries: Vec<String>) {
        if self.ignore_when_closed("log") {
            return;
        }
        self.emit_event(RoomEvent::Log(entries));
    }

    /// Wire then register. Registration completes before control returns
    /// to the caller, so no remote reply can outrace it: anything that
    /// could provoke one is only dispatched by a later handler invocation.
    fn install(&mut self, mut connection: Connection) -> ConnectionInfo {
        self.wire(&mut connection);
        let info = connection.info();
        self.registry.add(info.remote_peer.clone(), connection);
        info
    }

    /// Subscribe to the connection's events, dispatching on the variant
    /// tag once. Negotiation signals are re-emitted for the transport with
    /// the room name attached (this covers renegotiation, not just first
    /// setup); media streams are tagged with the originating peer; data
    /// payloads take the same passthrough as [`Room::handle_data`].
    fn wire(&mut self, connection: &mut Connection) {
        let room = self.name.clone();
        let signaling = self.signaling_tx.clone();
        connection.on_signal(Box::new(move |signal| {
            let message = match signal {
                NegotiationSignal::Offer(payload) => OutboundMessage::Offer {
                    room: room.clone(),
                    payload,
                },
                NegotiationSignal::Answer(payload) => OutboundMessage::Answer {
                    room: room.clone(),
                    payload,
                },
                NegotiationSignal::Candidate(payload) => OutboundMessage::Candidate {
                    room: room.clone(),
                    payload,
                },
            };
            let _ = signaling.send(message);
        }));

        match connection {
            Connection::Media(media) => {
                let src = media.remote_peer().clone();
                let events = self.events_tx.clone();
                media.on_stream(Box::new(move |stream| {
                    let _ = events.send(RoomEvent::Stream {
                        src: src.clone(),
                        stream,
                    });
                }));
            }
            Connection::Data(data) => {
                let src = data.remote_peer().clone();
                let events = self.events_tx.clone();
                data.on_data(Box::new(move |payload| {
                    let _ = events.send(RoomEvent::Data(DataMessage {
                        src: src.clone(),
                        payload,
                    }));
                }));
            }
        }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::RoomClosed);
        }
        Ok(())
    }

    fn ignore_when_closed(&self, what: &str) -> bool {
        if self.closed {
            debug!(message = what, "ignoring message on closed room");
        }
        self.closed
    }

    fn emit_signal(&self, message: OutboundMessage) -> Result<()> {
        self.signaling_tx
            .send(message)
            .map_err(|_| Error::ChannelClosed("signaling"))
    }

    fn emit_event(&self, event: RoomEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("room event receiver dropped");
        }
    }
}
