//! Scripted connection layer for driving a [`Room`] in tests.
//!
//! The factory records every construction request and hands back
//! connections whose callbacks and inputs are visible through shared
//! handles, so tests can fire negotiation/stream/data events and count
//! closes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::Value;

use mesh_room::{
    ConnectionConfig, ConnectionControl, ConnectionFactory, ConnectionId, ConnectionKind,
    DataCallback, DataConnection, MediaConnection, MediaStream, NegotiationSignal, PeerId,
    RemoteOffer, SignalCallback, StreamCallback,
};

#[derive(Default)]
struct ConnState {
    closed: u32,
    answers: Vec<Value>,
    candidates: Vec<Value>,
    signal_cb: Option<SignalCallback>,
    stream_cb: Option<StreamCallback>,
    data_cb: Option<DataCallback>,
}

/// Test-side handle to one fake connection.
#[derive(Clone)]
pub struct ConnHandle {
    pub id: ConnectionId,
    pub peer: PeerId,
    state: Arc<Mutex<ConnState>>,
}

impl ConnHandle {
    pub fn closed_count(&self) -> u32 {
        self.state.lock().unwrap().closed
    }

    pub fn answers(&self) -> Vec<Value> {
        self.state.lock().unwrap().answers.clone()
    }

    pub fn candidates(&self) -> Vec<Value> {
        self.state.lock().unwrap().candidates.clone()
    }

    pub fn fire_signal(&self, signal: NegotiationSignal) {
        let mut state = self.state.lock().unwrap();
        let cb = state.signal_cb.as_mut().expect("signal callback not wired");
        cb(signal);
    }

    pub fn fire_stream(&self, stream: MediaStream) {
        let mut state = self.state.lock().unwrap();
        let cb = state.stream_cb.as_mut().expect("stream callback not wired");
        cb(stream);
    }

    pub fn fire_data(&self, payload: Value) {
        let mut state = self.state.lock().unwrap();
        let cb = state.data_cb.as_mut().expect("data callback not wired");
        cb(payload);
    }
}

/// One factory invocation, as the room made it.
#[derive(Clone)]
pub struct OpenRecord {
    pub peer: PeerId,
    pub kind: ConnectionKind,
    /// True for the answer path (remotely initiated), false for open.
    pub answered: bool,
    /// Id of the local stream snapshot handed to a media connection.
    pub stream: Option<String>,
    pub offer_payload: Option<Value>,
    pub connection_id: ConnectionId,
}

#[derive(Default)]
struct FactoryState {
    records: Vec<OpenRecord>,
    connections: Vec<ConnHandle>,
    closed_order: Vec<ConnectionId>,
    fail_next: bool,
}

/// Shared view into the fake factory.
#[derive(Clone, Default)]
pub struct FactoryLog(Arc<Mutex<FactoryState>>);

impl FactoryLog {
    pub fn records(&self) -> Vec<OpenRecord> {
        self.0.lock().unwrap().records.clone()
    }

    pub fn connections(&self) -> Vec<ConnHandle> {
        self.0.lock().unwrap().connections.clone()
    }

    pub fn connection(&self, index: usize) -> ConnHandle {
        self.0.lock().unwrap().connections[index].clone()
    }

    pub fn created(&self) -> usize {
        self.0.lock().unwrap().connections.len()
    }

    pub fn fail_next(&self) {
        self.0.lock().unwrap().fail_next = true;
    }

    /// Connection ids in the order their close operation ran.
    pub fn closed_order(&self) -> Vec<ConnectionId> {
        self.0.lock().unwrap().closed_order.clone()
    }
}

struct FakeConnection {
    id: ConnectionId,
    peer: PeerId,
    state: Arc<Mutex<ConnState>>,
    log: FactoryLog,
}

impl ConnectionControl for FakeConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    fn remote_peer(&self) -> &PeerId {
        &self.peer
    }

    fn on_signal(&mut self, callback: SignalCallback) {
        self.state.lock().unwrap().signal_cb = Some(callback);
    }

    fn accept_answer(&mut self, payload: Value) {
        self.state.lock().unwrap().answers.push(payload);
    }

    fn accept_candidate(&mut self, payload: Value) {
        self.state.lock().unwrap().candidates.push(payload);
    }

    fn close(&mut self) {
        self.state.lock().unwrap().closed += 1;
        self.log.0.lock().unwrap().closed_order.push(self.id.clone());
    }
}

impl MediaConnection for FakeConnection {
    fn on_stream(&mut self, callback: StreamCallback) {
        self.state.lock().unwrap().stream_cb = Some(callback);
    }
}

impl DataConnection for FakeConnection {
    fn on_data(&mut self, callback: DataCallback) {
        self.state.lock().unwrap().data_cb = Some(callback);
    }
}

struct FakeFactory {
    log: FactoryLog,
}

impl FakeFactory {
    fn build(
        &mut self,
        peer: &PeerId,
        kind: ConnectionKind,
        stream: Option<&MediaStream>,
        offer: Option<RemoteOffer>,
    ) -> anyhow::Result<FakeConnection> {
        let mut state = self.log.0.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            anyhow::bail!("injected factory failure");
        }
        let id = match &offer {
            Some(offer) => offer.connection_id.clone(),
            None => ConnectionId::from(format!("{}-{:08x}", kind, rand::random::<u32>())),
        };
        let conn_state = Arc::new(Mutex::new(ConnState::default()));
        state.records.push(OpenRecord {
            peer: peer.clone(),
            kind,
            answered: offer.is_some(),
            stream: stream.map(|s| s.id().to_string()),
            offer_payload: offer.map(|o| o.payload),
            connection_id: id.clone(),
        });
        state.connections.push(ConnHandle {
            id: id.clone(),
            peer: peer.clone(),
            state: conn_state.clone(),
        });
        drop(state);
        Ok(FakeConnection {
            id,
            peer: peer.clone(),
            state: conn_state,
            log: self.log.clone(),
        })
    }
}

impl ConnectionFactory for FakeFactory {
    fn open_media(
        &mut self,
        remote: &PeerId,
        _config: &ConnectionConfig,
        stream: Option<&MediaStream>,
    ) -> anyhow::Result<Box<dyn MediaConnection>> {
        let conn = self.build(remote, ConnectionKind::Media, stream, None)?;
        Ok(Box::new(conn))
    }

    fn answer_media(
        &mut self,
        remote: &PeerId,
        _config: &ConnectionConfig,
        stream: Option<&MediaStream>,
        offer: RemoteOffer,
    ) -> anyhow::Result<Box<dyn MediaConnection>> {
        let conn = self.build(remote, ConnectionKind::Media, stream, Some(offer))?;
        Ok(Box::new(conn))
    }

    fn open_data(
        &mut self,
        remote: &PeerId,
        _config: &ConnectionConfig,
    ) -> anyhow::Result<Box<dyn DataConnection>> {
        let conn = self.build(remote, ConnectionKind::Data, None, None)?;
        Ok(Box::new(conn))
    }

    fn answer_data(
        &mut self,
        remote: &PeerId,
        _config: &ConnectionConfig,
        offer: RemoteOffer,
    ) -> anyhow::Result<Box<dyn DataConnection>> {
        let conn = self.build(remote, ConnectionKind::Data, None, Some(offer))?;
        Ok(Box::new(conn))
    }
}

/// A factory box for `Room::open` plus the log to observe it through.
pub fn fake_factory() -> (Box<dyn ConnectionFactory>, FactoryLog) {
    let log = FactoryLog::default();
    let factory = FakeFactory { log: log.clone() };
    (Box::new(factory), log)
}
