//! Seams between the engine and whatever carries its messages.
//!
//! Outbound traffic goes through [`InputSink`] and [`StateSink`], which must
//! never block the tick. Inbound traffic lands in an [`Inbox`] from any thread
//! and is drained once per tick by its owner.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use payload::{EntityId, InputPayload, StatePayload};
use tracing::warn;
use wire::{Limits, WireMessage, MAX_MESSAGE_SIZE};

use crate::error::PacketError;

/// Client-side outbound channel.
pub trait InputSink {
    /// Sends an input to the server. Fire-and-forget.
    fn send_input(&mut self, entity: EntityId, input: &InputPayload);

    /// Relays an input to peers for remote display.
    fn broadcast_input(&mut self, _entity: EntityId, _input: &InputPayload) {}
}

/// Server-side outbound channel.
pub trait StateSink {
    /// Sends an authoritative state to the owning client. Fire-and-forget.
    fn send_state(&mut self, entity: EntityId, state: &StatePayload);
}

impl<T: InputSink + ?Sized> InputSink for &mut T {
    fn send_input(&mut self, entity: EntityId, input: &InputPayload) {
        (**self).send_input(entity, input);
    }

    fn broadcast_input(&mut self, entity: EntityId, input: &InputPayload) {
        (**self).broadcast_input(entity, input);
    }
}

impl<T: StateSink + ?Sized> StateSink for &mut T {
    fn send_state(&mut self, entity: EntityId, state: &StatePayload) {
        (**self).send_state(entity, state);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl InputSink for NullSink {
    fn send_input(&mut self, _entity: EntityId, _input: &InputPayload) {}
}

impl StateSink for NullSink {
    fn send_state(&mut self, _entity: EntityId, _state: &StatePayload) {}
}

/// Unbounded multi-producer queue drained by a single owner.
#[derive(Debug)]
pub struct Inbox<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Inbox<T> {
    /// Empty unbounded inbox.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Returns a handle producers on any thread can push through.
    #[must_use]
    pub fn sender(&self) -> InboxSender<T> {
        InboxSender {
            tx: self.tx.clone(),
        }
    }

    /// Takes everything that has arrived so far, in arrival order.
    ///
    /// Items pushed while draining wait for the next call.
    pub fn drain(&self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.rx.len());
        for _ in 0..self.rx.len() {
            match self.rx.try_recv() {
                Ok(item) => items.push(item),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        items
    }

    /// Drops everything pending.
    pub fn clear(&self) {
        while self.rx.try_recv().is_ok() {}
    }

    /// Messages waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Default for Inbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable producer handle for an [`Inbox`].
#[derive(Debug)]
pub struct InboxSender<T> {
    tx: Sender<T>,
}

impl<T> Clone for InboxSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> InboxSender<T> {
    /// Queues `item`. Never blocks.
    ///
    /// Returns `false` if the inbox has been dropped.
    pub fn push(&self, item: T) -> bool {
        self.tx.send(item).is_ok()
    }
}

/// Feeds a local server's inbox directly, for single-entity channels.
impl InputSink for InboxSender<InputPayload> {
    fn send_input(&mut self, _entity: EntityId, input: &InputPayload) {
        self.push(*input);
    }
}

/// Feeds a local client's inbox directly, for single-entity channels.
impl StateSink for InboxSender<StatePayload> {
    fn send_state(&mut self, _entity: EntityId, state: &StatePayload) {
        self.push(*state);
    }
}

/// Encodes outbound payloads and hands the bytes to a channel.
///
/// Encoding failures are logged and the message dropped; the tick never
/// stops for the network.
#[derive(Debug, Clone)]
pub struct EncodedSink {
    outbound: Sender<Vec<u8>>,
    peers: Option<Sender<Vec<u8>>>,
}

impl EncodedSink {
    /// Sink that pushes encoded packets onto `outbound`.
    #[must_use]
    pub const fn new(outbound: Sender<Vec<u8>>) -> Self {
        Self {
            outbound,
            peers: None,
        }
    }

    /// Also relays inputs to `peers` for remote display.
    #[must_use]
    pub fn with_peer_broadcast(mut self, peers: Sender<Vec<u8>>) -> Self {
        self.peers = Some(peers);
        self
    }

    fn encode(message: &WireMessage) -> Option<Vec<u8>> {
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        match wire::encode_message(message, &mut buf) {
            Ok(len) => Some(buf[..len].to_vec()),
            Err(err) => {
                warn!(
                    entity = message.entity().raw(),
                    tick = message.tick().raw(),
                    %err,
                    "dropping unencodable message"
                );
                None
            }
        }
    }
}

impl InputSink for EncodedSink {
    fn send_input(&mut self, entity: EntityId, input: &InputPayload) {
        if let Some(bytes) = Self::encode(&WireMessage::Input {
            entity,
            input: *input,
        }) {
            let _ = self.outbound.send(bytes);
        }
    }

    fn broadcast_input(&mut self, entity: EntityId, input: &InputPayload) {
        let Some(peers) = &self.peers else {
            return;
        };
        if let Some(bytes) = Self::encode(&WireMessage::Input {
            entity,
            input: *input,
        }) {
            let _ = peers.send(bytes);
        }
    }
}

impl StateSink for EncodedSink {
    fn send_state(&mut self, entity: EntityId, state: &StatePayload) {
        if let Some(bytes) = Self::encode(&WireMessage::State {
            entity,
            state: *state,
        }) {
            let _ = self.outbound.send(bytes);
        }
    }
}

/// Decodes bytes that must be an input message.
pub fn decode_input_packet(
    bytes: &[u8],
    limits: &Limits,
) -> Result<(EntityId, InputPayload), PacketError> {
    match wire::decode_message(bytes, limits)? {
        WireMessage::Input { entity, input } => Ok((entity, input)),
        other => Err(PacketError::UnexpectedKind {
            expected: wire::MessageKind::Input,
            found: other.kind(),
        }),
    }
}

/// Decodes bytes that must be a state message.
pub fn decode_state_packet(
    bytes: &[u8],
    limits: &Limits,
) -> Result<(EntityId, StatePayload), PacketError> {
    match wire::decode_message(bytes, limits)? {
        WireMessage::State { entity, state } => Ok((entity, state)),
        other => Err(PacketError::UnexpectedKind {
            expected: wire::MessageKind::State,
            found: other.kind(),
        }),
    }
}

/// Decodes a state message and checks it belongs to `expected`.
pub fn decode_state_for(
    bytes: &[u8],
    limits: &Limits,
    expected: EntityId,
) -> Result<StatePayload, PacketError> {
    let (found, state) = decode_state_packet(bytes, limits)?;
    if found != expected {
        return Err(PacketError::UnexpectedEntity { expected, found });
    }
    Ok(state)
}
