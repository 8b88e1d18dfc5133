//! Message envelope for outbound frames.
//!
//! A [`Message`] is built fresh for every call on a channel, encoded once by a
//! [`ProtocolCodec`](crate::ProtocolCodec), then dropped.
//!
//! # Correlation
//!
//! ```text
//! Emit         ──► no ack id      (fire-and-forget)
//! AckRequest   ──► ack id = N     (expects an AckResponse carrying N)
//! AckResponse  ──► ack id = N     (answers an inbound AckRequest N)
//! ```

use std::fmt;

/// Correlation identifier linking an ack request to its response.
pub type AckId = u64;

/// Kind of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Fire-and-forget event.
    Emit,
    /// Event that expects a correlated response.
    AckRequest,
    /// Response to an inbound ack request.
    AckResponse,
}

impl MessageKind {
    /// Whether messages of this kind must carry an [`AckId`].
    pub fn requires_ack_id(self) -> bool {
        matches!(self, MessageKind::AckRequest | MessageKind::AckResponse)
    }

    /// Whether messages of this kind carry a method selector on the wire.
    pub fn carries_method(self) -> bool {
        !matches!(self, MessageKind::AckResponse)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Emit => write!(f, "emit"),
            MessageKind::AckRequest => write!(f, "ack-request"),
            MessageKind::AckResponse => write!(f, "ack-response"),
        }
    }
}

/// Protocol-level message envelope.
///
/// `args` holds the already-serialized JSON text of the caller's argument,
/// or `None` when the call carries no argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// What kind of frame this is.
    pub kind: MessageKind,

    /// Correlation id, present iff `kind.requires_ack_id()`.
    pub ack_id: Option<AckId>,

    /// Selector for the remote handler. Empty for ack responses.
    pub method: String,

    /// Serialized argument payload.
    pub args: Option<String>,
}

impl Message {
    /// Build a fire-and-forget message.
    pub fn emit(method: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Emit,
            ack_id: None,
            method: method.into(),
            args: None,
        }
    }

    /// Build a request that expects a response correlated by `ack_id`.
    pub fn ack_request(ack_id: AckId, method: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::AckRequest,
            ack_id: Some(ack_id),
            method: method.into(),
            args: None,
        }
    }

    /// Build the response to an inbound request `ack_id`.
    pub fn ack_response(ack_id: AckId) -> Self {
        Self {
            kind: MessageKind::AckResponse,
            ack_id: Some(ack_id),
            method: String::new(),
            args: None,
        }
    }

    /// Attach serialized arguments.
    pub fn with_args(mut self, args: Option<String>) -> Self {
        self.args = args;
        self
    }
}
