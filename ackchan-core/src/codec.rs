//! Pluggable wire framing for ackchan.
//!
//! The [`ProtocolCodec`] trait turns a [`Message`] envelope into the bytes the
//! transport writer puts on the wire. Bit-exact framing is the codec's
//! contract; the channel only hands it a well-formed envelope and queues the
//! result. [`SocketIoCodec`] is the default.
//!
//! # Example
//!
//! ```rust
//! use ackchan_core::{Message, ProtocolCodec, SocketIoCodec};
//!
//! let codec = SocketIoCodec;
//! let msg = Message::ack_request(3, "join").with_args(Some(r#""lobby""#.to_string()));
//!
//! let frame = codec.encode(&msg).expect("valid envelope");
//! assert_eq!(frame, br#"423["join","lobby"]"#);
//! ```
//!
//! # Implementing Custom Codecs
//!
//! ```rust
//! use ackchan_core::{CodecError, Message, ProtocolCodec};
//!
//! #[derive(Clone, Default)]
//! struct MethodOnlyCodec;
//!
//! impl ProtocolCodec for MethodOnlyCodec {
//!     fn encode(&self, msg: &Message) -> Result<Vec<u8>, CodecError> {
//!         Ok(msg.method.clone().into_bytes())
//!     }
//! }
//! ```

use thiserror::Error;

use crate::message::{Message, MessageKind};

/// Error type for codec operations.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A correlated message kind was built without an ack id.
    #[error("{kind} message is missing its ack id")]
    MissingAckId {
        /// Kind of the offending message.
        kind: MessageKind,
    },

    /// An uncorrelated message kind carries an ack id.
    #[error("{kind} message must not carry an ack id")]
    UnexpectedAckId {
        /// Kind of the offending message.
        kind: MessageKind,
    },

    /// The method selector could not be rendered as JSON.
    #[error("method encoding failed: {0}")]
    Method(#[from] serde_json::Error),
}

/// Frames outbound messages into wire bytes.
///
/// Implementations must be shareable across the threads calling into a
/// channel, hence `Send + Sync + 'static`.
pub trait ProtocolCodec: Send + Sync + 'static {
    /// Encode a message envelope into a wire frame.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the envelope cannot be framed.
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, CodecError>;
}

/// Check that the ack id is present iff the kind requires one.
pub(crate) fn check_ack_id(msg: &Message) -> Result<(), CodecError> {
    match (msg.kind.requires_ack_id(), msg.ack_id) {
        (true, None) => Err(CodecError::MissingAckId { kind: msg.kind }),
        (false, Some(_)) => Err(CodecError::UnexpectedAckId { kind: msg.kind }),
        _ => Ok(()),
    }
}

/// socket.io text framing.
///
/// | Kind        | Frame                          |
/// |-------------|--------------------------------|
/// | Emit        | `42["method",args]`            |
/// | AckRequest  | `42<id>["method",args]`        |
/// | AckResponse | `43<id>[args]`                 |
///
/// When a message carries no arguments the `,args` part (or `args` for a
/// response) is omitted.
#[derive(Clone, Default, Debug, Copy)]
pub struct SocketIoCodec;

impl SocketIoCodec {
    fn prefix(kind: MessageKind) -> &'static str {
        match kind {
            MessageKind::Emit | MessageKind::AckRequest => "42",
            MessageKind::AckResponse => "43",
        }
    }
}

impl ProtocolCodec for SocketIoCodec {
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, CodecError> {
        check_ack_id(msg)?;

        let mut frame = String::from(Self::prefix(msg.kind));
        if let Some(id) = msg.ack_id {
            frame.push_str(&id.to_string());
        }

        frame.push('[');
        if msg.kind.carries_method() {
            frame.push_str(&serde_json::to_string(&msg.method)?);
            if let Some(args) = &msg.args {
                frame.push(',');
                frame.push_str(args);
            }
        } else if let Some(args) = &msg.args {
            frame.push_str(args);
        }
        frame.push(']');

        Ok(frame.into_bytes())
    }
}
