//! # ackchan-core
//!
//! Protocol-level types shared by the `ackchan` channel.
//!
//! This crate provides:
//! - **Message**: the envelope carried by every outbound frame
//! - **ProtocolCodec**: pluggable framing of a [`Message`] into wire bytes
//! - **SocketIoCodec**: the default socket.io text framing
//!
//! Decoding of inbound frames belongs to the connection layer and is not
//! provided here.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Pluggable wire framing for outbound messages.
pub mod codec;

/// Message envelope and message kinds.
pub mod message;

pub use codec::{CodecError, ProtocolCodec, SocketIoCodec};
pub use message::{AckId, Message, MessageKind};
