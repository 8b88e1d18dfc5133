//! # ackchan
//!
//! Outbound half of a socket.io style bidirectional channel.
//!
//! This crate provides:
//! - **Channel**: `emit` (fire-and-forget) and `ack` (request/response with
//!   timeout) over a shared outbound queue
//! - **Outbound queue**: bounded, non-blocking admission that sheds load with
//!   [`SendError::Overflood`] instead of queueing without limit
//! - **Ack registry**: per-channel correlation ids and one-shot reply slots
//! - **Lifecycle signals**: closed / interrupted events that resolve pending
//!   acks without an error
//!
//! The physical connection, inbound frame parsing and reconnection live
//! outside this crate. The transport writer drains the [`OutboundReceiver`];
//! the inbound dispatch path hands replies to [`Channel::deliver_ack`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use ackchan::{Channel, ChannelConfig};
//!
//! let (channel, mut outbound) = Channel::new(ChannelConfig::default())?;
//!
//! // transport writer
//! tokio::spawn(async move {
//!     while let Some(frame) = outbound.recv().await {
//!         socket.write_all(&frame).await?;
//!     }
//! });
//!
//! channel.emit("chat", &"hello")?;
//! let reply = channel.ack("join", &"lobby", Duration::from_secs(5)).await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

// Re-export protocol types for convenience
pub use ackchan_core::{AckId, CodecError, Message, MessageKind, ProtocolCodec, SocketIoCodec};

// =============================================================================
// Modules
// =============================================================================

/// Ack correlation ids and reply slots.
pub mod ack;

/// Channel orchestration of emits and acks.
pub mod channel;

/// Channel configuration.
pub mod config;

/// Argument serialization, framing and panic recovery.
pub mod encoder;

/// Error types for send operations.
pub mod error;

/// Closed / interrupted lifecycle signals.
pub mod lifecycle;

/// Bounded outbound queue.
pub mod outbound;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use ack::{AckRegistry, AckWaiter};
pub use channel::{Channel, ChannelBuilder};
pub use config::{ChannelConfig, ConfigError, DEFAULT_ACK_TIMEOUT, DEFAULT_QUEUE_BUFFER_SIZE};
pub use encoder::{LoggingRecoveryHook, RecoveredPanic, RecoveryHook};
pub use error::{SendError, SendResult};
pub use lifecycle::{Lifecycle, LifecycleHandle};
pub use outbound::{OutboundQueue, OutboundReceiver};
