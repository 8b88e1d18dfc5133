//! Error types for channel send operations.

use ackchan_core::CodecError;

/// Errors returned by [`Channel`](crate::Channel) send operations.
///
/// All of them are local to a single call and are never retried by the
/// channel. Lifecycle termination is deliberately absent: an ack abandoned
/// because the channel closed resolves to `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The caller's argument could not be serialized.
    ///
    /// Also returned when the argument's `Serialize` impl panicked and the
    /// panic was recovered.
    #[error("serialization failed: {message}")]
    Serialization {
        /// Details about the serialization failure.
        message: String,
    },

    /// The message envelope could not be framed by the protocol codec.
    #[error("encoding failed: {0}")]
    Encoding(#[from] CodecError),

    /// Outbound queue is at capacity; the frame was not queued.
    #[error("socket overflood: outbound queue full (capacity {capacity})")]
    Overflood {
        /// Fixed capacity of the outbound queue.
        capacity: usize,
    },

    /// No reply arrived within the ack timeout.
    #[error("ack timed out")]
    SendTimeout,

    /// The transport writer dropped its end of the outbound queue.
    #[error("transport closed")]
    TransportClosed,

    /// The ack reply could not be decoded into the requested type.
    #[error("reply deserialization failed: {message}")]
    Deserialization {
        /// Details about the deserialization failure.
        message: String,
    },
}

impl SendError {
    /// Whether the caller may reasonably retry the same call later.
    ///
    /// Only congestion and timeouts are transient; malformed arguments fail
    /// the same way every time.
    pub fn is_transient(&self) -> bool {
        matches!(self, SendError::Overflood { .. } | SendError::SendTimeout)
    }
}

/// Result type for channel send operations.
pub type SendResult<T> = Result<T, SendError>;
