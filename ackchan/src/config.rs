//! Configuration for channel behavior.

use std::time::Duration;

/// Default outbound queue capacity, in frames.
pub const DEFAULT_QUEUE_BUFFER_SIZE: usize = 500;

/// Default timeout used by [`Channel::call`](crate::Channel::call).
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised when validating a [`ChannelConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A zero-capacity queue would reject every frame.
    #[error("queue_buffer_size must be greater than zero")]
    ZeroQueueSize,

    /// A zero timeout would expire every ack before it is sent.
    #[error("ack_timeout must be greater than zero")]
    ZeroAckTimeout,
}

/// Configuration fixed at channel construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Maximum number of encoded frames waiting for the transport writer.
    ///
    /// Once reached, sends fail with [`SendError::Overflood`](crate::SendError::Overflood)
    /// instead of blocking.
    pub queue_buffer_size: usize,

    /// Ack timeout applied by [`Channel::call`](crate::Channel::call).
    pub ack_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            queue_buffer_size: DEFAULT_QUEUE_BUFFER_SIZE,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }
}

impl ChannelConfig {
    /// Create a new configuration with specified parameters.
    pub fn new(queue_buffer_size: usize, ack_timeout: Duration) -> Self {
        Self {
            queue_buffer_size,
            ack_timeout,
        }
    }

    /// Override the default ack timeout.
    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    /// Override the outbound queue capacity.
    pub fn with_queue_buffer_size(mut self, queue_buffer_size: usize) -> Self {
        self.queue_buffer_size = queue_buffer_size;
        self
    }

    /// Small queue and short timeout: shed load early on a local link.
    pub fn low_latency() -> Self {
        Self {
            queue_buffer_size: 64,
            ack_timeout: Duration::from_secs(2),
        }
    }

    /// Deep queue and generous timeout for bursty producers.
    pub fn high_throughput() -> Self {
        Self {
            queue_buffer_size: 8192,
            ack_timeout: Duration::from_secs(60),
        }
    }

    /// Reject configurations the channel cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_buffer_size == 0 {
            return Err(ConfigError::ZeroQueueSize);
        }
        if self.ack_timeout.is_zero() {
            return Err(ConfigError::ZeroAckTimeout);
        }
        Ok(())
    }
}
