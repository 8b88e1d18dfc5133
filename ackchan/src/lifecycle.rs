//! Channel lifecycle signals.
//!
//! Two one-time events are driven by whoever owns the connection:
//!
//! - **closed**: the channel is gone for good
//! - **interrupted**: the connection dropped and is being re-established
//!
//! In-flight acks observe both and resolve with an empty result instead of an
//! error. Once fired, a signal stays fired.

use tokio_util::sync::CancellationToken;

/// Lifecycle signals shared by a channel and its [`LifecycleHandle`]s.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    closed: CancellationToken,
    interrupted: CancellationToken,
}

impl Lifecycle {
    /// Create a lifecycle with neither signal fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the connection manager to fire the signals.
    pub fn handle(&self) -> LifecycleHandle {
        LifecycleHandle {
            lifecycle: self.clone(),
        }
    }

    /// Whether the closed signal fired.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Whether the interrupted signal fired.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.is_cancelled()
    }

    /// Whether either signal fired.
    pub fn is_terminated(&self) -> bool {
        self.is_closed() || self.is_interrupted()
    }

    /// Resolves once the closed signal fires.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// Resolves once the interrupted signal fires.
    pub async fn interrupted(&self) {
        self.interrupted.cancelled().await
    }
}

/// Externally-held trigger for a channel's lifecycle signals.
#[derive(Debug, Clone)]
pub struct LifecycleHandle {
    lifecycle: Lifecycle,
}

impl LifecycleHandle {
    /// Fire the closed signal. Idempotent.
    pub fn close(&self) {
        tracing::debug!("channel closed");
        self.lifecycle.closed.cancel();
    }

    /// Fire the interrupted signal. Idempotent.
    pub fn interrupt(&self) {
        tracing::debug!("channel interrupted");
        self.lifecycle.interrupted.cancel();
    }

    /// Whether the closed signal fired.
    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    /// Whether the interrupted signal fired.
    pub fn is_interrupted(&self) -> bool {
        self.lifecycle.is_interrupted()
    }
}
