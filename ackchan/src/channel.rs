//! Channel: emit and ack orchestration over the outbound queue.
//!
//! # Ack flow
//!
//! ```text
//!   next_id ──► add_waiter(id) ──► encode ──► admit ──► wait
//!                                    │          │         │
//!                                    └── err ───┴─► remove waiter, return err
//!
//!   wait = first of:
//!     closed        ──► Ok(None)
//!     interrupted   ──► Ok(None)
//!     reply(id)     ──► Ok(Some(payload))
//!     timeout       ──► remove waiter, Err(SendTimeout)
//!                       (a reply that already claimed the slot wins)
//! ```
//!
//! The waiter is registered before the frame is queued so a reply racing the
//! transmission always finds its slot. Whatever the outcome, the slot is
//! gone from the registry when `ack` returns or its future is dropped.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ackchan_core::{AckId, Message, ProtocolCodec, SocketIoCodec};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ack::{AckRegistry, WaiterGuard};
use crate::config::{ChannelConfig, ConfigError};
use crate::encoder::{LoggingRecoveryHook, RecoveryHook, encode_frame};
use crate::error::{SendError, SendResult};
use crate::lifecycle::{Lifecycle, LifecycleHandle};
use crate::outbound::{OutboundQueue, OutboundReceiver, outbound_queue};

/// Outbound side of a bidirectional message channel.
///
/// Cheap to clone; clones share the queue, the ack registry and the
/// lifecycle signals, and may be used from any number of tasks or threads.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<ChannelInner>,
}

struct ChannelInner {
    config: ChannelConfig,
    codec: Box<dyn ProtocolCodec>,
    hook: Box<dyn RecoveryHook>,
    outbound: OutboundQueue,
    acks: AckRegistry,
    lifecycle: Lifecycle,
}

impl Channel {
    /// Create a channel with the default codec and recovery hook.
    ///
    /// Returns the channel and the receiving end of its outbound queue, to be
    /// drained by the transport writer.
    pub fn new(config: ChannelConfig) -> Result<(Self, OutboundReceiver), ConfigError> {
        Self::builder().config(config).build()
    }

    /// Start building a channel.
    pub fn builder() -> ChannelBuilder {
        ChannelBuilder::default()
    }

    /// Send a fire-and-forget event carrying `args`.
    ///
    /// # Errors
    ///
    /// Serialization, encoding, overflow and transport-closed errors, in that
    /// order of detection. Never blocks.
    pub fn emit<A>(&self, method: &str, args: &A) -> SendResult<()>
    where
        A: Serialize + ?Sized,
    {
        self.send(Message::emit(method), Some(args))
    }

    /// Send a fire-and-forget event without arguments.
    pub fn emit_empty(&self, method: &str) -> SendResult<()> {
        self.send::<()>(Message::emit(method), None)
    }

    /// Send a request carrying `args` and wait up to `timeout` for its reply.
    ///
    /// Returns `Ok(Some(payload))` when the reply arrives, and `Ok(None)` when
    /// the channel is closed or interrupted while waiting.
    ///
    /// # Errors
    ///
    /// - Any [`emit`](Self::emit) error, returned before waiting.
    /// - [`SendError::SendTimeout`] if no reply arrived in time.
    pub async fn ack<A>(
        &self,
        method: &str,
        args: &A,
        timeout: Duration,
    ) -> SendResult<Option<String>>
    where
        A: Serialize + ?Sized,
    {
        self.ack_inner(method, Some(args), timeout).await
    }

    /// [`ack`](Self::ack) without arguments.
    pub async fn ack_empty(&self, method: &str, timeout: Duration) -> SendResult<Option<String>> {
        self.ack_inner::<()>(method, None, timeout).await
    }

    /// [`ack`](Self::ack) with the configured default timeout.
    pub async fn call<A>(&self, method: &str, args: &A) -> SendResult<Option<String>>
    where
        A: Serialize + ?Sized,
    {
        self.ack_inner(method, Some(args), self.inner.config.ack_timeout)
            .await
    }

    /// [`ack`](Self::ack), decoding the reply payload as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Any [`ack`](Self::ack) error, or [`SendError::Deserialization`] if the
    /// reply is not a valid `T`.
    pub async fn ack_as<T, A>(
        &self,
        method: &str,
        args: &A,
        timeout: Duration,
    ) -> SendResult<Option<T>>
    where
        T: DeserializeOwned,
        A: Serialize + ?Sized,
    {
        let Some(payload) = self.ack(method, args, timeout).await? else {
            return Ok(None);
        };
        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|e| SendError::Deserialization {
                message: e.to_string(),
            })
    }

    /// Answer an inbound ack request `ack_id` with `args`.
    pub fn reply<A>(&self, ack_id: AckId, args: &A) -> SendResult<()>
    where
        A: Serialize + ?Sized,
    {
        self.send(Message::ack_response(ack_id), Some(args))
    }

    /// Answer an inbound ack request `ack_id` without arguments.
    pub fn reply_empty(&self, ack_id: AckId) -> SendResult<()> {
        self.send::<()>(Message::ack_response(ack_id), None)
    }

    /// Hand a reply received by the inbound dispatch path to its waiting
    /// ack.
    ///
    /// Returns `false` if no ack is waiting on `ack_id`, e.g. because it
    /// already timed out. Late replies are otherwise ignored.
    pub fn deliver_ack(&self, ack_id: AckId, payload: impl Into<String>) -> bool {
        self.inner.acks.fulfill(ack_id, payload.into())
    }

    /// The ack registry, for inbound dispatch paths that hold it directly.
    pub fn acks(&self) -> &AckRegistry {
        &self.inner.acks
    }

    /// Handle to fire this channel's lifecycle signals.
    pub fn lifecycle(&self) -> LifecycleHandle {
        self.inner.lifecycle.handle()
    }

    /// Whether the closed signal fired.
    pub fn is_closed(&self) -> bool {
        self.inner.lifecycle.is_closed()
    }

    /// Whether the interrupted signal fired.
    pub fn is_interrupted(&self) -> bool {
        self.inner.lifecycle.is_interrupted()
    }

    /// Number of acks waiting for a reply.
    pub fn pending_acks(&self) -> usize {
        self.inner.acks.pending()
    }

    /// Number of frames waiting for the transport writer.
    pub fn queue_len(&self) -> usize {
        self.inner.outbound.len()
    }

    /// Whether the next send would be rejected with `Overflood`.
    pub fn is_queue_full(&self) -> bool {
        self.inner.outbound.is_full()
    }

    /// Configuration this channel was built with.
    pub fn config(&self) -> &ChannelConfig {
        &self.inner.config
    }

    fn send<A>(&self, message: Message, args: Option<&A>) -> SendResult<()>
    where
        A: Serialize + ?Sized,
    {
        let inner = &*self.inner;
        let frame = encode_frame(inner.codec.as_ref(), inner.hook.as_ref(), message, args)?;
        inner.outbound.admit(frame)
    }

    async fn ack_inner<A>(
        &self,
        method: &str,
        args: Option<&A>,
        timeout: Duration,
    ) -> SendResult<Option<String>>
    where
        A: Serialize + ?Sized,
    {
        let inner = &*self.inner;
        let id = inner.acks.next_id();
        let mut waiter = inner.acks.add_waiter(id);
        let _guard = WaiterGuard::new(&inner.acks, id);

        self.send(Message::ack_request(id, method), args)?;

        tokio::select! {
            biased;

            _ = inner.lifecycle.closed() => {
                tracing::debug!(ack_id = id, method, "ack abandoned: channel closed");
                Ok(None)
            }
            _ = inner.lifecycle.interrupted() => {
                tracing::debug!(ack_id = id, method, "ack abandoned: channel interrupted");
                Ok(None)
            }
            Some(payload) = &mut waiter => {
                tracing::debug!(ack_id = id, method, "ack resolved");
                Ok(Some(payload))
            }
            _ = tokio::time::sleep(timeout) => {
                // A reply that claimed the slot before the removal is sent
                // right after its claim and wins over the timer.
                if !inner.acks.remove_waiter(id) {
                    if let Some(payload) = (&mut waiter).await {
                        tracing::debug!(ack_id = id, method, "ack resolved at deadline");
                        return Ok(Some(payload));
                    }
                }
                tracing::debug!(ack_id = id, method, ?timeout, "ack timed out");
                Err(SendError::SendTimeout)
            }
        }
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("config", &self.inner.config)
            .field("queue_len", &self.queue_len())
            .field("pending_acks", &self.pending_acks())
            .field("closed", &self.is_closed())
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

/// Builder for [`Channel`].
pub struct ChannelBuilder {
    config: ChannelConfig,
    codec: Box<dyn ProtocolCodec>,
    hook: Box<dyn RecoveryHook>,
    lifecycle: Lifecycle,
}

impl Default for ChannelBuilder {
    fn default() -> Self {
        Self {
            config: ChannelConfig::default(),
            codec: Box::new(SocketIoCodec),
            hook: Box::new(LoggingRecoveryHook),
            lifecycle: Lifecycle::new(),
        }
    }
}

impl ChannelBuilder {
    /// Set the channel configuration.
    pub fn config(mut self, config: ChannelConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the protocol codec used to frame messages.
    pub fn codec<C: ProtocolCodec>(mut self, codec: C) -> Self {
        self.codec = Box::new(codec);
        self
    }

    /// Set the hook invoked after every encode.
    pub fn recovery_hook<H: RecoveryHook>(mut self, hook: H) -> Self {
        self.hook = Box::new(hook);
        self
    }

    /// Observe lifecycle signals owned by the caller instead of fresh ones.
    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// Validate the configuration and build the channel.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is unusable.
    pub fn build(self) -> Result<(Channel, OutboundReceiver), ConfigError> {
        self.config.validate()?;

        let (outbound, receiver) = outbound_queue(self.config.queue_buffer_size);
        let channel = Channel {
            inner: Arc::new(ChannelInner {
                config: self.config,
                codec: self.codec,
                hook: self.hook,
                outbound,
                acks: AckRegistry::new(),
                lifecycle: self.lifecycle,
            }),
        };

        Ok((channel, receiver))
    }
}
