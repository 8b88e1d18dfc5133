//! Message encoder: argument serialization, envelope framing and panic
//! recovery.
//!
//! Arguments are serialized to JSON and placed in the envelope, which the
//! channel's [`ProtocolCodec`] then frames. Both steps run under
//! `catch_unwind`: a `Serialize` impl that panics on an argument of extreme
//! shape must not take the channel down with it. The [`RecoveryHook`] is
//! invoked after every encode, successful or not.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use ackchan_core::{Message, ProtocolCodec};
use serde::Serialize;

use crate::error::SendError;

/// Panic caught while encoding a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredPanic {
    /// Panic payload rendered as text.
    pub message: String,
}

impl RecoveredPanic {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}

/// Runs after every encode attempt on a channel.
pub trait RecoveryHook: Send + Sync + 'static {
    /// Called once per encode with the envelope as built so far and the
    /// panic that was recovered, if any.
    fn after_encode(&self, message: &Message, recovered: Option<&RecoveredPanic>);
}

/// Default hook: reports recovered panics through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingRecoveryHook;

impl RecoveryHook for LoggingRecoveryHook {
    fn after_encode(&self, message: &Message, recovered: Option<&RecoveredPanic>) {
        if let Some(panic) = recovered {
            tracing::error!(
                kind = %message.kind,
                method = %message.method,
                ack_id = ?message.ack_id,
                panic = %panic.message,
                "recovered panic while encoding message"
            );
        }
    }
}

/// Serialize `args` into `message` and frame it with `codec`.
///
/// # Errors
///
/// - [`SendError::Serialization`] if `args` does not serialize, or if
///   serialization or framing panicked.
/// - [`SendError::Encoding`] if the codec rejects the envelope.
pub(crate) fn encode_frame<A>(
    codec: &dyn ProtocolCodec,
    hook: &dyn RecoveryHook,
    mut message: Message,
    args: Option<&A>,
) -> Result<Vec<u8>, SendError>
where
    A: Serialize + ?Sized,
{
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        message.args = serialize_args(args)?;
        codec.encode(&message).map_err(SendError::from)
    }));

    let (frame, recovered) = match attempt {
        Ok(frame) => (frame, None),
        Err(payload) => {
            let recovered = RecoveredPanic::from_payload(payload);
            let err = SendError::Serialization {
                message: format!("recovered panic: {}", recovered.message),
            };
            (Err(err), Some(recovered))
        }
    };

    hook.after_encode(&message, recovered.as_ref());
    frame
}

fn serialize_args<A>(args: Option<&A>) -> Result<Option<String>, SendError>
where
    A: Serialize + ?Sized,
{
    args.map(|value| {
        serde_json::to_string(value).map_err(|e| SendError::Serialization {
            message: e.to_string(),
        })
    })
    .transpose()
}
