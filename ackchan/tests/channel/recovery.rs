//! Serialization failures, recovered panics and custom codecs.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use ackchan::{
    Channel, ChannelConfig, CodecError, Message, ProtocolCodec, RecoveredPanic, RecoveryHook,
    SendError,
};
use serde::{Serialize, Serializer};

use super::init_tracing;

#[derive(Clone, Default)]
struct CountingHook {
    calls: Arc<AtomicUsize>,
    panics: Arc<AtomicUsize>,
}

impl RecoveryHook for CountingHook {
    fn after_encode(&self, _message: &Message, recovered: Option<&RecoveredPanic>) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if recovered.is_some() {
            self.panics.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Argument whose serializer blows up, like an out-of-range index deep in a
/// hand-written `Serialize` impl.
struct Exploding;

impl Serialize for Exploding {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        panic!("index out of range");
    }
}

struct RejectingCodec;

impl ProtocolCodec for RejectingCodec {
    fn encode(&self, msg: &Message) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::MissingAckId { kind: msg.kind })
    }
}

fn channel_with_hook(hook: CountingHook) -> (Channel, ackchan::OutboundReceiver) {
    init_tracing();
    Channel::builder()
        .config(ChannelConfig::new(8, Duration::from_secs(30)))
        .recovery_hook(hook)
        .build()
        .expect("valid config")
}

#[test]
fn test_hook_runs_after_every_encode() {
    let hook = CountingHook::default();
    let (channel, _rx) = channel_with_hook(hook.clone());

    channel.emit("a", &1).expect("emit");
    channel.emit_empty("b").expect("emit");
    channel.reply(3, &"c").expect("reply");

    assert_eq!(hook.calls.load(Ordering::SeqCst), 3);
    assert_eq!(hook.panics.load(Ordering::SeqCst), 0);
}

#[test]
fn test_panicking_argument_is_recovered() {
    let hook = CountingHook::default();
    let (channel, _rx) = channel_with_hook(hook.clone());

    let err = channel.emit("boom", &Exploding).unwrap_err();
    assert!(matches!(err, SendError::Serialization { .. }));
    assert_eq!(hook.panics.load(Ordering::SeqCst), 1);
    assert_eq!(channel.queue_len(), 0);

    // The channel keeps working.
    channel.emit("after", &"still alive").expect("emit after recovery");
    assert_eq!(channel.queue_len(), 1);
}

#[tokio::test]
async fn test_panicking_ack_argument_leaves_no_waiter() {
    let hook = CountingHook::default();
    let (channel, _rx) = channel_with_hook(hook.clone());

    let err = channel
        .ack("boom", &Exploding, Duration::from_secs(3600))
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Serialization { .. }));
    assert_eq!(channel.pending_acks(), 0);
    assert_eq!(hook.panics.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unserializable_argument_is_rejected_before_queueing() {
    let (channel, mut rx) = channel_with_hook(CountingHook::default());

    let mut args = HashMap::new();
    args.insert(vec![1u8], "non-string map keys are not JSON");

    let err = channel.emit("bad", &args).unwrap_err();
    assert!(matches!(err, SendError::Serialization { .. }));
    assert!(!err.is_transient());
    assert_eq!(rx.try_recv(), None);
}

#[tokio::test]
async fn test_codec_failure_aborts_send() {
    init_tracing();
    let (channel, mut rx) = Channel::builder()
        .codec(RejectingCodec)
        .build()
        .expect("valid config");

    assert!(matches!(
        channel.emit_empty("ping"),
        Err(SendError::Encoding(_))
    ));

    let err = channel
        .ack_empty("ping", Duration::from_secs(3600))
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::Encoding(CodecError::MissingAckId { .. })));
    assert_eq!(channel.pending_acks(), 0);
    assert_eq!(rx.try_recv(), None);
}
