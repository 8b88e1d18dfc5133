//! Ack correlation: id uniqueness, reply delivery, timeouts and late replies.

use std::collections::HashSet;
use std::time::Duration;

use ackchan::SendError;

use super::{ack_id_of, channel_with_capacity, wait_for_pending};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_acks_get_distinct_ids() {
    const CALLS: usize = 64;
    let (channel, mut rx) = channel_with_capacity(CALLS);

    let calls: Vec<_> = (0..CALLS)
        .map(|n| {
            let channel = channel.clone();
            tokio::spawn(async move { channel.ack("echo", &n, Duration::from_secs(30)).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for _ in 0..CALLS {
        let frame = rx.recv().await.expect("request frame");
        let id = ack_id_of(&frame);
        assert!(ids.insert(id), "ack id {id} issued twice");
        assert!(channel.deliver_ack(id, id.to_string()));
    }

    for call in calls {
        let reply = call.await.expect("ack task").expect("ack");
        assert!(reply.is_some());
    }
    assert_eq!(ids.len(), CALLS);
    assert_eq!(channel.pending_acks(), 0);
}

#[tokio::test]
async fn test_reply_reaches_matching_caller() {
    let (channel, mut rx) = channel_with_capacity(8);

    let first = tokio::spawn({
        let channel = channel.clone();
        async move { channel.ack("first", &1, Duration::from_secs(30)).await }
    });
    let first_id = ack_id_of(&rx.recv().await.expect("first frame"));

    let second = tokio::spawn({
        let channel = channel.clone();
        async move { channel.ack("second", &2, Duration::from_secs(30)).await }
    });
    let second_id = ack_id_of(&rx.recv().await.expect("second frame"));
    assert_ne!(first_id, second_id);

    // Answer out of order.
    assert!(channel.deliver_ack(second_id, "two"));
    assert!(channel.deliver_ack(first_id, "one"));

    assert_eq!(
        first.await.expect("task").expect("ack").as_deref(),
        Some("one")
    );
    assert_eq!(
        second.await.expect("task").expect("ack").as_deref(),
        Some("two")
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_then_late_reply_is_noop() {
    let (channel, mut rx) = channel_with_capacity(8);

    let err = channel
        .ack_empty("slow", Duration::from_millis(250))
        .await
        .unwrap_err();
    assert!(matches!(err, SendError::SendTimeout));
    assert_eq!(channel.pending_acks(), 0);

    let id = ack_id_of(&rx.try_recv().expect("request was sent"));
    assert!(!channel.deliver_ack(id, "too late"));
    assert_eq!(channel.pending_acks(), 0);
}

#[tokio::test]
async fn test_second_reply_after_success_is_noop() {
    let (channel, mut rx) = channel_with_capacity(8);

    let call = tokio::spawn({
        let channel = channel.clone();
        async move { channel.ack_empty("ping", Duration::from_secs(30)).await }
    });
    let id = ack_id_of(&rx.recv().await.expect("frame"));

    assert!(channel.deliver_ack(id, "pong"));
    assert_eq!(call.await.expect("task").expect("ack").as_deref(), Some("pong"));
    assert!(!channel.deliver_ack(id, "pong again"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reply_racing_timeout_resolves_exactly_once() {
    for _ in 0..50 {
        let (channel, mut rx) = channel_with_capacity(4);

        let responder = tokio::spawn({
            let channel = channel.clone();
            async move {
                let frame = rx.recv().await.expect("request frame");
                tokio::time::sleep(Duration::from_millis(5)).await;
                channel.deliver_ack(ack_id_of(&frame), "pong")
            }
        });

        let outcome = channel.ack_empty("ping", Duration::from_millis(5)).await;
        let delivered = responder.await.expect("responder task");

        match outcome {
            Ok(Some(payload)) => {
                assert_eq!(payload, "pong");
                assert!(delivered);
            }
            Err(SendError::SendTimeout) => {
                assert!(!delivered, "reply reported delivered to a timed-out ack");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(channel.pending_acks(), 0);
    }
}

#[tokio::test]
async fn test_call_uses_configured_timeout() {
    let (channel, mut rx) = channel_with_capacity(8);

    let call = tokio::spawn({
        let channel = channel.clone();
        async move { channel.call("config", &"timeout").await }
    });
    wait_for_pending(&channel, 1).await;

    let frame = rx.recv().await.expect("frame");
    assert_eq!(frame, br#"421["config","timeout"]"#);
    assert!(channel.deliver_ack(1, "30s"));
    assert_eq!(call.await.expect("task").expect("ack").as_deref(), Some("30s"));
}

#[test]
fn test_registry_is_shared_with_inbound_path() {
    let (channel, _rx) = channel_with_capacity(8);
    let registry = channel.acks();

    let id = registry.next_id();
    let _waiter = registry.add_waiter(id);
    assert_eq!(channel.pending_acks(), 1);
    assert!(registry.remove_waiter(id));
    assert_eq!(channel.pending_acks(), 0);
}
