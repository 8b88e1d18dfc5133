//! Outbound queue gate between channel callers and the transport writer.
//!
//! Producers are the `emit`/`ack` callers of a [`Channel`](crate::Channel);
//! the single consumer is the external transport writer draining an
//! [`OutboundReceiver`]. The queue has a fixed capacity and sheds load:
//!
//! ```text
//! caller ──admit──► [ frame | frame | ... ] ──recv──► transport writer
//!          │             capacity N
//!          └── full ──► SendError::Overflood (nothing queued)
//! ```

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};

use crate::error::SendError;

/// Create a bounded outbound queue holding at most `capacity` frames.
///
/// `capacity` must be non-zero; [`ChannelConfig::validate`](crate::ChannelConfig::validate)
/// guarantees it for channels.
pub(crate) fn outbound_queue(capacity: usize) -> (OutboundQueue, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (OutboundQueue { tx, capacity }, OutboundReceiver { rx })
}

/// Producer side of the outbound queue.
#[derive(Clone, Debug)]
pub struct OutboundQueue {
    tx: mpsc::Sender<Vec<u8>>,
    capacity: usize,
}

impl OutboundQueue {
    /// Admit an encoded frame for transmission.
    ///
    /// The capacity check and the enqueue happen in one step, so concurrent
    /// producers can never push the queue past its capacity. Never blocks.
    ///
    /// # Errors
    ///
    /// - [`SendError::Overflood`] if the queue is full; the frame is dropped.
    /// - [`SendError::TransportClosed`] if the transport writer is gone.
    pub fn admit(&self, frame: Vec<u8>) -> Result<(), SendError> {
        match self.tx.try_send(frame) {
            Ok(()) => {
                tracing::trace!(queued = self.len(), "frame admitted");
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(SendError::Overflood {
                capacity: self.capacity,
            }),
            Err(TrySendError::Closed(_)) => Err(SendError::TransportClosed),
        }
    }

    /// Number of frames waiting for the transport writer.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Whether no frame is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the next admission would be rejected with `Overflood`.
    pub fn is_full(&self) -> bool {
        self.tx.capacity() == 0
    }

    /// Fixed capacity of the queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the transport writer has dropped or closed its end.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the outbound queue, owned by the transport writer.
#[derive(Debug)]
pub struct OutboundReceiver {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl OutboundReceiver {
    /// Wait for the next frame in FIFO order.
    ///
    /// Returns `None` once every [`Channel`](crate::Channel) clone is dropped
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Take the next frame if one is queued.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Number of frames queued for the writer.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether no frame is queued.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Take every frame currently queued.
    pub fn drain(&mut self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Stop accepting new frames. Frames already queued can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}
