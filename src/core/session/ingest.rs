use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Bounded audio queue between the client read loop and the recognizer.
///
/// `offer` never waits: when the queue is full the newest chunk is dropped.
#[derive(Debug)]
pub struct AudioIngest {
    tx: mpsc::Sender<Bytes>,
    dropped: AtomicU64,
}

impl AudioIngest {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    /// Returns whether the chunk was queued
    pub fn offer(&self, chunk: Bytes) -> bool {
        match self.tx.try_send(chunk) {
            Ok(()) => true,
            Err(TrySendError::Full(chunk)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped, "Audio queue full, dropping {} bytes", chunk.len());
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Audio queue closed, discarding chunk");
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
