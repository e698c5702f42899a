//! Live fan-out of new attendance records.
//!
//! Every successful submission is published once as a
//! [`LiveEvent::NewAttendance`]. Each connected viewer holds a
//! [`Subscription`] and receives the events published while it is
//! connected. There is no replay: a viewer that connects later misses
//! earlier events, and a viewer that falls more than the channel capacity
//! behind skips the overflow.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, warn};

use crate::record::AttendanceRecord;

/// Events pushed to live viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LiveEvent {
    /// A record was appended to the store.
    NewAttendance(AttendanceRecord),
}

impl LiveEvent {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewAttendance(_) => "new_attendance",
        }
    }
}

/// Publisher side of the live channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<LiveEvent>,
    next_viewer: Arc<AtomicU64>,
}

impl Broadcaster {
    /// Create a channel that buffers up to `capacity` events per viewer.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            next_viewer: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a new viewer.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let id = self.next_viewer.fetch_add(1, Ordering::Relaxed);
        debug!("Viewer {id} connected");
        Subscription {
            id,
            rx: self.tx.subscribe(),
        }
    }

    /// Publish a new record to every connected viewer.
    ///
    /// Returns the number of viewers the event was queued for. Having no
    /// viewers is not an error.
    pub fn publish(&self, record: &AttendanceRecord) -> usize {
        let event = LiveEvent::NewAttendance(record.clone());
        match self.tx.send(event) {
            Ok(viewers) => {
                debug!(
                    "Emitting new attendance for {} to {viewers} viewer(s)",
                    record.roll_no
                );
                viewers
            }
            Err(_) => {
                debug!("No viewers connected for new attendance {}", record.roll_no);
                0
            }
        }
    }

    /// Number of currently connected viewers.
    #[must_use]
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One viewer's end of the live channel.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: broadcast::Receiver<LiveEvent>,
}

impl Subscription {
    /// Identifier used in log lines.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once every [`Broadcaster`] handle is gone.
    pub async fn recv(&mut self) -> Option<LiveEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Viewer {} lagged, skipped {skipped} event(s)", self.id);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<LiveEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Viewer {} lagged, skipped {skipped} event(s)", self.id);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        debug!("Viewer {} disconnected", self.id);
    }
}
