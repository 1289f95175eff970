//! Session lifecycle events and their fan-out to subscribers.
//!
//! Every subscriber owns an independent bounded queue. Publishing pushes one
//! copy of the event onto each queue. A subscriber whose queue is full misses
//! that event; one that has gone away is dropped. Neither affects delivery to
//! the others.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use uuid::Uuid;

use crate::session::layout::{Layout, Limits, Orientation};
use crate::session::model::Frame;

/// Notification emitted after a successful state transition
#[derive(Debug, Clone)]
pub enum SessionEvent {
    SessionCreated {
        session_id: Uuid,
        layout: Layout,
        orientation: Orientation,
        limits: Limits,
    },
    PhotoCaptured {
        session_id: Uuid,
        photo_count: usize,
        photo: Frame,
        capture_complete: bool,
        max_capture_photos: usize,
        final_photos_needed: usize,
    },
    SelectionComplete {
        session_id: Uuid,
        selected_indices: Vec<usize>,
    },
    SessionComplete {
        session_id: Uuid,
        filename: String,
        collage: Arc<Vec<u8>>,
    },
    SessionReset {
        /// `None` when reset was called with no active session
        session_id: Option<Uuid>,
    },
}

impl SessionEvent {
    /// Wire-friendly event name
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionCreated { .. } => "session_created",
            SessionEvent::PhotoCaptured { .. } => "photo_captured",
            SessionEvent::SelectionComplete { .. } => "selection_complete",
            SessionEvent::SessionComplete { .. } => "session_complete",
            SessionEvent::SessionReset { .. } => "session_reset",
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            SessionEvent::SessionCreated { session_id, .. }
            | SessionEvent::PhotoCaptured { session_id, .. }
            | SessionEvent::SelectionComplete { session_id, .. }
            | SessionEvent::SessionComplete { session_id, .. } => Some(*session_id),
            SessionEvent::SessionReset { session_id } => *session_id,
        }
    }
}

/// Handle identifying one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

/// The receiving end of one subscriber's event queue.
///
/// Dropping it is equivalent to unsubscribing: the next publish notices the
/// closed queue and removes it.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    receiver: Receiver<SessionEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Block until the next event arrives, or `None` once the bus is gone
    pub fn recv(&self) -> Option<SessionEvent> {
        self.receiver.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn try_recv(&self) -> Option<SessionEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain everything queued so far without blocking
    pub fn drain(&self) -> Vec<SessionEvent> {
        self.receiver.try_iter().collect()
    }
}

/// Events a subscriber may fall behind by before it starts missing them.
/// A strip session emits fifteen.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

type Subscribers = Vec<(SubscriberId, SyncSender<SessionEvent>)>;

/// Broadcast point for session events
#[derive(Debug)]
pub struct EventBus {
    next_id: AtomicU64,
    capacity: usize,
    subscribers: Mutex<Subscribers>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus whose subscriber queues hold at most `capacity` events (minimum one)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            capacity: capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscribe(&self) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::sync_channel(self.capacity);
        self.subscribers().push((id, sender));
        debug!("Subscriber {:?} registered", id);
        Subscription { id, receiver }
    }

    /// Remove a subscriber; returns false if it was already gone
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        before != subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    /// Deliver `event` to every subscriber, returning how many received it.
    ///
    /// Never blocks. A full queue skips this event for that subscriber; a
    /// closed queue removes the subscriber.
    pub fn publish(&self, event: SessionEvent) -> usize {
        let mut subscribers = self.subscribers();
        let mut delivered = 0;
        subscribers.retain(|(id, sender)| match sender.try_send(event.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Subscriber {:?} queue full, skipping {} event",
                    id,
                    event.event_type()
                );
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!(
                    "Dropping subscriber {:?}: queue closed before {} event",
                    id,
                    event.event_type()
                );
                false
            }
        });
        delivered
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(|poisoned| {
            warn!("Event bus lock was poisoned; continuing with inner state");
            poisoned.into_inner()
        })
    }
}
