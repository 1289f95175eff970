//! Session lifecycle controller
//!
//! Owns the single active [`Session`] behind a mutex and drives it through
//! `Empty -> Capturing -> AwaitingSelection -> AwaitingFinalize -> Empty`.
//!
//! Every operation holds the lock for its whole duration, frame pulls and
//! blob writes included, so two captures can never race the quota check and
//! finalize never overlaps select. Events are published under the same lock,
//! which keeps each subscriber's queue in operation order.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Local, NaiveDateTime};
use log::{info, warn};
use uuid::Uuid;

use crate::capture::{BlobStore, FrameSource};
use crate::collage::CollageComposer;
use crate::error::{BoothError, Precondition, Result};
use crate::session::events::{EventBus, SessionEvent, SubscriberId, Subscription};
use crate::session::layout::{Layout, Limits, Orientation};
use crate::session::model::{Frame, Session, SessionStatus};

/// Source of the wall-clock time stamped onto collages
pub type Clock = Box<dyn Fn() -> NaiveDateTime + Send + Sync>;

/// Returned by a successful capture
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub session_id: Uuid,
    pub photo_count: usize,
    pub photo: Frame,
    pub capture_complete: bool,
    pub limits: Limits,
}

/// The finished collage handed back by finalize
#[derive(Debug, Clone)]
pub struct Composite {
    pub session_id: Uuid,
    pub filename: String,
    /// Encoded JPEG
    pub bytes: Arc<Vec<u8>>,
}

/// Drives the active session and fans out its events.
///
/// Create one per process and share it as `Arc<SessionController>`.
pub struct SessionController {
    active: Mutex<Option<Session>>,
    frames: Arc<dyn FrameSource>,
    store: Arc<dyn BlobStore>,
    composer: CollageComposer,
    events: EventBus,
    clock: Clock,
}

impl SessionController {
    pub fn new(
        frames: Arc<dyn FrameSource>,
        store: Arc<dyn BlobStore>,
        composer: CollageComposer,
    ) -> Self {
        Self {
            active: Mutex::new(None),
            frames,
            store,
            composer,
            events: EventBus::new(),
            clock: Box::new(|| Local::now().naive_local()),
        }
    }

    /// Replace the clock used for collage timestamps
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDateTime + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// Start a new session, discarding any active one.
    pub fn create(&self, layout: Layout, orientation: Orientation) -> SessionStatus {
        let mut active = self.lock();
        let session = Session::new(layout, orientation);
        let status = SessionStatus::from(&session);

        if let Some(previous) = active.replace(session) {
            info!(
                "Discarding session {} ({} photos) for a new one",
                previous.id(),
                previous.photo_count()
            );
        }
        info!(
            "Created session {:?} with layout: {}, orientation: {}",
            status.session_id, layout, orientation
        );

        if let Some(session_id) = status.session_id {
            self.events.publish(SessionEvent::SessionCreated {
                session_id,
                layout,
                orientation,
                limits: layout.limits(),
            });
        }
        status
    }

    /// Pull one frame from the frame source and append it.
    ///
    /// # Errors
    /// * `PreconditionNotMet` - no session, or the capture quota is already reached
    /// * `FrameUnavailable` - the frame source failed; nothing is appended
    pub fn capture(&self) -> Result<CaptureOutcome> {
        let mut active = self.lock();
        let session = active
            .as_mut()
            .ok_or(BoothError::precondition(Precondition::NoActiveSession))?;
        session.ensure_capturing()?;

        let photo: Frame = Arc::new(self.frames.next_frame()?);
        let capture_complete = session.push_photo(Arc::clone(&photo));
        let limits = session.limits();
        let outcome = CaptureOutcome {
            session_id: session.id(),
            photo_count: session.photo_count(),
            photo,
            capture_complete,
            limits,
        };

        info!(
            "Captured photo {}/{} for session {}",
            outcome.photo_count,
            limits.max_capture_photos,
            outcome.session_id
        );
        self.events.publish(SessionEvent::PhotoCaptured {
            session_id: outcome.session_id,
            photo_count: outcome.photo_count,
            photo: Arc::clone(&outcome.photo),
            capture_complete,
            max_capture_photos: limits.max_capture_photos,
            final_photos_needed: limits.final_photos_needed,
        });
        Ok(outcome)
    }

    /// Record which photos go into the collage, in collage order.
    ///
    /// # Errors
    /// * `PreconditionNotMet` - no session, capture still running, or already selected
    /// * `InvalidSelection` - wrong count, out-of-range or duplicate index
    pub fn select(&self, indices: &[usize]) -> Result<Vec<usize>> {
        let mut active = self.lock();
        let session = active
            .as_mut()
            .ok_or(BoothError::precondition(Precondition::NoActiveSession))?;
        session.ensure_awaiting_selection()?;
        session.validate_selection(indices)?;

        session.record_selection(indices.to_vec());
        info!("Selected photos {:?} for session {}", indices, session.id());

        self.events.publish(SessionEvent::SelectionComplete {
            session_id: session.id(),
            selected_indices: indices.to_vec(),
        });
        Ok(indices.to_vec())
    }

    /// Compose the selected photos, persist the collage and end the session.
    ///
    /// If composition or persistence fails the session is kept as it was, so
    /// finalize can be retried.
    ///
    /// # Errors
    /// * `PreconditionNotMet` - no session, or no selection recorded yet
    /// * `PersistFailure` - the blob store could not save the collage
    pub fn finalize(&self) -> Result<Composite> {
        let mut active = self.lock();
        let session = active
            .as_ref()
            .ok_or(BoothError::precondition(Precondition::NoActiveSession))?;
        session.ensure_awaiting_finalize()?;

        info!(
            "Finalizing session {} with selected photos: {:?}",
            session.id(),
            session.selected_indices()
        );
        let photos = session.selected_photos();
        let bytes = self.composer.compose_jpeg(
            &photos,
            session.layout(),
            session.orientation(),
            (self.clock)(),
        )?;
        let filename = self.store.save(&bytes)?;

        let session_id = session.id();
        *active = None;

        let composite = Composite {
            session_id,
            filename,
            bytes: Arc::new(bytes),
        };
        info!("Session {} complete: {}", session_id, composite.filename);
        self.events.publish(SessionEvent::SessionComplete {
            session_id,
            filename: composite.filename.clone(),
            collage: Arc::clone(&composite.bytes),
        });
        Ok(composite)
    }

    /// Snapshot of the active session, or an empty status
    pub fn status(&self) -> SessionStatus {
        self.lock()
            .as_ref()
            .map(SessionStatus::from)
            .unwrap_or_else(SessionStatus::empty)
    }

    /// Drop the active session whatever its phase; returns whether one existed
    pub fn reset(&self) -> bool {
        let mut active = self.lock();
        let previous = active.take();
        let session_id = previous.as_ref().map(Session::id);

        match session_id {
            Some(id) => info!("Reset session {}", id),
            None => info!("Reset with no active session"),
        }
        self.events.publish(SessionEvent::SessionReset { session_id });
        previous.is_some()
    }

    // ========================================================================
    // Event subscription
    // ========================================================================

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    pub fn composer(&self) -> &CollageComposer {
        &self.composer
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        // Mutations happen only after every fallible step, so a panic
        // mid-operation cannot leave a half-applied session behind.
        self.active.lock().unwrap_or_else(|poisoned| {
            warn!("Session lock was poisoned; continuing with inner state");
            poisoned.into_inner()
        })
    }
}
