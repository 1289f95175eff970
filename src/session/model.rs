//! The session aggregate and its read-only status snapshot.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::DynamicImage;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{BoothError, Precondition, Result, SelectionError};
use crate::session::layout::{Layout, Limits, Orientation};

/// A captured frame, stored exactly as the frame source returned it.
pub type Frame = Arc<DynamicImage>;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No active session
    Empty,
    /// Collecting photos until the capture quota is reached
    Capturing,
    /// Capture quota reached, waiting for the user's pick
    AwaitingSelection,
    /// Selection recorded, waiting for the collage to be produced
    AwaitingFinalize,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Empty => write!(f, "Empty"),
            SessionPhase::Capturing => write!(f, "Capturing"),
            SessionPhase::AwaitingSelection => write!(f, "AwaitingSelection"),
            SessionPhase::AwaitingFinalize => write!(f, "AwaitingFinalize"),
        }
    }
}

/// One photo-booth run, from the first capture to the finished collage.
///
/// Photos are append-only: indices handed out to the user stay valid for
/// the life of the session.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    layout: Layout,
    orientation: Orientation,
    created_at: DateTime<Utc>,
    photos: Vec<Frame>,
    selected: Vec<usize>,
    capture_complete: bool,
    selection_complete: bool,
}

impl Session {
    pub fn new(layout: Layout, orientation: Orientation) -> Self {
        Self {
            id: Uuid::new_v4(),
            layout,
            orientation,
            created_at: Utc::now(),
            photos: Vec::with_capacity(layout.capture_limit()),
            selected: Vec::new(),
            capture_complete: false,
            selection_complete: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn photos(&self) -> &[Frame] {
        &self.photos
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn selected_indices(&self) -> &[usize] {
        &self.selected
    }

    pub fn is_capture_complete(&self) -> bool {
        self.capture_complete
    }

    pub fn is_selection_complete(&self) -> bool {
        self.selection_complete
    }

    pub fn limits(&self) -> Limits {
        self.layout.limits()
    }

    pub fn phase(&self) -> SessionPhase {
        if self.selection_complete {
            SessionPhase::AwaitingFinalize
        } else if self.capture_complete {
            SessionPhase::AwaitingSelection
        } else {
            SessionPhase::Capturing
        }
    }

    // ========================================================================
    // Preconditions
    // ========================================================================

    pub(crate) fn ensure_capturing(&self) -> Result<()> {
        match self.phase() {
            SessionPhase::Capturing => Ok(()),
            SessionPhase::AwaitingSelection => {
                Err(BoothError::precondition(Precondition::CaptureAlreadyComplete))
            }
            _ => Err(BoothError::precondition(Precondition::SelectionAlreadyComplete)),
        }
    }

    pub(crate) fn ensure_awaiting_selection(&self) -> Result<()> {
        match self.phase() {
            SessionPhase::AwaitingSelection => Ok(()),
            SessionPhase::AwaitingFinalize => {
                Err(BoothError::precondition(Precondition::SelectionAlreadyComplete))
            }
            _ => Err(BoothError::precondition(Precondition::CaptureNotComplete)),
        }
    }

    pub(crate) fn ensure_awaiting_finalize(&self) -> Result<()> {
        if self.phase() == SessionPhase::AwaitingFinalize {
            Ok(())
        } else {
            Err(BoothError::precondition(Precondition::SelectionNotComplete))
        }
    }

    /// Check a selection against the layout quota and the captured photos.
    ///
    /// Count is checked first, then each index in order, so the reported
    /// reason is the first problem a user would see.
    pub fn validate_selection(&self, indices: &[usize]) -> Result<()> {
        let expected = self.layout.final_limit();
        if indices.len() != expected {
            return Err(BoothError::selection(SelectionError::WrongCount {
                expected,
                actual: indices.len(),
            }));
        }

        let photo_count = self.photos.len();
        let mut seen = vec![false; photo_count];
        for &index in indices {
            if index >= photo_count {
                return Err(BoothError::selection(SelectionError::OutOfRange {
                    index,
                    photo_count,
                }));
            }
            if seen[index] {
                return Err(BoothError::selection(SelectionError::Duplicate { index }));
            }
            seen[index] = true;
        }

        Ok(())
    }

    // ========================================================================
    // Mutations (callers check preconditions first)
    // ========================================================================

    /// Append a frame; returns whether the capture quota is now reached.
    pub(crate) fn push_photo(&mut self, frame: Frame) -> bool {
        self.photos.push(frame);
        if self.photos.len() >= self.layout.capture_limit() {
            self.capture_complete = true;
        }
        self.capture_complete
    }

    pub(crate) fn record_selection(&mut self, indices: Vec<usize>) {
        self.selected = indices;
        self.selection_complete = true;
    }

    /// Selected frames in selection order.
    pub fn selected_photos(&self) -> Vec<Frame> {
        self.selected
            .iter()
            .map(|&index| Arc::clone(&self.photos[index]))
            .collect()
    }
}

/// Read-only view of the controller's state
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: Option<Uuid>,
    pub phase: SessionPhase,
    pub layout: Option<Layout>,
    pub orientation: Option<Orientation>,
    pub photo_count: usize,
    pub max_capture_photos: usize,
    pub final_photos_needed: usize,
    pub capture_complete: bool,
    pub selection_complete: bool,
    pub selected_photos: Vec<usize>,
    pub created_at: Option<DateTime<Utc>>,
    /// Captured frames, exposed only once capture is complete so a client
    /// can render the selection grid.
    #[serde(skip)]
    pub photos: Vec<Frame>,
}

impl SessionStatus {
    pub fn empty() -> Self {
        Self {
            session_id: None,
            phase: SessionPhase::Empty,
            layout: None,
            orientation: None,
            photo_count: 0,
            max_capture_photos: 0,
            final_photos_needed: 0,
            capture_complete: false,
            selection_complete: false,
            selected_photos: Vec::new(),
            created_at: None,
            photos: Vec::new(),
        }
    }

    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }
}

impl From<&Session> for SessionStatus {
    fn from(session: &Session) -> Self {
        let limits = session.limits();
        Self {
            session_id: Some(session.id),
            phase: session.phase(),
            layout: Some(session.layout),
            orientation: Some(session.orientation),
            photo_count: session.photos.len(),
            max_capture_photos: limits.max_capture_photos,
            final_photos_needed: limits.final_photos_needed,
            capture_complete: session.capture_complete,
            selection_complete: session.selection_complete,
            selected_photos: session.selected.clone(),
            created_at: Some(session.created_at),
            photos: if session.capture_complete {
                session.photos.clone()
            } else {
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frame() -> Frame {
        Arc::new(DynamicImage::ImageRgb8(RgbImage::new(4, 3)))
    }

    fn filled(layout: Layout) -> Session {
        let mut session = Session::new(layout, Orientation::Portrait);
        for _ in 0..layout.capture_limit() {
            session.push_photo(frame());
        }
        session
    }

    #[test]
    fn test_new_session_is_capturing() {
        let session = Session::new(Layout::Quad, Orientation::Landscape);
        assert_eq!(session.phase(), SessionPhase::Capturing);
        assert_eq!(session.photo_count(), 0);
        assert!(session.ensure_capturing().is_ok());
    }

    #[test]
    fn test_push_photo_reaches_quota_on_last_capture() {
        let mut session = Session::new(Layout::Double, Orientation::Portrait);
        for _ in 0..3 {
            assert!(!session.push_photo(frame()));
        }
        assert!(session.push_photo(frame()));
        assert_eq!(session.phase(), SessionPhase::AwaitingSelection);
    }

    #[test]
    fn test_validate_selection_reasons() {
        let session = filled(Layout::Double);

        let err = session.validate_selection(&[0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            BoothError::InvalidSelection {
                reason: SelectionError::WrongCount { expected: 2, actual: 3 }
            }
        ));

        let err = session.validate_selection(&[0, 4]).unwrap_err();
        assert!(matches!(
            err,
            BoothError::InvalidSelection {
                reason: SelectionError::OutOfRange { index: 4, photo_count: 4 }
            }
        ));

        let err = session.validate_selection(&[3, 3]).unwrap_err();
        assert!(matches!(
            err,
            BoothError::InvalidSelection {
                reason: SelectionError::Duplicate { index: 3 }
            }
        ));

        assert!(session.validate_selection(&[3, 0]).is_ok());
    }

    #[test]
    fn test_selected_photos_follow_selection_order() {
        let mut session = Session::new(Layout::Double, Orientation::Portrait);
        let frames: Vec<Frame> = (0..4).map(|_| frame()).collect();
        for f in &frames {
            session.push_photo(Arc::clone(f));
        }
        session.record_selection(vec![2, 0]);

        let picked = session.selected_photos();
        assert!(Arc::ptr_eq(&picked[0], &frames[2]));
        assert!(Arc::ptr_eq(&picked[1], &frames[0]));
        assert_eq!(session.phase(), SessionPhase::AwaitingFinalize);
    }

    #[test]
    fn test_status_hides_photos_until_capture_complete() {
        let mut session = Session::new(Layout::Double, Orientation::Portrait);
        session.push_photo(frame());
        let status = SessionStatus::from(&session);
        assert_eq!(status.photo_count, 1);
        assert!(status.photos.is_empty());

        let status = SessionStatus::from(&filled(Layout::Double));
        assert_eq!(status.photos.len(), 4);
        assert_eq!(status.final_photos_needed, 2);
    }
}
