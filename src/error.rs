//! Error handling for Snapbooth
//!
//! Every error is surfaced synchronously from the operation that detected it.

use std::fmt;
use thiserror::Error;

use crate::session::Layout;

/// Result type alias for Snapbooth operations
pub type Result<T> = std::result::Result<T, BoothError>;

/// Which state-machine precondition a call violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// No session has been created, or it was finalized or reset
    NoActiveSession,
    /// Capture quota already reached; the session is waiting for a selection
    CaptureAlreadyComplete,
    /// Selection attempted before the capture quota was reached
    CaptureNotComplete,
    /// Selection was already recorded for this session
    SelectionAlreadyComplete,
    /// Finalize attempted before a selection was recorded
    SelectionNotComplete,
}

impl fmt::Display for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::NoActiveSession => write!(f, "no active session"),
            Precondition::CaptureAlreadyComplete => write!(f, "capture already complete"),
            Precondition::CaptureNotComplete => write!(f, "capture not complete"),
            Precondition::SelectionAlreadyComplete => write!(f, "selection already complete"),
            Precondition::SelectionNotComplete => write!(f, "selection not complete"),
        }
    }
}

/// Why a photo selection was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionError {
    WrongCount { expected: usize, actual: usize },
    OutOfRange { index: usize, photo_count: usize },
    Duplicate { index: usize },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::WrongCount { expected, actual } => {
                write!(f, "must select exactly {} photos, got {}", expected, actual)
            }
            SelectionError::OutOfRange { index, photo_count } => write!(
                f,
                "photo index {} is out of range (0..{})",
                index, photo_count
            ),
            SelectionError::Duplicate { index } => {
                write!(f, "photo index {} selected more than once", index)
            }
        }
    }
}

/// Main error type for Snapbooth operations
#[derive(Error, Debug)]
pub enum BoothError {
    // State Machine Errors
    #[error("Precondition not met: {which}")]
    PreconditionNotMet { which: Precondition },

    #[error("Invalid selection: {reason}")]
    InvalidSelection { reason: SelectionError },

    // Composition Errors
    #[error("No images provided for the collage")]
    EmptyInput,

    #[error("{layout} layout cannot compose {actual} images (limit {max})")]
    ImageCountMismatch {
        layout: Layout,
        max: usize,
        actual: usize,
    },

    #[error("Image {index} has a zero dimension")]
    DegenerateImage { index: usize },

    #[error("Collage canvas {width}x{height} exceeds {max} pixels per side")]
    CanvasTooLarge { width: u64, height: u64, max: u32 },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    // Collaborator Errors
    #[error("Frame unavailable: {reason}")]
    FrameUnavailable { reason: String },

    #[error("Failed to persist composite: {reason}")]
    PersistFailure {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Photo not found: {name}")]
    PhotoNotFound { name: String },

    // Configuration Errors
    #[error("Invalid configuration ({origin}): {reason}")]
    Config { origin: String, reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BoothError {
    pub(crate) fn precondition(which: Precondition) -> Self {
        BoothError::PreconditionNotMet { which }
    }

    pub(crate) fn selection(reason: SelectionError) -> Self {
        BoothError::InvalidSelection { reason }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            BoothError::PreconditionNotMet { .. } => "PRECONDITION_NOT_MET",
            BoothError::InvalidSelection { .. } => "INVALID_SELECTION",
            BoothError::EmptyInput => "EMPTY_INPUT",
            BoothError::ImageCountMismatch { .. } => "IMAGE_COUNT_MISMATCH",
            BoothError::DegenerateImage { .. } => "DEGENERATE_IMAGE",
            BoothError::CanvasTooLarge { .. } => "CANVAS_TOO_LARGE",
            BoothError::Image(_) => "IMAGE_ERROR",
            BoothError::FrameUnavailable { .. } => "FRAME_UNAVAILABLE",
            BoothError::PersistFailure { .. } => "PERSIST_FAILURE",
            BoothError::PhotoNotFound { .. } => "PHOTO_NOT_FOUND",
            BoothError::Config { .. } => "CONFIG_ERROR",
            BoothError::Io(_) => "IO_ERROR",
        }
    }

    /// Check if the caller can recover by retrying or correcting the request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BoothError::PreconditionNotMet { .. }
                | BoothError::InvalidSelection { .. }
                | BoothError::FrameUnavailable { .. }
                | BoothError::PersistFailure { .. }
        )
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            BoothError::PreconditionNotMet { which } => Some(match which {
                Precondition::NoActiveSession => "Create a session first.",
                Precondition::CaptureAlreadyComplete => "Select photos to continue.",
                Precondition::CaptureNotComplete => "Keep capturing until the quota is reached.",
                Precondition::SelectionAlreadyComplete => "Finalize the session to continue.",
                Precondition::SelectionNotComplete => "Select photos before finalizing.",
            }),
            BoothError::InvalidSelection { .. } => {
                Some("Pick the required number of distinct photos from the captured set.")
            }
            BoothError::FrameUnavailable { .. } => Some("Check the camera and try capturing again."),
            BoothError::PersistFailure { .. } => {
                Some("Check free space and permissions on the photos directory, then finalize again.")
            }
            BoothError::CanvasTooLarge { .. } => {
                Some("Crop photos with extreme aspect ratios before composing.")
            }
            BoothError::Config { .. } => Some("Fix the configuration value and restart."),
            _ => None,
        }
    }
}
