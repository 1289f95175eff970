//! Capture Collaborators
//!
//! The session core pulls frames from a [`FrameSource`] and hands finished
//! collages to a [`BlobStore`]. Concrete implementations for directories of
//! images, synthetic test frames, the filesystem and memory live here.

pub mod source;
pub mod store;

use chrono::{DateTime, TimeZone};
use image::DynamicImage;
use uuid::Uuid;

use crate::error::Result;

pub use source::{DirectoryFrameSource, SyntheticFrameSource};
pub use store::{FsBlobStore, MemoryBlobStore, StoredPhoto};

/// Something that can produce one decoded camera frame per call.
///
/// Implementations may serialize access internally; the controller only
/// needs one frame or a `FrameUnavailable` error.
pub trait FrameSource: Send + Sync {
    fn next_frame(&self) -> Result<DynamicImage>;
}

/// Destination for encoded collages.
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` and return the generated filename
    fn save(&self, bytes: &[u8]) -> Result<String>;
}

/// Build a filename of the form `photo_YYYYMMDD_HHMMSS_<8 hex>.jpg`
pub fn generate_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let suffix = Uuid::new_v4().simple().to_string();
    format!("photo_{}_{}.jpg", now.format("%Y%m%d_%H%M%S"), &suffix[..8])
}
