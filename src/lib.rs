//! Snapbooth - Guided Photo-Booth Engine
//!
//! Snapbooth runs a photo-booth session: capture a burst of photos, pick a
//! subset, and composite the pick into a single collage.
//!
//! # Architecture
//!
//! - `session`: the lock-guarded session state machine and its event fan-out
//! - `collage`: the pure collage composer (layout geometry, timestamp band, JPEG)
//! - `capture`: frame sources and blob stores the session talks to
//!
//! Transport (HTTP, WebSocket) and camera drivers live outside this crate and
//! plug in through the `FrameSource` and `BlobStore` traits.

pub mod capture;
pub mod cli;
pub mod collage;
pub mod config;
pub mod error;
pub mod session;

pub use capture::{BlobStore, FrameSource};
pub use collage::CollageComposer;
pub use config::BoothConfig;
pub use error::{BoothError, Result};
pub use session::{Layout, Orientation, SessionController};
