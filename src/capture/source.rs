//! Frame sources
//!
//! `DirectoryFrameSource` replays image files from disk, which stands in for
//! a camera on machines without one. `SyntheticFrameSource` generates solid
//! numbered frames for tests and demos.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::{DynamicImage, Rgb, RgbImage};
use log::{debug, info};
use walkdir::WalkDir;

use crate::capture::FrameSource;
use crate::error::{BoothError, Result};

/// Extensions the directory source will pick up
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Colours cycled through by the synthetic source
const SYNTHETIC_PALETTE: [[u8; 3]; 6] = [
    [220, 60, 60],
    [60, 170, 80],
    [60, 90, 210],
    [230, 180, 40],
    [150, 70, 190],
    [40, 180, 190],
];

/// Replays the image files in a directory, in filename order, wrapping
/// around at the end.
#[derive(Debug)]
pub struct DirectoryFrameSource {
    files: Vec<PathBuf>,
    cursor: Mutex<usize>,
    mirror: bool,
}

impl DirectoryFrameSource {
    /// Scan `dir` (non-recursively) for images.
    ///
    /// # Errors
    /// * `FrameUnavailable` - if the directory holds no usable images
    pub fn open(dir: &Path, mirror: bool) -> Result<Self> {
        if !dir.is_dir() {
            return Err(BoothError::FrameUnavailable {
                reason: format!("{} is not a directory", dir.display()),
            });
        }

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.path().to_path_buf())
            .filter(|path| is_image_file(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(BoothError::FrameUnavailable {
                reason: format!("no images found in {}", dir.display()),
            });
        }

        info!("Frame source: {} images from {}", files.len(), dir.display());
        Ok(Self {
            files,
            cursor: Mutex::new(0),
            mirror,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&self) -> Result<DynamicImage> {
        let path = {
            let mut cursor = self.cursor.lock().unwrap_or_else(|p| p.into_inner());
            let path = self.files[*cursor % self.files.len()].clone();
            *cursor = (*cursor + 1) % self.files.len();
            path
        };

        debug!("Reading frame {}", path.display());
        let frame = image::open(&path).map_err(|e| BoothError::FrameUnavailable {
            reason: format!("failed to decode {}: {}", path.display(), e),
        })?;

        // Selfie view: the camera preview is mirrored, so stored frames are too.
        Ok(if self.mirror { frame.fliph() } else { frame })
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Generates solid-colour frames of a fixed size, one colour per shot.
#[derive(Debug)]
pub struct SyntheticFrameSource {
    width: u32,
    height: u32,
    produced: Mutex<usize>,
}

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            produced: Mutex::new(0),
        }
    }

    /// Colour used for the `n`th frame
    pub fn color_for(n: usize) -> Rgb<u8> {
        Rgb(SYNTHETIC_PALETTE[n % SYNTHETIC_PALETTE.len()])
    }

    pub fn frames_produced(&self) -> usize {
        *self.produced.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for SyntheticFrameSource {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

impl FrameSource for SyntheticFrameSource {
    fn next_frame(&self) -> Result<DynamicImage> {
        if self.width == 0 || self.height == 0 {
            return Err(BoothError::FrameUnavailable {
                reason: format!("invalid frame size {}x{}", self.width, self.height),
            });
        }

        let mut produced = self.produced.lock().unwrap_or_else(|p| p.into_inner());
        let color = Self::color_for(*produced);
        *produced += 1;

        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            self.width,
            self.height,
            color,
        )))
    }
}
