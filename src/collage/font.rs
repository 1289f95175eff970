//! Font resolution for the timestamp overlay.
//!
//! An outline font is loaded from the configured path or a well-known
//! system location. When none can be loaded the built-in bitmap face is
//! used instead, so text rendering never fails.

use std::fmt;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use log::{debug, info, warn};

use crate::error::{BoothError, Result};

/// Pixel size the timestamp is rendered at
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Largest pixel size a face is built at; larger requests are clamped
pub const MAX_FONT_SIZE: f32 = 512.0;

const SYSTEM_FONT_PATHS: [&str; 4] = [
    "arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Built-in glyph cell: 5 columns by 7 rows, one column of spacing
const GLYPH_COLS: u32 = 5;
const GLYPH_ROWS: u32 = 7;
const GLYPH_ADVANCE: u32 = GLYPH_COLS + 1;

/// A face that can measure and draw a single line of text
pub enum Typeface {
    Outline { font: FontVec, scale: PxScale },
    Bitmap { pixel: u32 },
}

impl fmt::Debug for Typeface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Typeface::Outline { scale, .. } => f
                .debug_struct("Outline")
                .field("scale", &scale.y)
                .finish_non_exhaustive(),
            Typeface::Bitmap { pixel } => f.debug_struct("Bitmap").field("pixel", pixel).finish(),
        }
    }
}

impl Typeface {
    /// Load an outline font from a TTF/OTF file.
    pub fn from_path(path: &Path, size: f32) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| BoothError::Config {
            origin: path.display().to_string(),
            reason: format!("cannot read font: {}", e),
        })?;
        let font = FontVec::try_from_vec(data).map_err(|_| BoothError::Config {
            origin: path.display().to_string(),
            reason: "not a valid font file".to_string(),
        })?;

        Ok(Typeface::Outline {
            font,
            scale: PxScale::from(clamp_size(size)),
        })
    }

    /// The built-in bitmap face scaled to roughly `size` pixels tall
    pub fn builtin(size: f32) -> Self {
        let pixel = (clamp_size(size) / (GLYPH_ROWS + 1) as f32).round().max(1.0) as u32;
        Typeface::Bitmap { pixel }
    }

    /// Try `preferred`, then the system font paths, then fall back to the
    /// built-in face.
    pub fn resolve(preferred: Option<&Path>, size: f32) -> Self {
        if let Some(path) = preferred {
            match Self::from_path(path, size) {
                Ok(face) => {
                    info!("Loaded font: {}", path.display());
                    return face;
                }
                Err(e) => warn!("Configured font unusable, trying system fonts: {}", e),
            }
        }

        for candidate in SYSTEM_FONT_PATHS {
            if let Ok(face) = Self::from_path(Path::new(candidate), size) {
                info!("Loaded system font: {}", candidate);
                return face;
            }
        }

        debug!("No outline font found, using built-in bitmap font");
        Self::builtin(size)
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Typeface::Bitmap { .. })
    }

    /// Width and height of the rendered text's bounding box
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            Typeface::Outline { font, scale } => text_size(*scale, font, text),
            Typeface::Bitmap { pixel } => {
                let chars = text.chars().count() as u32;
                if chars == 0 {
                    return (0, 0);
                }
                let columns = chars.saturating_mul(GLYPH_ADVANCE) - 1;
                (columns.saturating_mul(*pixel), GLYPH_ROWS * pixel)
            }
        }
    }

    /// Draw `text` with its top-left corner at `(x, y)`, clipped to the canvas
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        match self {
            Typeface::Outline { font, scale } => {
                draw_text_mut(canvas, color, x, y, *scale, font, text);
            }
            Typeface::Bitmap { pixel } => draw_bitmap_text(canvas, x, y, text, *pixel, color),
        }
    }
}

fn clamp_size(size: f32) -> f32 {
    if size.is_finite() {
        size.clamp(1.0, MAX_FONT_SIZE)
    } else {
        DEFAULT_FONT_SIZE
    }
}

fn draw_bitmap_text(canvas: &mut RgbImage, x: i32, y: i32, text: &str, pixel: u32, color: Rgb<u8>) {
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    let pixel = pixel as i64;

    for (i, c) in text.chars().enumerate() {
        let Some(rows) = glyph(c) else { continue };
        let origin_x = x as i64 + i as i64 * GLYPH_ADVANCE as i64 * pixel;

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_COLS {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let block_x = origin_x + col as i64 * pixel;
                let block_y = y as i64 + row as i64 * pixel;
                for py in block_y.max(0)..(block_y + pixel).min(height) {
                    for px in block_x.max(0)..(block_x + pixel).min(width) {
                        canvas.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

/// 5x7 rows for the characters a timestamp can contain; bit 4 is the
/// leftmost column. Unknown characters render as blank space.
fn glyph(c: char) -> Option<[u8; 7]> {
    let rows = match c {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        _ => return None,
    };
    Some(rows)
}
