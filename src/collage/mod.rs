//! Collage Composition
//!
//! Turns an ordered list of photos into one fixed-layout collage with a
//! timestamp band. Composition is pure: the same images, layout,
//! orientation and timestamp always produce the same pixels.

pub mod font;
pub mod geometry;
pub mod overlay;

use std::borrow::Borrow;
use std::io::Cursor;

use chrono::NaiveDateTime;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};

use crate::config::BoothConfig;
use crate::error::Result;
use crate::session::{Layout, Orientation};

pub use font::{Typeface, DEFAULT_FONT_SIZE, MAX_FONT_SIZE};
pub use geometry::{CanvasPlan, GridSpec, Placement, CANVAS_BACKGROUND, MAX_CANVAS_SIDE};
pub use overlay::TIMESTAMP_FORMAT;

/// JPEG quality used when nothing else is configured
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Composes collages with a fixed typeface for the timestamp.
///
/// Holds no mutable state; share it freely across threads.
#[derive(Debug)]
pub struct CollageComposer {
    typeface: Typeface,
    quality: u8,
}

impl Default for CollageComposer {
    fn default() -> Self {
        Self::new(Typeface::resolve(None, DEFAULT_FONT_SIZE))
    }
}

impl CollageComposer {
    pub fn new(typeface: Typeface) -> Self {
        Self {
            typeface,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Composer using the built-in bitmap font, independent of installed fonts
    pub fn with_builtin_font() -> Self {
        Self::new(Typeface::builtin(DEFAULT_FONT_SIZE))
    }

    pub fn from_config(config: &BoothConfig) -> Self {
        let typeface = Typeface::resolve(config.font_path.as_deref(), config.font_size);
        Self::new(typeface).with_quality(config.photo_quality)
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn typeface(&self) -> &Typeface {
        &self.typeface
    }

    /// Lay out `images` for `layout` and stamp `timestamp` across the bottom.
    ///
    /// # Errors
    /// * `EmptyInput` - `images` is empty
    /// * `ImageCountMismatch` - too many images for the layout (double needs exactly two)
    /// * `DegenerateImage` - an image has zero width or height
    pub fn compose<I: Borrow<DynamicImage>>(
        &self,
        images: &[I],
        layout: Layout,
        orientation: Orientation,
        timestamp: NaiveDateTime,
    ) -> Result<RgbImage> {
        let _span = tracing::debug_span!(
            "compose",
            layout = layout.as_str(),
            orientation = orientation.as_str(),
            count = images.len()
        )
        .entered();

        let dims: Vec<(u32, u32)> = images
            .iter()
            .map(|image| {
                let image = image.borrow();
                (image.width(), image.height())
            })
            .collect();
        let plan = geometry::plan(layout, orientation, &dims)?;

        // Double keeps each photo's aspect, grids squash to the cell.
        let filter = match layout {
            Layout::Double => FilterType::CatmullRom,
            Layout::Quad | Layout::Strip => FilterType::Lanczos3,
        };

        let mut canvas = RgbImage::from_pixel(plan.width, plan.height, CANVAS_BACKGROUND);
        for (image, placement) in images.iter().zip(&plan.placements) {
            let rgb = image.borrow().to_rgb8();
            let tile = if rgb.dimensions() == (placement.width, placement.height) {
                rgb
            } else {
                imageops::resize(&rgb, placement.width, placement.height, filter)
            };
            imageops::replace(&mut canvas, &tile, placement.x as i64, placement.y as i64);
        }

        let text = timestamp.format(TIMESTAMP_FORMAT).to_string();
        overlay::draw_timestamp(&mut canvas, &text, &self.typeface);

        Ok(canvas)
    }

    /// [`compose`](Self::compose) followed by JPEG encoding at the configured quality
    pub fn compose_jpeg<I: Borrow<DynamicImage>>(
        &self,
        images: &[I],
        layout: Layout,
        orientation: Orientation,
        timestamp: NaiveDateTime,
    ) -> Result<Vec<u8>> {
        let canvas = self.compose(images, layout, orientation, timestamp)?;
        encode_jpeg(&canvas, self.quality)
    }
}

/// Encode an RGB image as JPEG
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(image)?;
    Ok(bytes.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoothError;
    use chrono::NaiveDate;
    use image::Rgb;

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)))
    }

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 17)
            .unwrap()
            .and_hms_opt(14, 3, 9)
            .unwrap()
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = CollageComposer::with_builtin_font();
        let images = vec![solid(64, 48, [200, 0, 0]), solid(64, 48, [0, 0, 200])];

        let a = composer
            .compose(&images, Layout::Double, Orientation::Landscape, fixed_time())
            .unwrap();
        let b = composer
            .compose(&images, Layout::Double, Orientation::Landscape, fixed_time())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_compose_places_images_in_order() {
        let composer = CollageComposer::with_builtin_font();
        let images = vec![
            solid(40, 30, [255, 0, 0]),
            solid(40, 30, [0, 255, 0]),
            solid(40, 30, [0, 0, 255]),
            solid(40, 30, [255, 255, 0]),
        ];
        let canvas = composer
            .compose(&images, Layout::Quad, Orientation::Landscape, fixed_time())
            .unwrap();

        assert_eq!(canvas.dimensions(), (860, 660));
        assert_eq!(*canvas.get_pixel(220, 170), Rgb([255, 0, 0]));
        assert_eq!(*canvas.get_pixel(640, 170), Rgb([0, 255, 0]));
        assert_eq!(*canvas.get_pixel(220, 400), Rgb([0, 0, 255]));
        assert_eq!(*canvas.get_pixel(640, 400), Rgb([255, 255, 0]));
        // Gap between cells is background.
        assert_eq!(*canvas.get_pixel(430, 100), CANVAS_BACKGROUND);
    }

    #[test]
    fn test_compose_rejects_empty() {
        let composer = CollageComposer::with_builtin_font();
        let images: Vec<DynamicImage> = Vec::new();
        assert!(matches!(
            composer.compose(&images, Layout::Strip, Orientation::Portrait, fixed_time()),
            Err(BoothError::EmptyInput)
        ));
    }

    #[test]
    fn test_compose_jpeg_decodes_back_to_canvas_size() {
        let composer = CollageComposer::with_builtin_font().with_quality(80);
        let images = vec![solid(32, 32, [10, 20, 30]); 3];
        let bytes = composer
            .compose_jpeg(&images, Layout::Strip, Orientation::Landscape, fixed_time())
            .unwrap();

        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (875, 605));
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(CollageComposer::with_builtin_font().with_quality(0).quality(), 1);
        assert_eq!(CollageComposer::with_builtin_font().with_quality(200).quality(), 100);
    }
}
