//! Timestamp band drawn along the bottom of every collage.

use image::{imageops, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

use crate::collage::font::Typeface;

/// Format of the rendered timestamp
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOTTOM_MARGIN: i64 = 20;
const BAND_PADDING: i64 = 10;
const BAND_RADIUS: u32 = 8;
const BAND_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Half-open rectangle `[left, right) x [top, bottom)` in canvas pixels;
/// may extend past the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

/// Text origin and backing band for text of size `text` on a canvas
pub fn band_layout(canvas: (u32, u32), text: (u32, u32)) -> ((i64, i64), BandRect) {
    let (canvas_w, canvas_h) = (canvas.0 as i64, canvas.1 as i64);
    let (text_w, text_h) = (text.0 as i64, text.1 as i64);

    let text_x = (canvas_w - text_w).div_euclid(2);
    let text_y = canvas_h - text_h - BOTTOM_MARGIN;
    let band = BandRect {
        left: text_x - BAND_PADDING,
        top: text_y - BAND_PADDING,
        right: text_x + text_w + BAND_PADDING,
        bottom: text_y + text_h + BAND_PADDING,
    };
    ((text_x, text_y), band)
}

/// Draw `text` centred near the bottom edge on a translucent rounded band.
pub fn draw_timestamp(canvas: &mut RgbImage, text: &str, typeface: &Typeface) {
    let measured = typeface.measure(text);
    let ((text_x, text_y), band) = band_layout(canvas.dimensions(), measured);

    fill_rounded_band(canvas, band, BAND_RADIUS, BAND_COLOR);
    typeface.draw(canvas, text_x as i32, text_y as i32, text, TEXT_COLOR);
}

/// Composite a rounded translucent rectangle over the part of `canvas` it covers.
fn fill_rounded_band(canvas: &mut RgbImage, rect: BandRect, radius: u32, color: Rgba<u8>) {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    let (left, top) = (rect.left.max(0), rect.top.max(0));
    let (right, bottom) = (rect.right.min(canvas_w), rect.bottom.min(canvas_h));
    if right <= left || bottom <= top {
        return;
    }

    let band = rounded_rect(
        (rect.right - rect.left) as u32,
        (rect.bottom - rect.top) as u32,
        radius,
        color,
    );

    // Only the covered patch goes through RGBA.
    let patch = imageops::crop_imm(
        &*canvas,
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    )
    .to_image();
    let mut patch = DynamicImage::ImageRgb8(patch).into_rgba8();
    imageops::overlay(&mut patch, &band, rect.left - left, rect.top - top);
    imageops::replace(canvas, &DynamicImage::ImageRgba8(patch).into_rgb8(), left, top);
}

/// A `width` x `height` transparent image holding a filled rounded rectangle
fn rounded_rect(width: u32, height: u32, radius: u32, color: Rgba<u8>) -> RgbaImage {
    let mut band = RgbaImage::new(width, height);
    let r = radius.min(width / 2).min(height / 2);

    if width > 2 * r {
        draw_filled_rect_mut(&mut band, Rect::at(r as i32, 0).of_size(width - 2 * r, height), color);
    }
    if height > 2 * r {
        draw_filled_rect_mut(&mut band, Rect::at(0, r as i32).of_size(width, height - 2 * r), color);
    }
    if r > 0 {
        let (near_x, near_y) = (r as i32, r as i32);
        let (far_x, far_y) = ((width - 1 - r) as i32, (height - 1 - r) as i32);
        for center in [(near_x, near_y), (far_x, near_y), (near_x, far_y), (far_x, far_y)] {
            draw_filled_circle_mut(&mut band, center, r as i32, color);
        }
    }
    band
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Half-transparent black over white, give or take float rounding
    fn assert_mid_grey(pixel: &Rgb<u8>) {
        assert!(
            pixel.0.iter().all(|&c| (126..=128).contains(&c)),
            "expected mid grey, got {:?}",
            pixel
        );
    }

    #[test]
    fn test_band_layout_centres_text() {
        let ((x, y), band) = band_layout((640, 960), (339, 21));
        assert_eq!((x, y), (150, 919));
        assert_eq!(
            band,
            BandRect {
                left: 140,
                top: 909,
                right: 499,
                bottom: 950
            }
        );
    }

    #[test]
    fn test_band_layout_wider_than_canvas() {
        let ((x, _), band) = band_layout((100, 100), (121, 10));
        assert_eq!(x, -11);
        assert!(band.left < 0 && band.right > 100);
    }

    #[test]
    fn test_band_darkens_but_keeps_corners() {
        let mut canvas = RgbImage::from_pixel(60, 40, Rgb([255, 255, 255]));
        let rect = BandRect {
            left: 10,
            top: 10,
            right: 50,
            bottom: 30,
        };
        fill_rounded_band(&mut canvas, rect, 8, BAND_COLOR);

        assert_mid_grey(canvas.get_pixel(30, 20));
        assert_mid_grey(canvas.get_pixel(10, 20));
        assert_mid_grey(canvas.get_pixel(30, 10));
        // The exact corner is outside the rounded outline.
        assert_eq!(*canvas.get_pixel(10, 10), Rgb([255, 255, 255]));
        // Outside the band is untouched.
        assert_eq!(*canvas.get_pixel(5, 5), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_band_past_canvas_edges_is_clipped() {
        let mut canvas = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        let rect = BandRect {
            left: -15,
            top: 5,
            right: 35,
            bottom: 25,
        };
        fill_rounded_band(&mut canvas, rect, 8, BAND_COLOR);

        assert_mid_grey(canvas.get_pixel(0, 10));
        assert_mid_grey(canvas.get_pixel(19, 19));
        assert_eq!(*canvas.get_pixel(0, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn test_draw_timestamp_with_builtin_font() {
        let mut canvas = RgbImage::from_pixel(400, 200, Rgb([255, 255, 255]));
        let face = Typeface::builtin(24.0);
        draw_timestamp(&mut canvas, "2024-05-17 14:03:09", &face);

        // Text box is 339x21 at (30, 159); the band adds 10px on each side.
        assert_mid_grey(canvas.get_pixel(22, 170));
        assert_eq!(*canvas.get_pixel(22, 100), Rgb([255, 255, 255]));
        let white_text = canvas
            .enumerate_pixels()
            .filter(|(x, y, p)| (30..369).contains(x) && (159..180).contains(y) && p.0 == [255, 255, 255])
            .count();
        assert!(white_text > 0);
    }

    #[test]
    fn test_band_hugs_outline_text() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/DejaVuSansMono.ttf");
        let face = Typeface::from_path(&path, 24.0).unwrap();
        let text = "2024-05-17 14:03:09";
        let mut canvas = RgbImage::from_pixel(600, 200, Rgb([255, 255, 255]));
        draw_timestamp(&mut canvas, text, &face);

        let (_, band) = band_layout((600, 200), face.measure(text));
        assert_eq!(band.bottom, 200 - 20 + 10);
        let mid_y = ((band.top + band.bottom) / 2) as u32;
        assert_mid_grey(canvas.get_pixel(band.left as u32 + 2, mid_y));
        assert_mid_grey(canvas.get_pixel(band.right as u32 - 3, mid_y));
        assert_eq!(*canvas.get_pixel(band.left as u32 - 2, mid_y), Rgb([255, 255, 255]));
        assert_eq!(*canvas.get_pixel(band.right as u32 + 1, mid_y), Rgb([255, 255, 255]));
    }
}
