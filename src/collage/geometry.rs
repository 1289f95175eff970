//! Canvas geometry for each collage layout.
//!
//! Everything here is integer arithmetic on image dimensions; no pixels are
//! touched. The composer turns a [`CanvasPlan`] into an image.

use image::Rgb;

use crate::error::{BoothError, Result};
use crate::session::{Layout, Orientation};

/// Canvas fill behind and between photos
pub const CANVAS_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Gap around and between the two photos of a double layout
pub const DOUBLE_GAP: u32 = 20;

/// Height (landscape) or width (portrait) each double-layout photo is scaled to
pub const DOUBLE_TARGET: u32 = 600;

/// Largest canvas side a plan may ask for
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Where one photo goes on the canvas, and the size it is resized to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Canvas size plus one placement per input image, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanvasPlan {
    pub width: u32,
    pub height: u32,
    pub placements: Vec<Placement>,
}

/// A fixed-cell grid used by the quad and strip layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub cell_width: u32,
    pub cell_height: u32,
    pub cols: u32,
    pub rows: u32,
    pub gap: u32,
}

impl GridSpec {
    /// Grid for a layout, or `None` for the double layout which has no grid
    pub fn for_layout(layout: Layout, orientation: Orientation) -> Option<Self> {
        let spec = match (layout, orientation) {
            (Layout::Double, _) => return None,
            (Layout::Quad, Orientation::Landscape) => GridSpec {
                cell_width: 400,
                cell_height: 300,
                cols: 2,
                rows: 2,
                gap: 20,
            },
            (Layout::Quad, Orientation::Portrait) => GridSpec {
                cell_width: 350,
                cell_height: 250,
                cols: 1,
                rows: 4,
                gap: 15,
            },
            (Layout::Strip, Orientation::Portrait) => GridSpec {
                cell_width: 280,
                cell_height: 200,
                cols: 2,
                rows: 4,
                gap: 15,
            },
            (Layout::Strip, Orientation::Landscape) => GridSpec {
                cell_width: 200,
                cell_height: 280,
                cols: 4,
                rows: 2,
                gap: 15,
            },
        };
        Some(spec)
    }

    pub fn capacity(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    pub fn canvas_size(&self) -> Result<(u32, u32)> {
        let side = |cell: u32, count: u32| {
            u64::from(cell) * u64::from(count) + u64::from(self.gap) * (u64::from(count) + 1)
        };
        fit_canvas(side(self.cell_width, self.cols), side(self.cell_height, self.rows))
    }

    /// Top-left corner of a cell, filling row-major
    pub fn cell_origin(&self, slot: usize) -> (u32, u32) {
        let slot = slot as u32;
        let (row, col) = (slot / self.cols, slot % self.cols);
        (
            self.gap + col * (self.cell_width + self.gap),
            self.gap + row * (self.cell_height + self.gap),
        )
    }

    /// Plan for `count` images; cells past `count` stay empty
    pub fn plan(&self, count: usize) -> Result<CanvasPlan> {
        let (width, height) = self.canvas_size()?;
        let placements = (0..count.min(self.capacity()))
            .map(|slot| {
                let (x, y) = self.cell_origin(slot);
                Placement {
                    x,
                    y,
                    width: self.cell_width,
                    height: self.cell_height,
                }
            })
            .collect();

        Ok(CanvasPlan {
            width,
            height,
            placements,
        })
    }
}

/// Narrow a planned canvas size, rejecting anything past [`MAX_CANVAS_SIDE`]
fn fit_canvas(width: u64, height: u64) -> Result<(u32, u32)> {
    let max = u64::from(MAX_CANVAS_SIDE);
    if width > max || height > max {
        return Err(BoothError::CanvasTooLarge {
            width,
            height,
            max: MAX_CANVAS_SIDE,
        });
    }
    Ok((width as u32, height as u32))
}

/// Scale `(width, height)` so one side equals `target`, keeping aspect ratio.
///
/// The other side is truncated, never below one pixel.
pub fn scale_keep_aspect(width: u32, height: u32, target: u32, fix_height: bool) -> (u32, u32) {
    if fix_height {
        let ratio = width as f64 / height as f64;
        (((target as f64 * ratio) as u32).max(1), target)
    } else {
        let ratio = height as f64 / width as f64;
        (target, ((target as f64 * ratio) as u32).max(1))
    }
}

/// Two photos side by side (landscape) or stacked (portrait)
fn plan_double(
    first: (u32, u32),
    second: (u32, u32),
    orientation: Orientation,
) -> Result<CanvasPlan> {
    let gap = DOUBLE_GAP;
    let fix_height = orientation == Orientation::Landscape;
    let (w1, h1) = scale_keep_aspect(first.0, first.1, DOUBLE_TARGET, fix_height);
    let (w2, h2) = scale_keep_aspect(second.0, second.1, DOUBLE_TARGET, fix_height);

    // Scaled sides saturate at u32::MAX, so sum them wide.
    let along = |a: u32, b: u32| u64::from(a) + u64::from(b) + u64::from(gap) * 3;
    let across = u64::from(DOUBLE_TARGET + gap * 2);

    let plan = match orientation {
        Orientation::Landscape => {
            let (width, height) = fit_canvas(along(w1, w2), across)?;
            CanvasPlan {
                width,
                height,
                placements: vec![
                    Placement { x: gap, y: gap, width: w1, height: h1 },
                    Placement { x: w1 + gap * 2, y: gap, width: w2, height: h2 },
                ],
            }
        }
        Orientation::Portrait => {
            let (width, height) = fit_canvas(across, along(h1, h2))?;
            CanvasPlan {
                width,
                height,
                placements: vec![
                    Placement { x: gap, y: gap, width: w1, height: h1 },
                    Placement { x: gap, y: h1 + gap * 2, width: w2, height: h2 },
                ],
            }
        }
    };
    Ok(plan)
}

/// Validate the input dimensions and lay them out for `layout`.
///
/// # Errors
/// * `EmptyInput` - no images
/// * `ImageCountMismatch` - more images than the layout's final limit, or
///   anything but exactly two for the double layout
/// * `DegenerateImage` - an image with zero width or height
/// * `CanvasTooLarge` - the scaled photos need a side past [`MAX_CANVAS_SIDE`]
pub fn plan(layout: Layout, orientation: Orientation, dims: &[(u32, u32)]) -> Result<CanvasPlan> {
    if dims.is_empty() {
        return Err(BoothError::EmptyInput);
    }

    let max = layout.final_limit();
    let count_ok = match layout {
        Layout::Double => dims.len() == max,
        Layout::Quad | Layout::Strip => dims.len() <= max,
    };
    if !count_ok {
        return Err(BoothError::ImageCountMismatch {
            layout,
            max,
            actual: dims.len(),
        });
    }

    if let Some(index) = dims.iter().position(|&(w, h)| w == 0 || h == 0) {
        return Err(BoothError::DegenerateImage { index });
    }

    let plan = match GridSpec::for_layout(layout, orientation) {
        Some(grid) => grid.plan(dims.len())?,
        None => plan_double(dims[0], dims[1], orientation)?,
    };
    log::debug!(
        "Planned {} {} canvas {}x{} for {} images",
        layout,
        orientation,
        plan.width,
        plan.height,
        dims.len()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(Layout::Quad, Orientation::Landscape, (860, 660) ; "quad landscape")]
    #[test_case(Layout::Quad, Orientation::Portrait, (380, 1075) ; "quad portrait")]
    #[test_case(Layout::Strip, Orientation::Portrait, (605, 875) ; "strip portrait")]
    #[test_case(Layout::Strip, Orientation::Landscape, (875, 605) ; "strip landscape")]
    fn test_grid_canvas_sizes(layout: Layout, orientation: Orientation, expected: (u32, u32)) {
        let grid = GridSpec::for_layout(layout, orientation).unwrap();
        assert_eq!(grid.canvas_size().unwrap(), expected);
        assert_eq!(grid.capacity(), layout.final_limit());
    }

    #[test]
    fn test_quad_landscape_positions_are_row_major() {
        let plan = plan(Layout::Quad, Orientation::Landscape, &[(640, 480); 4]).unwrap();
        let origins: Vec<(u32, u32)> = plan.placements.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(origins, vec![(20, 20), (440, 20), (20, 340), (440, 340)]);
        assert!(plan
            .placements
            .iter()
            .all(|p| (p.width, p.height) == (400, 300)));
    }

    #[test]
    fn test_strip_landscape_fills_first_row_first() {
        let grid = GridSpec::for_layout(Layout::Strip, Orientation::Landscape).unwrap();
        assert_eq!(grid.cell_origin(3), (15 + 3 * 215, 15));
        assert_eq!(grid.cell_origin(4), (15, 15 + 295));
    }

    #[test]
    fn test_partial_grid_leaves_cells_empty() {
        let plan = plan(Layout::Strip, Orientation::Portrait, &[(10, 10); 3]).unwrap();
        assert_eq!(plan.placements.len(), 3);
        assert_eq!((plan.width, plan.height), (605, 875));
    }

    #[test]
    fn test_double_landscape_keeps_each_aspect() {
        let plan = plan(Layout::Double, Orientation::Landscape, &[(640, 480), (300, 600)]).unwrap();
        assert_eq!(plan.placements[0], Placement { x: 20, y: 20, width: 800, height: 600 });
        assert_eq!(plan.placements[1], Placement { x: 840, y: 20, width: 300, height: 600 });
        assert_eq!((plan.width, plan.height), (800 + 300 + 60, 640));

        let first = plan.placements[0];
        assert_relative_eq!(
            first.width as f64 / first.height as f64,
            640.0 / 480.0,
            epsilon = 0.01
        );
    }

    #[test]
    fn test_double_portrait_stacks() {
        let plan = plan(Layout::Double, Orientation::Portrait, &[(640, 480), (640, 480)]).unwrap();
        assert_eq!(plan.placements[0], Placement { x: 20, y: 20, width: 600, height: 450 });
        assert_eq!(plan.placements[1], Placement { x: 20, y: 490, width: 600, height: 450 });
        assert_eq!((plan.width, plan.height), (640, 960));
    }

    #[test]
    fn test_scale_truncates() {
        assert_eq!(scale_keep_aspect(900, 300, 600, true), (1800, 600));
        assert_eq!(scale_keep_aspect(3, 1000, 600, true), (1, 600));
        assert_eq!(scale_keep_aspect(1920, 1080, 600, false), (600, 337));
    }

    #[test]
    fn test_plan_rejects_bad_input() {
        assert!(matches!(
            plan(Layout::Quad, Orientation::Landscape, &[]),
            Err(BoothError::EmptyInput)
        ));
        assert!(matches!(
            plan(Layout::Double, Orientation::Portrait, &[(4, 4)]),
            Err(BoothError::ImageCountMismatch { max: 2, actual: 1, .. })
        ));
        assert!(matches!(
            plan(Layout::Quad, Orientation::Portrait, &[(4, 4); 5]),
            Err(BoothError::ImageCountMismatch { max: 4, actual: 5, .. })
        ));
        assert!(matches!(
            plan(Layout::Strip, Orientation::Portrait, &[(4, 4), (0, 4)]),
            Err(BoothError::DegenerateImage { index: 1 })
        ));
    }

    #[test_case(Orientation::Landscape, (8_000_000, 1) ; "landscape past u32 sum")]
    #[test_case(Orientation::Landscape, (20_000, 1) ; "landscape unallocatable")]
    #[test_case(Orientation::Portrait, (1, 8_000_000) ; "portrait past u32 sum")]
    fn test_plan_rejects_oversized_double(orientation: Orientation, dims: (u32, u32)) {
        assert!(matches!(
            plan(Layout::Double, orientation, &[dims, dims]),
            Err(BoothError::CanvasTooLarge { max: MAX_CANVAS_SIDE, .. })
        ));
    }

    #[test]
    fn test_double_wide_panorama_still_fits() {
        // 10:1 frames scale to 6000x600 each
        let plan = plan(Layout::Double, Orientation::Landscape, &[(5000, 500); 2]).unwrap();
        assert_eq!((plan.width, plan.height), (12_060, 640));
    }

    #[test]
    fn test_oversized_grid_is_rejected() {
        let grid = GridSpec {
            cell_width: u32::MAX,
            cell_height: 10,
            cols: 4,
            rows: 1,
            gap: 5,
        };
        assert!(matches!(
            grid.plan(1),
            Err(BoothError::CanvasTooLarge { .. })
        ));
    }
}
