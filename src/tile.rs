//! Tile partitioning: fit a rendered buffer into fixed-size carousel tiles.
//!
//! Both policies are pure functions of (source buffer, target size) and are
//! deterministic for identical input.

use crate::error::{ExportError, Result};
use crate::rendering::PixelBuffer;
use crate::OutputSize;
use image::imageops::{self, FilterType};
use image::Rgba;

/// Largest supported source size in CSS pixels (the tallest catalog entry)
pub const MAX_SOURCE_WIDTH: u32 = 1080;
pub const MAX_SOURCE_HEIGHT: u32 = 1920;

/// Supersampling factor the size precondition is expressed against
const SUPERSAMPLE: u32 = 2;

/// How a rendered buffer is carved into output tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TilePolicy {
    /// Uniformly scale the whole buffer into one centered tile
    FitCenter,
    /// Slice the buffer into a covering grid of same-size tiles
    Grid,
}

impl std::fmt::Display for TilePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TilePolicy::FitCenter => write!(f, "fit"),
            TilePolicy::Grid => write!(f, "grid"),
        }
    }
}

/// Partition `source` into tiles of exactly `size.width × size.height`.
/// `index` is the 1-based container position, used for error context.
pub fn partition(
    source: &PixelBuffer,
    size: OutputSize,
    policy: TilePolicy,
    index: usize,
) -> Result<Vec<PixelBuffer>> {
    match policy {
        TilePolicy::FitCenter => Ok(vec![fit_and_center(source, size, index)?]),
        TilePolicy::Grid => Ok(grid_tiles(source, size)),
    }
}

/// Uniform-scale-and-center: `scale = min(W/w, H/h)`, drawn centered on a
/// transparent ground. Rejects buffers beyond the supersampled bounds of the
/// largest supported size before scaling.
pub fn fit_and_center(
    source: &PixelBuffer,
    size: OutputSize,
    index: usize,
) -> Result<PixelBuffer> {
    let (w, h) = source.dimensions();
    if w > MAX_SOURCE_WIDTH * SUPERSAMPLE || h > MAX_SOURCE_HEIGHT * SUPERSAMPLE {
        return Err(ExportError::SizeExceeded {
            index,
            width: w / SUPERSAMPLE,
            height: h / SUPERSAMPLE,
        });
    }

    let target_w = size.width;
    let target_h = size.height;
    let scale = (target_w as f64 / w as f64).min(target_h as f64 / h as f64);
    let scaled_w = ((w as f64 * scale).round() as u32).clamp(1, target_w);
    let scaled_h = ((h as f64 * scale).round() as u32).clamp(1, target_h);

    let scaled = if (scaled_w, scaled_h) == (w, h) {
        source.clone()
    } else {
        imageops::resize(source, scaled_w, scaled_h, FilterType::Triangle)
    };

    let mut tile = PixelBuffer::from_pixel(target_w, target_h, Rgba([0, 0, 0, 0]));
    let offset_x = (target_w - scaled_w) / 2;
    let offset_y = (target_h - scaled_h) / 2;
    imageops::overlay(&mut tile, &scaled, offset_x as i64, offset_y as i64);
    Ok(tile)
}

/// Grid-tiling: `ceil(w/W) × ceil(h/H)` tiles in row-major order. Source
/// rectangles are clipped at the right/bottom edges; the uncovered remainder
/// of an edge tile stays transparent. The union of copied rectangles covers
/// the source exactly once.
pub fn grid_tiles(source: &PixelBuffer, size: OutputSize) -> Vec<PixelBuffer> {
    let (w, h) = source.dimensions();
    let target_w = size.width;
    let target_h = size.height;
    let cols = w.div_ceil(target_w);
    let rows = h.div_ceil(target_h);

    let mut tiles = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let src_x = col * target_w;
            let src_y = row * target_h;
            let copy_w = target_w.min(w - src_x);
            let copy_h = target_h.min(h - src_y);

            let mut tile = PixelBuffer::from_pixel(target_w, target_h, Rgba([0, 0, 0, 0]));
            let region = imageops::crop_imm(source, src_x, src_y, copy_w, copy_h).to_image();
            imageops::overlay(&mut tile, &region, 0, 0);
            tiles.push(tile);
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SIZE_CATALOG;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255])
        })
    }

    fn portrait() -> OutputSize {
        SIZE_CATALOG[0]
    }

    #[test]
    fn fit_produces_exactly_target_dimensions_for_all_sizes() {
        let source = gradient(640, 480);
        for size in SIZE_CATALOG {
            let tile = fit_and_center(&source, size, 1).unwrap();
            assert_eq!(tile.dimensions(), (size.width, size.height));
        }
    }

    #[test]
    fn fit_centers_within_one_pixel() {
        // 200x100 into 1080x1440: scale = 1080/200 = 5.4, scaled = 1080x540
        let source = gradient(200, 100);
        let tile = fit_and_center(&source, portrait(), 1).unwrap();
        let first = (0..tile.height())
            .find(|&y| tile.get_pixel(540, y).0[3] != 0)
            .unwrap();
        let last = (0..tile.height())
            .rev()
            .find(|&y| tile.get_pixel(540, y).0[3] != 0)
            .unwrap();
        let top_margin = first as i64;
        let bottom_margin = (tile.height() - 1 - last) as i64;
        assert!((top_margin - bottom_margin).abs() <= 1);
        // horizontal: full width, no margin
        assert_ne!(tile.get_pixel(0, 720).0[3], 0);
        assert_ne!(tile.get_pixel(1079, 720).0[3], 0);
    }

    #[test]
    fn supersampled_exact_fit_is_drawn_at_origin() {
        // 2x-supersampled 1080x1440 container: scale 0.5, fills the tile
        let source = gradient(2160, 2880);
        let tile = fit_and_center(&source, portrait(), 1).unwrap();
        assert_eq!(tile.dimensions(), (1080, 1440));
        assert_ne!(tile.get_pixel(0, 0).0[3], 0);
        assert_ne!(tile.get_pixel(1079, 1439).0[3], 0);
    }

    #[test]
    fn oversized_source_is_rejected_with_css_dimensions() {
        let source = gradient(2161, 100);
        match fit_and_center(&source, portrait(), 3) {
            Err(ExportError::SizeExceeded {
                index,
                width,
                height,
            }) => {
                assert_eq!(index, 3);
                assert_eq!(width, 1080);
                assert_eq!(height, 50);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn grid_count_and_order_are_row_major() {
        let source = gradient(2160, 2880);
        let tiles = grid_tiles(&source, portrait());
        assert_eq!(tiles.len(), 4);

        // top-left tile starts at source (0,0); top-right at (1080,0)
        assert_eq!(tiles[0].get_pixel(0, 0).0, source.get_pixel(0, 0).0);
        assert_eq!(tiles[1].get_pixel(0, 0).0, source.get_pixel(1080, 0).0);
        assert_eq!(tiles[2].get_pixel(0, 0).0, source.get_pixel(0, 1440).0);
        assert_eq!(tiles[3].get_pixel(0, 0).0, source.get_pixel(1080, 1440).0);
    }

    #[test]
    fn grid_covers_source_exactly_with_transparent_remainder() {
        let source = gradient(1100, 1500);
        let size = portrait();
        let tiles = grid_tiles(&source, size);
        assert_eq!(tiles.len(), 4);

        // remainder region of the top-right tile is transparent
        let top_right = &tiles[1];
        assert_ne!(top_right.get_pixel(19, 0).0[3], 0);
        assert_eq!(top_right.get_pixel(20, 0).0[3], 0);

        // every source pixel appears in exactly one tile at the expected spot
        let checks = [(0u32, 0u32), (1099, 0), (0, 1499), (1099, 1499), (542, 731)];
        for (x, y) in checks {
            let col = x / size.width;
            let row = y / size.height;
            let tile = &tiles[(row * 2 + col) as usize];
            assert_eq!(
                tile.get_pixel(x % size.width, y % size.height).0,
                source.get_pixel(x, y).0
            );
        }
    }

    #[test]
    fn partition_dispatches_by_policy() {
        let source = gradient(2160, 2880);
        let fit = partition(&source, portrait(), TilePolicy::FitCenter, 1).unwrap();
        assert_eq!(fit.len(), 1);
        let grid = partition(&source, portrait(), TilePolicy::Grid, 1).unwrap();
        assert_eq!(grid.len(), 4);
    }

    #[test]
    fn policies_are_deterministic() {
        let source = gradient(321, 123);
        let a = fit_and_center(&source, portrait(), 1).unwrap();
        let b = fit_and_center(&source, portrait(), 1).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }
}
