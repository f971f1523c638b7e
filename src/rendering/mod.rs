//! Rasterization: turn a self-contained styled tree into a pixel buffer.
//!
//! Rasterization is a capability ([`Rasterizer`]) so the pipeline never
//! depends on a particular rendering engine. The built-in
//! [`BlockRasterizer`] measures with a simple block layout and paints a
//! deterministic display list; hosts with a real engine implement the trait
//! instead.

pub mod layout;
pub mod paint;
pub mod raster;

use crate::error::Result;
use crate::inline::InlinedNode;
use crate::style::Stylesheet;

/// A 2D grid of RGBA pixels. Immutable once produced.
pub type PixelBuffer = image::RgbaImage;

/// Options governing measurement and supersampling
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// Multiplier applied to CSS-pixel dimensions for output sharpness
    pub supersample: u32,
    /// Content width in CSS pixels used when the tree declares none
    pub fallback_width: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            supersample: 2,
            fallback_width: 1080,
        }
    }
}

/// Measure a styled tree and produce its pixel buffer.
///
/// The output buffer dimensions are exactly `supersample ×` the CSS-pixel
/// layout size of the tree. `stylesheets` carries the owning surface's rule
/// sets for cascade context that inlining cannot bake (dynamic selectors,
/// animations); implementations may ignore it.
pub trait Rasterizer: Send + Sync {
    fn measure_and_rasterize(
        &self,
        tree: &InlinedNode,
        stylesheets: &[Stylesheet],
        options: &RasterOptions,
    ) -> Result<PixelBuffer>;
}

/// Built-in deterministic block renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockRasterizer;

impl Rasterizer for BlockRasterizer {
    fn measure_and_rasterize(
        &self,
        tree: &InlinedNode,
        _stylesheets: &[Stylesheet],
        options: &RasterOptions,
    ) -> Result<PixelBuffer> {
        let layout = layout::layout_tree(tree, options.fallback_width);
        let commands = paint::build_display_list(&layout);
        Ok(raster::rasterize_display_list(
            layout.width,
            layout.height,
            &commands,
            options.supersample,
        ))
    }
}
