//! slidepress
//!
//! Render HTML slide markup to raster images and carve the result into
//! fixed-aspect-ratio tiles for a social-media image carousel.
//!
//! # Overview
//!
//! - Slides are the elements carrying the configured marker class, in
//!   document order.
//! - Each slide's cascade is baked into a self-contained tree, rasterized at
//!   a 2× supersampling factor, then partitioned into tiles of the chosen
//!   catalog size — either scaled-and-centered into one tile or sliced into
//!   a covering grid.
//! - Tiles are PNG-encoded and handed to an archiver collaborator as
//!   `image_1.png`, `image_2.png`, … in generation order.
//!
//! # Example
//!
//! ```no_run
//! use slidepress::{ExportConfig, ExportPipeline, StaticSurface, TilePolicy, SIZE_CATALOG};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let surface = Arc::new(StaticSurface::new());
//! surface.load("<div class=\"carousel-slide\"><h1>Hello</h1></div>")?;
//!
//! let pipeline = ExportPipeline::new(surface, ExportConfig::default());
//! let rt = tokio::runtime::Runtime::new()?;
//! let images = rt.block_on(pipeline.export(SIZE_CATALOG[0], TilePolicy::FitCenter))?;
//! println!("{} tiles", images.len());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod encode;
pub mod error;
pub mod inline;
pub mod locate;
pub mod pipeline;
pub mod preview;
pub mod rendering;
pub mod style;
pub mod surface;
pub mod tile;

pub use archive::{ArchiveEntry, Archiver, CollectingArchiver, DirArchiver, NoopArchiver};
pub use error::{ExportError, Result};
pub use pipeline::{ExportPhase, ExportPipeline, ExportedImage};
pub use preview::PreviewController;
pub use rendering::{BlockRasterizer, PixelBuffer, RasterOptions, Rasterizer};
pub use style::{StyleResolver, Stylesheet};
pub use surface::{RenderSurface, StaticSurface};
pub use tile::TilePolicy;

/// Default marker class identifying exportable slides
pub const DEFAULT_MARKER_CLASS: &str = "carousel-slide";

/// One entry of the fixed output-size catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct OutputSize {
    pub id: u32,
    pub label: &'static str,
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
    pub aspect: &'static str,
}

/// The supported output sizes, 1080px base width
pub const SIZE_CATALOG: [OutputSize; 3] = [
    OutputSize {
        id: 1,
        label: "portrait",
        width: 1080,
        height: 1440,
        aspect: "3:4",
    },
    OutputSize {
        id: 2,
        label: "tall",
        width: 1080,
        height: 1920,
        aspect: "9:16",
    },
    OutputSize {
        id: 3,
        label: "square",
        width: 1080,
        height: 1080,
        aspect: "1:1",
    },
];

/// Look up a catalog entry by id
pub fn size_by_id(id: u32) -> Option<OutputSize> {
    SIZE_CATALOG.iter().copied().find(|size| size.id == id)
}

/// Configuration for an export pipeline
///
/// Defaults match the conventional deployment: the `carousel-slide` marker
/// class, a 10 second readiness budget, and 2× supersampling with a 1080px
/// fallback content width.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Class identifying exportable containers
    pub marker_class: String,
    /// Upper bound on waiting for the surface readiness signal
    pub ready_timeout_ms: u64,
    /// Measurement and supersampling options
    pub raster: RasterOptions,
    /// Prefix for the timestamp-suffixed archive name
    pub archive_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
            ready_timeout_ms: 10_000,
            raster: RasterOptions::default(),
            archive_prefix: "slides".to_string(),
        }
    }
}
