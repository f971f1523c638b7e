//! Error types for the export pipeline

use thiserror::Error;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Terminal states of an export run
///
/// Every failure is terminal for that run; nothing in the pipeline retries.
/// Variants carry enough context (container index, measured dimensions) to
/// render a human-readable message.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The rendering surface has not loaded, has no body, or did not signal
    /// readiness in time. Recoverable by retrying after readiness.
    #[error("render surface not ready: {0}")]
    RenderNotReady(String),

    /// No element carrying the marker class exists in the document
    #[error("no `{marker}` container found in the markup")]
    ContainerNotFound { marker: String },

    /// A located container has no child elements (1-based position)
    #[error("container {index} is empty")]
    ContainerEmpty { index: usize },

    /// A rasterized container exceeds the supported supersampled bounds.
    /// Dimensions are reported in CSS pixels.
    #[error("container {index} exceeds the size limit: {width}x{height}px")]
    SizeExceeded {
        index: usize,
        width: u32,
        height: u32,
    },

    /// Raster encoding or archive packaging failed
    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    /// A second export was triggered while one is already in flight
    #[error("an export is already in progress")]
    ExportInProgress,
}
