//! Thin state holder for UI affordances around the export pipeline.
//!
//! Not part of the hard core: it only tracks the selected output size, the
//! chosen policy, the processing flag, the error surface, and the last
//! result list.

use crate::pipeline::ExportedImage;
use crate::tile::TilePolicy;
use crate::{ExportError, OutputSize, SIZE_CATALOG};

/// Caller-visible export state
#[derive(Debug, Clone)]
pub struct PreviewController {
    selected: OutputSize,
    policy: TilePolicy,
    processing: bool,
    error: Option<String>,
    images: Vec<ExportedImage>,
}

impl PreviewController {
    pub fn new() -> Self {
        Self {
            selected: SIZE_CATALOG[0],
            policy: TilePolicy::FitCenter,
            processing: false,
            error: None,
            images: Vec::new(),
        }
    }

    /// The fixed output-size catalog
    pub fn size_catalog(&self) -> &'static [OutputSize] {
        &SIZE_CATALOG
    }

    pub fn selected_size(&self) -> OutputSize {
        self.selected
    }

    /// Select a catalog entry by id; unknown ids leave the selection alone
    pub fn select_size(&mut self, id: u32) -> bool {
        match crate::size_by_id(id) {
            Some(size) => {
                self.selected = size;
                true
            }
            None => false,
        }
    }

    pub fn policy(&self) -> TilePolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: TilePolicy) {
        self.policy = policy;
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn images(&self) -> &[ExportedImage] {
        &self.images
    }

    /// Preview payloads for the current result list
    pub fn data_urls(&self) -> Vec<String> {
        self.images.iter().map(ExportedImage::to_data_url).collect()
    }

    /// Replace the result list and clear the error surface
    pub fn record_success(&mut self, images: Vec<ExportedImage>) {
        self.error = None;
        self.images = images;
    }

    /// Clear results and surface the failure as a human-readable message
    pub fn record_failure(&mut self, error: &ExportError) {
        self.images.clear();
        self.error = Some(error.to_string());
    }

    pub fn clear_images(&mut self) {
        self.images.clear();
    }
}

impl Default for PreviewController {
    fn default() -> Self {
        Self::new()
    }
}
