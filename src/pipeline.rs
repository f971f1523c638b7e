//! Export orchestration: locate → rasterize → partition → encode → archive.
//!
//! A run fails atomically: the first error aborts the whole export and no
//! partial result is surfaced. Exactly one run may be in flight; a second
//! invocation is rejected while the busy flag is set.

use crate::archive::{archive_name, ArchiveEntry, Archiver, NoopArchiver};
use crate::encode;
use crate::error::{ExportError, Result};
use crate::inline::inline_subtree;
use crate::locate::locate;
use crate::rendering::{BlockRasterizer, Rasterizer};
use crate::style::RuleSetResolver;
use crate::surface::RenderSurface;
use crate::tile::{partition, TilePolicy};
use crate::{ExportConfig, OutputSize};
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Progress of an export run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Locating,
    /// Container indices are 1-based
    Rasterizing(usize),
    Partitioning(usize),
    Encoding(usize),
}

/// A finalized tile matching the requested output size exactly, encoded as
/// PNG. `index` is the 1-based position in generation order (outer loop over
/// containers, inner loop over tiles).
#[derive(Debug, Clone)]
pub struct ExportedImage {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl ExportedImage {
    pub fn filename(&self) -> String {
        format!("image_{}.png", self.index)
    }

    pub fn to_data_url(&self) -> String {
        encode::to_data_url(&self.png)
    }
}

/// Drives an export run over a rendering surface
pub struct ExportPipeline<S: RenderSurface> {
    surface: Arc<S>,
    rasterizer: Box<dyn Rasterizer>,
    archiver: Box<dyn Archiver>,
    config: ExportConfig,
    busy: AtomicBool,
    phase: Mutex<ExportPhase>,
}

impl<S: RenderSurface> ExportPipeline<S> {
    pub fn new(surface: Arc<S>, config: ExportConfig) -> Self {
        Self {
            surface,
            rasterizer: Box::new(BlockRasterizer),
            archiver: Box::new(NoopArchiver),
            config,
            busy: AtomicBool::new(false),
            phase: Mutex::new(ExportPhase::Idle),
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Box<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn with_archiver(mut self, archiver: Box<dyn Archiver>) -> Self {
        self.archiver = archiver;
        self
    }

    /// Advisory busy flag; `export` enforces it as a hard reentrancy guard
    pub fn is_processing(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase
            .lock()
            .map(|phase| *phase)
            .unwrap_or(ExportPhase::Idle)
    }

    fn set_phase(&self, phase: ExportPhase) {
        if let Ok(mut current) = self.phase.lock() {
            log::debug!("export phase: {phase:?}");
            *current = phase;
        }
    }

    /// Run a full export for the chosen output size and policy.
    ///
    /// Waits for the surface's one-shot readiness signal (bounded by the
    /// configured timeout), then processes every located container in
    /// document order. The busy flag is reset on success and failure alike.
    pub async fn export(
        &self,
        size: OutputSize,
        policy: TilePolicy,
    ) -> Result<Vec<ExportedImage>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ExportError::ExportInProgress);
        }

        let result = self.run(size, policy).await;
        self.set_phase(ExportPhase::Idle);
        self.busy.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self, size: OutputSize, policy: TilePolicy) -> Result<Vec<ExportedImage>> {
        self.wait_ready().await?;

        let markup = self.surface.markup()?;
        let doc = Html::parse_document(&markup);
        let body_sel = Selector::parse("body").expect("static selector");
        if doc.select(&body_sel).next().is_none() {
            return Err(ExportError::RenderNotReady("document has no body".into()));
        }

        self.set_phase(ExportPhase::Locating);
        let containers = locate(&doc, &self.config.marker_class)?;
        log::debug!(
            "located {} `{}` containers",
            containers.len(),
            self.config.marker_class
        );

        let sheets = self.surface.stylesheets();
        let resolver = RuleSetResolver::new(sheets.clone());

        let mut images: Vec<ExportedImage> = Vec::new();
        for (i, container) in containers.iter().enumerate() {
            let index = i + 1;

            self.set_phase(ExportPhase::Rasterizing(index));
            let tree = inline_subtree(&doc, *container, &resolver);
            let buffer = self
                .rasterizer
                .measure_and_rasterize(&tree, &sheets, &self.config.raster)
                .map_err(|e| with_container_context(e, index))?;
            log::debug!(
                "container {index}: rasterized {}x{}",
                buffer.width(),
                buffer.height()
            );

            self.set_phase(ExportPhase::Partitioning(index));
            let tiles = partition(&buffer, size, policy, index)?;

            self.set_phase(ExportPhase::Encoding(index));
            for tile in &tiles {
                let png =
                    encode::encode_png(tile).map_err(|e| with_container_context(e, index))?;
                images.push(ExportedImage {
                    index: images.len() + 1,
                    width: tile.width(),
                    height: tile.height(),
                    png,
                });
            }
        }

        let entries: Vec<ArchiveEntry> = images
            .iter()
            .map(|image| ArchiveEntry::binary(image.filename(), image.png.clone()))
            .collect();
        self.archiver
            .archive(&archive_name(&self.config.archive_prefix), &entries)?;

        log::info!("export finished: {} images", images.len());
        Ok(images)
    }

    async fn wait_ready(&self) -> Result<()> {
        if self.surface.is_ready() {
            return Ok(());
        }
        let signal = self.surface.ready_signal();
        let timeout = Duration::from_millis(self.config.ready_timeout_ms);
        match tokio::time::timeout(timeout, signal).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ExportError::RenderNotReady(
                "readiness signal dropped".into(),
            )),
            Err(_) => Err(ExportError::RenderNotReady(format!(
                "no readiness signal within {}ms",
                self.config.ready_timeout_ms
            ))),
        }
    }
}

/// Attach the 1-based container index to errors raised below the pipeline
fn with_container_context(error: ExportError, index: usize) -> ExportError {
    match error {
        ExportError::EncodingFailed(msg) => {
            ExportError::EncodingFailed(format!("container {index}: {msg}"))
        }
        ExportError::RenderNotReady(msg) => {
            ExportError::RenderNotReady(format!("container {index}: {msg}"))
        }
        other => other,
    }
}
