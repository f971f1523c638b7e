//! Rendering-surface collaborator.
//!
//! The export pipeline only needs four things from whatever hosts the
//! rendered markup: a one-shot readiness signal, the loaded markup, its
//! stylesheet rule sets, and nothing else. [`StaticSurface`] is the built-in
//! implementation backed by a parsed HTML string; UI hosts can implement
//! [`RenderSurface`] over their own document instead.

use crate::error::{ExportError, Result};
use crate::style::Stylesheet;
use scraper::{Html, Selector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Interface the pipeline requires from a rendering surface
pub trait RenderSurface: Send + Sync {
    /// Whether the surface content has finished loading
    fn is_ready(&self) -> bool;

    /// One-shot readiness signal. Resolves immediately when the surface is
    /// already ready at subscription time.
    fn ready_signal(&self) -> oneshot::Receiver<()>;

    /// The loaded markup. Fails with `RenderNotReady` before `load`.
    fn markup(&self) -> Result<String>;

    /// Snapshot of the surface's rule sets, inline blocks first, linked
    /// sheets with resolved absolute URLs after.
    fn stylesheets(&self) -> Vec<Stylesheet>;
}

#[derive(Default)]
struct SurfaceState {
    markup: Option<String>,
    sheets: Vec<Stylesheet>,
}

/// An in-process rendering surface over a static markup string.
///
/// `load` parses the markup, extracts inline `<style>` elements and
/// `<link rel="stylesheet">` references, then flips the readiness flag and
/// wakes any waiting subscriber. Shared freely behind an `Arc`.
pub struct StaticSurface {
    state: Mutex<SurfaceState>,
    ready: AtomicBool,
    waiters: Mutex<Vec<oneshot::Sender<()>>>,
    base_url: Option<url::Url>,
}

impl StaticSurface {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SurfaceState::default()),
            ready: AtomicBool::new(false),
            waiters: Mutex::new(Vec::new()),
            base_url: None,
        }
    }

    /// Base URL for resolving relative stylesheet hrefs
    pub fn with_base_url(mut self, base: url::Url) -> Self {
        self.base_url = Some(base);
        self
    }

    /// Load markup into the surface and extract its stylesheets.
    ///
    /// Linked sheets are fetched synchronously when the `fetch` feature is
    /// enabled; call this outside of async contexts.
    pub fn load(&self, markup: &str) -> Result<()> {
        let sheets = self.extract_styles(markup);
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| ExportError::RenderNotReady("surface state poisoned".into()))?;
            state.markup = Some(markup.to_string());
            state.sheets = sheets;
        }
        self.ready.store(true, Ordering::SeqCst);
        if let Ok(mut waiters) = self.waiters.lock() {
            for tx in waiters.drain(..) {
                let _ = tx.send(());
            }
        }
        Ok(())
    }

    /// Extract rule sets in document order of appearance: `<style>` blocks,
    /// then `<link rel="stylesheet">` references.
    fn extract_styles(&self, markup: &str) -> Vec<Stylesheet> {
        let document = Html::parse_document(markup);
        let mut sheets = Vec::new();

        let style_sel = Selector::parse("style").expect("static selector");
        for node in document.select(&style_sel) {
            let css = node.text().collect::<String>();
            if css.trim().is_empty() {
                continue;
            }
            let mut sheet = Stylesheet::parse(&css);
            sheet.media = node.value().attr("media").map(str::to_string);
            sheets.push(sheet);
        }

        let link_sel = Selector::parse("link[rel=\"stylesheet\"]").expect("static selector");
        for node in document.select(&link_sel) {
            let Some(href) = node.value().attr("href") else {
                continue;
            };
            let absolute = match &self.base_url {
                Some(base) => base
                    .join(href)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| href.to_string()),
                None => href.to_string(),
            };
            sheets.push(self.fetch_linked(&absolute));
        }

        sheets
    }

    #[cfg(feature = "fetch")]
    fn fetch_linked(&self, href: &str) -> Stylesheet {
        let css = reqwest::blocking::get(href).and_then(|resp| resp.text());
        match css {
            Ok(text) => Stylesheet::linked(href, &text),
            Err(err) => {
                log::warn!("failed to fetch stylesheet {href}: {err}");
                Stylesheet {
                    href: Some(href.to_string()),
                    ..Stylesheet::default()
                }
            }
        }
    }

    #[cfg(not(feature = "fetch"))]
    fn fetch_linked(&self, href: &str) -> Stylesheet {
        Stylesheet {
            href: Some(href.to_string()),
            ..Stylesheet::default()
        }
    }
}

impl Default for StaticSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for StaticSurface {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn ready_signal(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if self.is_ready() {
            let _ = tx.send(());
        } else if let Ok(mut waiters) = self.waiters.lock() {
            waiters.push(tx);
        }
        rx
    }

    fn markup(&self) -> Result<String> {
        let state = self
            .state
            .lock()
            .map_err(|_| ExportError::RenderNotReady("surface state poisoned".into()))?;
        state
            .markup
            .clone()
            .ok_or_else(|| ExportError::RenderNotReady("no markup loaded".into()))
    }

    fn stylesheets(&self) -> Vec<Stylesheet> {
        self.state
            .lock()
            .map(|state| state.sheets.clone())
            .unwrap_or_default()
    }
}
