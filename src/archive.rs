//! Archiver collaborator: package the exported images for delivery.
//!
//! Archive internals are out of scope for the pipeline; it only depends on
//! the [`Archiver`] trait taking an ordered list of named payloads. Shipped
//! implementations: a noop, a directory writer for CLI delivery, and a
//! collecting test double.

use crate::error::{ExportError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// One named payload in generation order
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub data: Vec<u8>,
    /// Whether `data` is base64 text rather than raw bytes
    pub base64: bool,
}

impl ArchiveEntry {
    pub fn binary(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
            base64: false,
        }
    }

    /// Raw payload bytes, decoding base64 entries
    pub fn raw_bytes(&self) -> Result<Vec<u8>> {
        if self.base64 {
            BASE64
                .decode(&self.data)
                .map_err(|e| ExportError::EncodingFailed(format!("base64 entry {}: {e}", self.name)))
        } else {
            Ok(self.data.clone())
        }
    }
}

/// Packages ordered entries into a single deliverable archive
pub trait Archiver: Send + Sync {
    fn archive(&self, name: &str, entries: &[ArchiveEntry]) -> Result<()>;
}

impl<A: Archiver + ?Sized> Archiver for std::sync::Arc<A> {
    fn archive(&self, name: &str, entries: &[ArchiveEntry]) -> Result<()> {
        (**self).archive(name, entries)
    }
}

/// Conventional archive name: configured prefix plus a timestamp suffix
pub fn archive_name(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("{prefix}_{millis}")
}

/// Discards everything; the default when the caller only wants the image
/// list back
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopArchiver;

impl Archiver for NoopArchiver {
    fn archive(&self, _name: &str, _entries: &[ArchiveEntry]) -> Result<()> {
        Ok(())
    }
}

/// Writes entries as files under `root/<archive name>/`
#[derive(Debug, Clone)]
pub struct DirArchiver {
    root: PathBuf,
}

impl DirArchiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Archiver for DirArchiver {
    fn archive(&self, name: &str, entries: &[ArchiveEntry]) -> Result<()> {
        let dir = self.root.join(name);
        std::fs::create_dir_all(&dir)
            .map_err(|e| ExportError::EncodingFailed(format!("create {}: {e}", dir.display())))?;
        for entry in entries {
            let path = dir.join(&entry.name);
            std::fs::write(&path, entry.raw_bytes()?)
                .map_err(|e| ExportError::EncodingFailed(format!("write {}: {e}", path.display())))?;
        }
        log::info!("archived {} entries under {}", entries.len(), dir.display());
        Ok(())
    }
}

/// Test double that records what was handed to it
#[derive(Debug, Default)]
pub struct CollectingArchiver {
    received: Mutex<Vec<(String, Vec<ArchiveEntry>)>>,
}

impl CollectingArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive names received, in call order
    pub fn names(&self) -> Vec<String> {
        self.received
            .lock()
            .map(|r| r.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }

    /// Entry names of the most recent archive call
    pub fn last_entry_names(&self) -> Vec<String> {
        self.received
            .lock()
            .ok()
            .and_then(|r| {
                r.last()
                    .map(|(_, entries)| entries.iter().map(|e| e.name.clone()).collect())
            })
            .unwrap_or_default()
    }
}

impl Archiver for CollectingArchiver {
    fn archive(&self, name: &str, entries: &[ArchiveEntry]) -> Result<()> {
        if let Ok(mut received) = self.received.lock() {
            received.push((name.to_string(), entries.to_vec()));
        }
        Ok(())
    }
}
