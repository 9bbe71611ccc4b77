//! Caption sidecar files.
//!
//! A caption lives next to its image with the same stem and a fixed extension
//! (`photo.jpg` -> `photo.txt`). Line 1 is the title, everything after the
//! first line break is the description. Both are trimmed on read. A caption
//! with no title and no description is represented by the absence of the file.
//!
//! Sidecars are always read and written as UTF-8 regardless of host locale.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::config::DEFAULT_CAPTION_EXTENSION;
use crate::error::{CaptionError, Result};
use crate::models::CaptionRecord;

/// Reads and writes caption records.
pub trait CaptionBackend {
    fn read(&self, image: &Path) -> Result<CaptionRecord>;
    fn save(&self, image: &Path, record: &CaptionRecord) -> Result<()>;
}

/// Filesystem-backed caption store.
#[derive(Debug, Clone)]
pub struct CaptionStore {
    extension: String,
}

impl CaptionStore {
    pub fn new() -> Self {
        Self::with_extension(DEFAULT_CAPTION_EXTENSION)
    }

    pub fn with_extension(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    /// Sidecar path for `image`.
    pub fn sidecar_path(&self, image: &Path) -> PathBuf {
        image.with_extension(&self.extension)
    }

    /// Split sidecar text into a trimmed record.
    pub fn parse(text: &str) -> CaptionRecord {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        match text.split_once('\n') {
            Some((title, description)) => CaptionRecord::new(title, description),
            None => CaptionRecord::new(text, ""),
        }
    }

    /// Serialise a record; the inverse of `parse` for trimmed records.
    pub fn render(record: &CaptionRecord) -> String {
        let record = record.trimmed();
        format!("{}\n{}", record.title, record.description)
    }
}

impl Default for CaptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptionBackend for CaptionStore {
    fn read(&self, image: &Path) -> Result<CaptionRecord> {
        let sidecar = self.sidecar_path(image);
        let bytes = match fs::read(&sidecar) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                trace!(?sidecar, "No caption file");
                return Ok(CaptionRecord::default());
            }
            Err(e) => return Err(CaptionError::sidecar(sidecar, e)),
        };

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(?sidecar, "Caption file is not UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };

        debug!(?sidecar, "Read caption");
        Ok(Self::parse(&text))
    }

    fn save(&self, image: &Path, record: &CaptionRecord) -> Result<()> {
        let sidecar = self.sidecar_path(image);

        if record.is_empty() {
            return match fs::remove_file(&sidecar) {
                Ok(()) => {
                    debug!(?sidecar, "Removed empty caption");
                    Ok(())
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CaptionError::sidecar(sidecar, e)),
            };
        }

        fs::write(&sidecar, Self::render(record))
            .map_err(|e| CaptionError::sidecar(&sidecar, e))?;
        debug!(?sidecar, "Saved caption");
        Ok(())
    }
}
