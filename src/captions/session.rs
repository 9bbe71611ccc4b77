//! Caption editing session.
//!
//! Owns the ordered image list, the current position and the editable caption
//! buffer. Navigating away from a modified caption saves it first; a failed
//! save leaves the session exactly where it was so the user can retry or
//! revert. A caption that cannot be read is shown empty and is never written
//! over until a later read succeeds.

use std::path::Path;
use std::sync::Arc;

use flume::Sender;
use image::{DynamicImage, RgbaImage};
use tracing::{debug, info, warn};

use super::store::{CaptionBackend, CaptionStore};
use crate::config::Config;
use crate::error::{CaptionError, Result};
use crate::image_loader::PreviewCache;
use crate::models::{CaptionField, CaptionRecord, ImageAsset};
use crate::scanner::order::SkippedPath;
use crate::thumbnails::queue::ThumbnailPrefetchQueue;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Viewing(usize),
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    ImageDecode,
    SkippedMetadata,
    SidecarUnreadable,
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    CaptionLoaded {
        index: usize,
        record: CaptionRecord,
    },
    ImageLoaded {
        index: usize,
        width: u32,
        height: u32,
    },
    ThumbnailReady {
        position: usize,
        image: Option<RgbaImage>,
    },
    Warning {
        kind: WarningKind,
        message: String,
    },
}

pub struct CaptionSession<B = CaptionStore> {
    assets: Vec<ImageAsset>,
    state: SessionState,
    buffer: CaptionRecord,
    dirty: bool,
    /// The current caption could not be read, so saving it is refused.
    unreadable: bool,
    backend: B,
    previews: PreviewCache,
    preview: Option<Arc<DynamicImage>>,
    prefetch: Option<ThumbnailPrefetchQueue>,
    events: Sender<SessionEvent>,
}

impl<B: CaptionBackend> CaptionSession<B> {
    /// Create a session over an ordered list and load the first image.
    pub fn new(
        assets: Vec<ImageAsset>,
        backend: B,
        config: &Config,
        events: Sender<SessionEvent>,
    ) -> Self {
        let mut session = Self {
            assets,
            state: SessionState::Empty,
            buffer: CaptionRecord::default(),
            dirty: false,
            unreadable: false,
            backend,
            previews: PreviewCache::new(config.preview_cache_entries),
            preview: None,
            prefetch: None,
            events,
        };
        if !session.assets.is_empty() {
            session.load(0);
        }
        session
    }

    /// Start decoding list icons in the background.
    ///
    /// Skipped for fewer than two images, where there is no list to decorate.
    pub fn start_prefetch(&mut self, icon_size: u32, capacity: usize) -> anyhow::Result<bool> {
        if self.assets.len() < 2 || self.prefetch.is_some() {
            return Ok(false);
        }
        let paths: Vec<_> = self.assets.iter().map(|a| a.path().to_path_buf()).collect();
        self.prefetch = Some(ThumbnailPrefetchQueue::start(&paths, icon_size, capacity)?);
        Ok(true)
    }

    /// Forward at most one finished thumbnail as a `ThumbnailReady` event.
    ///
    /// Returns true if a result was forwarded.
    pub fn pump_thumbnail(&mut self) -> bool {
        let Some(queue) = self.prefetch.as_mut() else {
            return false;
        };
        let result = queue.try_next();
        if queue.is_finished() {
            debug!("Thumbnail prefetch complete");
            self.prefetch = None;
        }
        match result {
            Some(result) => {
                self.emit(SessionEvent::ThumbnailReady {
                    position: result.position,
                    image: result.image,
                });
                true
            }
            None => false,
        }
    }

    /// Publish one warning per file left out of the ordering.
    pub fn report_skipped(&self, skipped: &[SkippedPath]) {
        for skip in skipped {
            self.emit(SessionEvent::Warning {
                kind: WarningKind::SkippedMetadata,
                message: skip.error.to_string(),
            });
        }
    }

    pub fn edit(&mut self, field: CaptionField, value: impl Into<String>) -> Result<()> {
        self.viewing()?;
        self.buffer.set(field, value);
        self.dirty = true;
        Ok(())
    }

    /// Save if dirty, then show `target`.
    pub fn navigate(&mut self, target: usize) -> Result<()> {
        let current = self.viewing()?;
        if target >= self.assets.len() {
            return Err(CaptionError::InvalidIndex {
                index: target,
                len: self.assets.len(),
            });
        }
        self.save_if_dirty(current)?;
        self.load(target);
        Ok(())
    }

    pub fn next(&mut self) -> Result<()> {
        let current = self.viewing()?;
        self.navigate((current + 1) % self.assets.len())
    }

    pub fn previous(&mut self) -> Result<()> {
        let current = self.viewing()?;
        let len = self.assets.len();
        self.navigate((current + len - 1) % len)
    }

    pub fn select(&mut self, index: usize) -> Result<()> {
        self.navigate(index)
    }

    /// Discard edits and reload the current caption from disk.
    pub fn revert(&mut self) -> Result<()> {
        let current = self.viewing()?;
        self.load(current);
        Ok(())
    }

    /// Save pending edits and end the session.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            SessionState::Closed => return Err(CaptionError::SessionClosed),
            SessionState::Viewing(current) => self.save_if_dirty(current)?,
            SessionState::Empty => {}
        }
        if let Some(queue) = self.prefetch.take() {
            queue.shutdown();
        }
        self.preview = None;
        self.state = SessionState::Closed;
        info!("Caption session closed");
        Ok(())
    }

    fn load(&mut self, index: usize) {
        let path = self.assets[index].path().to_path_buf();
        let record = match self.backend.read(&path) {
            Ok(record) => {
                self.unreadable = false;
                record
            }
            Err(e) => {
                warn!(?path, error = %e, "Cannot read caption");
                self.unreadable = true;
                self.emit(SessionEvent::Warning {
                    kind: WarningKind::SidecarUnreadable,
                    message: e.to_string(),
                });
                CaptionRecord::default()
            }
        };

        self.state = SessionState::Viewing(index);
        self.buffer = record.clone();
        self.dirty = false;
        debug!(index, ?path, "Loaded caption");
        self.emit(SessionEvent::CaptionLoaded { index, record });

        self.load_preview(index, &path);
    }

    /// Decode the image for display. Failure only affects rendering.
    fn load_preview(&mut self, index: usize, path: &Path) {
        match self.previews.load(path) {
            Ok(img) => {
                self.emit(SessionEvent::ImageLoaded {
                    index,
                    width: img.width(),
                    height: img.height(),
                });
                self.preview = Some(img);
            }
            Err(e) => {
                warn!(?path, error = ?e, "Cannot load image");
                self.preview = None;
                let err = CaptionError::ImageDecode {
                    path: path.to_path_buf(),
                    reason: format!("{e:#}"),
                };
                self.emit(SessionEvent::Warning {
                    kind: WarningKind::ImageDecode,
                    message: err.to_string(),
                });
            }
        }
    }

    fn save_if_dirty(&mut self, index: usize) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        // Path is taken from the asset the buffer was edited for.
        let path = self.assets[index].path().to_path_buf();
        if self.unreadable {
            return Err(CaptionError::SidecarUnreadable { image: path });
        }
        self.backend.save(&path, &self.buffer)?;
        self.dirty = false;
        Ok(())
    }

    fn viewing(&self) -> Result<usize> {
        match self.state {
            SessionState::Viewing(index) => Ok(index),
            SessionState::Empty => Err(CaptionError::NoAssets),
            SessionState::Closed => Err(CaptionError::SessionClosed),
        }
    }

    fn emit(&self, event: SessionEvent) {
        // A closed receiver means nobody is listening any more.
        let _ = self.events.send(event);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            SessionState::Viewing(index) => Some(index),
            _ => None,
        }
    }

    pub fn current_asset(&self) -> Option<&ImageAsset> {
        self.current_index().map(|i| &self.assets[i])
    }

    pub fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    pub fn record(&self) -> &CaptionRecord {
        &self.buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True when the current caption file exists but could not be read.
    pub fn is_unreadable(&self) -> bool {
        self.unreadable
    }

    pub fn preview(&self) -> Option<&Arc<DynamicImage>> {
        self.preview.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
