//! Error taxonomy for ordering, prefetch and caption sessions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the captioning core.
///
/// Per-file problems (`MetadataUnavailable`, `ImageDecode`) are collected or
/// reported as warnings. Write failures (`SidecarIo`, `SidecarUnreadable`) are
/// always returned to the caller so a caption is never lost silently.
#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("no capture timestamp in {path:?}: {reason}")]
    MetadataUnavailable { path: PathBuf, reason: String },

    /// Nothing survived ordering. Carries the paths left out so the caller
    /// can still report why.
    #[error("no files to caption")]
    EmptyInput { skipped: Vec<SkippedPath> },

    #[error("cannot load {path:?}: {reason}")]
    ImageDecode { path: PathBuf, reason: String },

    #[error("caption file {path:?}: {source}")]
    SidecarIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("caption for {image:?} could not be read; not overwriting it")]
    SidecarUnreadable { image: PathBuf },

    #[error("index {index} out of range for {len} images")]
    InvalidIndex { index: usize, len: usize },

    #[error("session has no images")]
    NoAssets,

    #[error("session is closed")]
    SessionClosed,
}

impl CaptionError {
    pub fn metadata(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MetadataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn sidecar(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SidecarIo {
            path: path.into(),
            source,
        }
    }
}

/// A path left out of the ordering and why.
#[derive(Debug)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub error: CaptionError,
}

pub type Result<T> = std::result::Result<T, CaptionError>;
