//! Chronological ordering of candidate images.

use std::path::PathBuf;

use tracing::{info, warn};

use super::metadata::{CaptureTimeSource, ExifCaptureTime, MetadataKeyExtractor};
use crate::error::{CaptionError, Result};
use crate::models::ImageAsset;

pub use crate::error::SkippedPath;

/// Result of ordering a set of candidate paths.
#[derive(Debug)]
pub struct OrderResult {
    /// Assets sorted by capture time, subsecond, then path.
    pub assets: Vec<ImageAsset>,
    /// Paths whose capture time could not be read.
    pub skipped: Vec<SkippedPath>,
}

/// Sorts images by their embedded capture time.
pub struct ChronologicalOrderer<S = ExifCaptureTime> {
    extractor: MetadataKeyExtractor<S>,
}

impl ChronologicalOrderer<ExifCaptureTime> {
    pub fn new() -> Self {
        Self {
            extractor: MetadataKeyExtractor::new(),
        }
    }
}

impl Default for ChronologicalOrderer<ExifCaptureTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: CaptureTimeSource> ChronologicalOrderer<S> {
    pub fn with_source(source: S) -> Self {
        Self {
            extractor: MetadataKeyExtractor::with_source(source),
        }
    }

    /// Order `paths` ascending by capture time.
    ///
    /// Every path is examined; files without usable metadata are collected in
    /// `skipped` rather than aborting. Returns `EmptyInput`, still carrying
    /// the skipped paths, when nothing remains to caption.
    pub fn order<I>(&self, paths: I) -> Result<OrderResult>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut assets = Vec::new();
        let mut skipped = Vec::new();

        for path in paths {
            match self.extractor.extract(&path) {
                Ok(key) => assets.push(ImageAsset::new(key)),
                Err(error) => {
                    warn!(?path, %error, "Skipping file without capture time");
                    skipped.push(SkippedPath { path, error });
                }
            }
        }

        // Same path given twice collapses to a single asset.
        assets.sort();
        assets.dedup_by(|a, b| a.path() == b.path());

        info!(
            "Ordered {} images, skipped {}",
            assets.len(),
            skipped.len()
        );

        if assets.is_empty() {
            return Err(CaptionError::EmptyInput { skipped });
        }

        Ok(OrderResult { assets, skipped })
    }
}
