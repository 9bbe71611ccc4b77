//! Sequential thumbnail prefetch queue.
//!
//! - One background worker decodes the backlog in position order
//! - Exactly one decode is in flight at a time
//! - Results go back to the control thread over a bounded flume channel and
//!   are addressed by list position, never by the current selection
//!
//! Dropping or shutting down the queue makes the worker stop after the decode
//! it is currently running; that result is discarded.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use image::RgbaImage;
use tracing::{debug, trace, warn};

use super::generator::ThumbnailGenerator;

/// A pending unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogEntry {
    /// List position this thumbnail decorates.
    pub position: usize,
    /// Path to the source image.
    pub path: PathBuf,
}

/// Completed thumbnail for one list position.
#[derive(Debug, Clone)]
pub struct ThumbnailResult {
    pub position: usize,
    /// Scaled image, or `None` when decoding failed.
    pub image: Option<RgbaImage>,
}

/// Background decoder for list icons.
pub struct ThumbnailPrefetchQueue {
    result_rx: Receiver<ThumbnailResult>,
    worker: JoinHandle<()>,
    total: usize,
    delivered: usize,
    /// The worker is gone; nothing more will arrive.
    disconnected: bool,
}

impl ThumbnailPrefetchQueue {
    /// Start prefetching icons for `paths` using the image crate decoder.
    pub fn start(paths: &[PathBuf], icon_size: u32, capacity: usize) -> Result<Self> {
        Self::start_with_decoder(paths, icon_size, capacity, ThumbnailGenerator::decode_scaled)
    }

    /// Start prefetching with a custom decoder.
    pub fn start_with_decoder<F>(
        paths: &[PathBuf],
        icon_size: u32,
        capacity: usize,
        decode: F,
    ) -> Result<Self>
    where
        F: Fn(&Path, u32) -> Result<RgbaImage> + Send + 'static,
    {
        let backlog: VecDeque<BacklogEntry> = paths
            .iter()
            .enumerate()
            .map(|(position, path)| BacklogEntry {
                position,
                path: path.clone(),
            })
            .collect();
        let total = backlog.len();

        let (result_tx, result_rx) = flume::bounded(capacity.max(1));

        let worker = thread::Builder::new()
            .name("thumb-prefetch".to_string())
            .spawn(move || worker_loop(backlog, icon_size, result_tx, decode))
            .context("Failed to spawn thumbnail worker")?;

        debug!(total, icon_size, "Started thumbnail prefetch");

        Ok(Self {
            result_rx,
            worker,
            total,
            delivered: 0,
            disconnected: false,
        })
    }

    /// Take the next completed result without blocking.
    pub fn try_next(&mut self) -> Option<ThumbnailResult> {
        match self.result_rx.try_recv() {
            Ok(result) => {
                self.delivered += 1;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.mark_disconnected();
                None
            }
        }
    }

    /// Wait up to `timeout` for the next completed result.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<ThumbnailResult> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(result) => {
                self.delivered += 1;
                Some(result)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                self.mark_disconnected();
                None
            }
        }
    }

    fn mark_disconnected(&mut self) {
        if !self.disconnected && self.delivered < self.total {
            warn!(
                delivered = self.delivered,
                total = self.total,
                "Thumbnail worker exited early"
            );
        }
        self.disconnected = true;
    }

    /// Number of entries in the backlog at start.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of results handed to the consumer so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// True once every backlog entry has been delivered, or the worker died
    /// and no further results can arrive.
    pub fn is_finished(&self) -> bool {
        self.delivered >= self.total || self.disconnected
    }

    /// Stop accepting results and wait for the in-flight decode to finish.
    ///
    /// Undelivered results are discarded.
    pub fn shutdown(self) {
        let Self {
            result_rx, worker, ..
        } = self;
        drop(result_rx);
        if worker.join().is_err() {
            warn!("Thumbnail worker panicked");
        }
        debug!("Thumbnail prefetch shut down");
    }
}

/// Worker thread loop.
fn worker_loop<F>(
    mut backlog: VecDeque<BacklogEntry>,
    icon_size: u32,
    tx: Sender<ThumbnailResult>,
    decode: F,
) where
    F: Fn(&Path, u32) -> Result<RgbaImage>,
{
    debug!("Thumbnail worker started");

    while let Some(entry) = backlog.pop_front() {
        trace!(position = entry.position, path = ?entry.path, "Decoding thumbnail");

        let image = match decode(&entry.path, icon_size) {
            Ok(img) => Some(img),
            Err(e) => {
                warn!(path = ?entry.path, error = ?e, "Failed to generate thumbnail");
                None
            }
        };

        let result = ThumbnailResult {
            position: entry.position,
            image,
        };
        if tx.send(result).is_err() {
            debug!(remaining = backlog.len(), "Consumer gone, stopping thumbnail worker");
            return;
        }
    }

    debug!("Thumbnail worker finished backlog");
}
