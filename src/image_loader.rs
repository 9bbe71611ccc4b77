use std::io::Cursor;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use image::{DynamicImage, ImageFormat};
use lru::LruCache;
use tracing::trace;

/// Decode an image, taking the first frame of animated GIFs.
pub fn open_image(path: &Path) -> Result<DynamicImage> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image: {:?}", path))?;
    let format = image::guess_format(&bytes).ok();

    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes))
            .with_context(|| format!("Failed to decode GIF: {:?}", path))?;
        let mut frames = decoder.into_frames();
        if let Some(frame) = frames.next() {
            let frame = frame.context("Failed to decode GIF frame")?;
            return Ok(DynamicImage::ImageRgba8(frame.into_buffer()));
        }
        return Err(anyhow!("GIF has no frames: {:?}", path));
    }

    match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt)
            .with_context(|| format!("Failed to decode image: {:?}", path)),
        None => Err(anyhow!("Unrecognised image format: {:?}", path)),
    }
}

/// Full-size previews of recently viewed images.
pub struct PreviewCache {
    entries: LruCache<PathBuf, Arc<DynamicImage>>,
}

impl PreviewCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Return the cached preview for `path`, decoding it on a miss.
    ///
    /// Failures are not cached so a file fixed on disk loads on the next visit.
    pub fn load(&mut self, path: &Path) -> Result<Arc<DynamicImage>> {
        if let Some(img) = self.entries.get(path) {
            trace!(?path, "Preview cache hit");
            return Ok(Arc::clone(img));
        }
        let img = Arc::new(open_image(path)?);
        self.entries.put(path.to_path_buf(), Arc::clone(&img));
        Ok(img)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
