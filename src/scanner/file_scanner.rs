//! Expansion of command line inputs into candidate image files.
//!
//! Files named directly are passed through untouched. Directories are listed
//! with walkdir and filtered by content sniffing, so an image with a wrong or
//! missing extension is still found and a `.txt` caption never is.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Number of leading bytes read to recognise an image format.
const SNIFF_LEN: usize = 64;

/// Configuration for directory expansion.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Whether to follow symbolic links.
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            follow_symlinks: false,
        }
    }
}

/// Discovers candidate images from files and directories.
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Expand `inputs` into a list of candidate paths.
    pub fn expand(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for input in inputs {
            if input.is_dir() {
                files.extend(self.discover_images(input));
            } else {
                files.push(input.clone());
            }
        }
        info!("Collected {} candidate files", files.len());
        files
    }

    /// Lists image files in `dir`, sorted by path.
    fn discover_images(&self, dir: &Path) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(dir).follow_links(self.config.follow_symlinks);
        if !self.config.recursive {
            walker = walker.max_depth(1);
        }

        let mut found = Vec::new();
        for entry in walker.into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry under {:?}: {}", dir, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if sniff_image_format(path).is_some() {
                found.push(path.to_path_buf());
            } else {
                trace!(?path, "Not an image");
            }
        }

        found.sort();
        debug!("Discovered {} images in {:?}", found.len(), dir);
        found
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Recognise an image by its magic bytes.
pub fn sniff_image_format(path: &Path) -> Option<ImageFormat> {
    let file = File::open(path).ok()?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    BufReader::new(file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .ok()?;
    image::guess_format(&head).ok()
}
