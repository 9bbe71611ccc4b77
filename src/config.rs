//! Runtime configuration and command line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::scanner::file_scanner::ScanConfig;

/// Default edge length of list icons in pixels.
pub const DEFAULT_ICON_SIZE: u32 = 64;

/// Default extension of caption sidecar files.
pub const DEFAULT_CAPTION_EXTENSION: &str = "txt";

/// Capacity of the worker -> control thread result channel.
const DEFAULT_RESULT_CAPACITY: usize = 1;

/// Number of decoded previews kept for quick back-and-forth navigation.
const DEFAULT_PREVIEW_CACHE_ENTRIES: usize = 8;

/// Configuration shared by the scanner, prefetch queue and session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Icon edge length used by the thumbnail prefetch queue.
    pub icon_size: u32,
    /// Extension of the caption sidecar file, without the dot.
    pub caption_extension: String,
    /// Bounded capacity of the thumbnail result channel.
    pub result_capacity: usize,
    /// Number of full-size previews held in memory.
    pub preview_cache_entries: usize,
    /// Directory expansion options.
    pub scan: ScanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            icon_size: DEFAULT_ICON_SIZE,
            caption_extension: DEFAULT_CAPTION_EXTENSION.to_string(),
            result_capacity: DEFAULT_RESULT_CAPACITY,
            preview_cache_entries: DEFAULT_PREVIEW_CACHE_ENTRIES,
            scan: ScanConfig::default(),
        }
    }
}

impl Config {
    pub fn with_icon_size(mut self, size: u32) -> Self {
        self.icon_size = size.max(1);
        self
    }

    pub fn with_caption_extension(mut self, ext: impl Into<String>) -> Self {
        let ext = ext.into();
        self.caption_extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.scan.recursive = recursive;
        self
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "fgallery image caption editor", long_about = None)]
pub struct Args {
    /// Images or directories to caption (defaults to the current directory)
    #[arg(value_name = "IMAGE")]
    pub images: Vec<PathBuf>,

    /// Edge length of list thumbnails in pixels
    #[arg(long, default_value_t = DEFAULT_ICON_SIZE)]
    pub icon_size: u32,

    /// Extension of caption sidecar files
    #[arg(long, default_value = DEFAULT_CAPTION_EXTENSION)]
    pub extension: String,

    /// Descend into subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Input paths, falling back to the current directory.
    pub fn inputs(&self) -> Vec<PathBuf> {
        if self.images.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.images.clone()
        }
    }

    pub fn config(&self) -> Config {
        Config::default()
            .with_icon_size(self.icon_size)
            .with_caption_extension(self.extension.clone())
            .with_recursive(self.recursive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.icon_size, 64);
        assert_eq!(config.caption_extension, "txt");
        assert_eq!(config.result_capacity, 1);
        assert!(!config.scan.recursive);
    }

    #[test]
    fn test_extension_strips_dot() {
        let config = Config::default().with_caption_extension(".caption");
        assert_eq!(config.caption_extension, "caption");
    }

    #[test]
    fn test_args_into_config() {
        let args = Args::parse_from(["fcaption", "--icon-size", "96", "--recursive", "pics"]);
        let config = args.config();
        assert_eq!(config.icon_size, 96);
        assert!(config.scan.recursive);
        assert_eq!(args.inputs(), vec![PathBuf::from("pics")]);
    }

    #[test]
    fn test_args_default_to_current_dir() {
        let args = Args::parse_from(["fcaption"]);
        assert_eq!(args.inputs(), vec![PathBuf::from(".")]);
    }
}
