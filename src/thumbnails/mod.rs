//! Thumbnail pipeline for the caption editor.
//!
//! This module provides:
//! - `ThumbnailGenerator` - Decodes and scales source images to icon size
//! - `ThumbnailPrefetchQueue` - Sequential background worker feeding list icons

pub mod generator;
pub mod queue;
