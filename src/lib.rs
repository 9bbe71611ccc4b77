//! Caption editor core: chronological ordering of images, sequential
//! thumbnail prefetch and a caption session that autosaves sidecar files on
//! navigation.

pub mod app;
pub mod captions;
pub mod config;
pub mod error;
pub mod image_loader;
pub mod models;
pub mod scanner;
pub mod thumbnails;

pub use error::{CaptionError, Result};
