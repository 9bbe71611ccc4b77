//! Discovery and chronological ordering of images.

pub mod file_scanner;
pub mod metadata;
pub mod order;
