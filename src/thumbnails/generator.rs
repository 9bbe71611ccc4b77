//! Thumbnail generation using the image crate.
//!
//! Scales an image to fit inside a square icon box while preserving its
//! aspect ratio.

use std::path::Path;

use anyhow::Result;
use image::imageops::FilterType;
use image::{GenericImageView, RgbaImage};
use tracing::debug;

use crate::image_loader::open_image;

/// Produces list icons from source images.
pub struct ThumbnailGenerator;

impl ThumbnailGenerator {
    /// Decode `src` and scale it to fit within `icon_size` x `icon_size`.
    pub fn decode_scaled(src: &Path, icon_size: u32) -> Result<RgbaImage> {
        let img = open_image(src)?;
        let (src_width, src_height) = img.dimensions();

        let (thumb_width, thumb_height) =
            Self::calculate_dimensions(src_width, src_height, icon_size);

        debug!(
            ?src,
            src_width, src_height, thumb_width, thumb_height, "Scaling thumbnail"
        );

        // CatmullRom provides good quality/speed balance for downscaling
        let thumbnail = img.resize_exact(thumb_width, thumb_height, FilterType::CatmullRom);
        Ok(thumbnail.to_rgba8())
    }

    /// Dimensions of the largest box with the source aspect ratio that fits in
    /// a `box_size` square.
    fn calculate_dimensions(src_width: u32, src_height: u32, box_size: u32) -> (u32, u32) {
        let box_size = box_size.max(1);
        if src_height == 0 || src_width == 0 {
            return (box_size, box_size);
        }

        let aspect_ratio = src_width as f64 / src_height as f64;
        let (w, h) = if src_width >= src_height {
            (box_size as f64, box_size as f64 / aspect_ratio)
        } else {
            (box_size as f64 * aspect_ratio, box_size as f64)
        };

        ((w.round() as u32).max(1), (h.round() as u32).max(1))
    }
}
