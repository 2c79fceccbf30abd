//! Filters applied to disparity maps after matching and refinement.
//!
//! Every filter produces a 255/0 mask; [`combine_masks`] merges them into the
//! final validity mask of a pipeline run.

pub mod bijection;
pub mod median;
pub mod threshold;

pub use bijection::{bijection_mask, BijectionInput, BijectionOptions, BijectionOutput};
pub use median::{median_filter, MedianOptions, MedianOutput};
pub use threshold::metric_threshold_mask;

use crate::error::{ensure_size, ConfigError};
use crate::image::ImageF32;
use crate::masking::{is_valid, MASK_INVALID, MASK_VALID};

/// Pixel-wise AND of two validity masks.
pub fn combine_masks(a: &ImageF32, b: &ImageF32) -> Result<ImageF32, ConfigError> {
    ensure_size("mask", (a.w, a.h), (b.w, b.h))?;
    Ok(ImageF32::from_fn(a.w, a.h, |x, y| {
        if is_valid(a.get(x, y)) && is_valid(b.get(x, y)) {
            MASK_VALID
        } else {
            MASK_INVALID
        }
    }))
}

/// Number of valid pixels in a mask.
pub fn count_valid(mask: &ImageF32) -> usize {
    mask.data.iter().filter(|&&v| is_valid(v)).count()
}
