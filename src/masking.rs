//! Validity masks.
//!
//! A mask is an `ImageF32` aligned with its image; a pixel is valid iff its
//! mask value is strictly positive. Masks built here hold [`MASK_VALID`] or
//! [`MASK_INVALID`].
//!
//! The builder combines up to three criteria, all of which must hold:
//! - the optional input mask is `> 0`,
//! - the local sample variance over the block window exceeds
//!   `variance_threshold` (textureless areas cannot be matched),
//! - the pixel differs from the `nodata` value.

use crate::error::{ensure_size, ConfigError};
use crate::image::ImageF32;
use serde::{Deserialize, Serialize};

pub const MASK_VALID: f32 = 255.0;
pub const MASK_INVALID: f32 = 0.0;

/// Validity test shared by every stage.
#[inline]
pub fn is_valid(mask_value: f32) -> bool {
    mask_value > 0.0
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    /// Minimum local variance (exclusive) for a pixel to be valid.
    pub variance_threshold: Option<f32>,
    /// Pixels equal to this value are invalid. `NaN` matches `NaN` pixels.
    pub nodata: Option<f32>,
}

impl MaskOptions {
    pub fn with_variance_threshold(mut self, threshold: f32) -> Self {
        self.variance_threshold = Some(threshold);
        self
    }

    pub fn with_nodata(mut self, nodata: f32) -> Self {
        self.nodata = Some(nodata);
        self
    }

    /// True when no criterion is configured.
    pub fn is_trivial(&self) -> bool {
        self.variance_threshold.is_none() && self.nodata.is_none()
    }
}

/// Build a 255/0 validity mask for `image`. `radius` is the half-size of the
/// variance window and should match the matcher's block radius.
pub fn build_validity_mask(
    image: &ImageF32,
    input_mask: Option<&ImageF32>,
    radius: usize,
    opts: &MaskOptions,
) -> Result<ImageF32, ConfigError> {
    if let Some(m) = input_mask {
        ensure_size("input mask", (image.w, image.h), (m.w, m.h))?;
    }
    if let Some(t) = opts.variance_threshold {
        if t.is_nan() {
            return Err(ConfigError::InvalidParameter {
                name: "variance_threshold",
                reason: "must be a number".to_string(),
            });
        }
    }
    let variance = opts
        .variance_threshold
        .map(|_| local_variance(image, radius));

    Ok(ImageF32::from_fn(image.w, image.h, |x, y| {
        let masked_out = input_mask.is_some_and(|m| !is_valid(m.get(x, y)));
        let flat = match (&variance, opts.variance_threshold) {
            (Some(var), Some(t)) => !(var.get(x, y) > t),
            _ => false,
        };
        let v = image.get(x, y);
        let nodata = opts
            .nodata
            .is_some_and(|nd| if nd.is_nan() { v.is_nan() } else { v == nd });
        if masked_out || flat || nodata {
            MASK_INVALID
        } else {
            MASK_VALID
        }
    }))
}

/// Sample variance (n−1) over the `(2r+1)²` window around every pixel,
/// restricted to the image. Windows holding a single sample get 0.
pub fn local_variance(image: &ImageF32, radius: usize) -> ImageF32 {
    let (w, h) = (image.w, image.h);
    // Summed-area tables of values and squared values, (w+1)×(h+1).
    let sw = w + 1;
    let mut sum = vec![0.0f64; sw * (h + 1)];
    let mut sum_sq = vec![0.0f64; sw * (h + 1)];
    for y in 0..h {
        let mut row_sum = 0.0f64;
        let mut row_sq = 0.0f64;
        for x in 0..w {
            let v = image.get(x, y) as f64;
            row_sum += v;
            row_sq += v * v;
            let i = (y + 1) * sw + x + 1;
            sum[i] = sum[i - sw] + row_sum;
            sum_sq[i] = sum_sq[i - sw] + row_sq;
        }
    }
    let rect = |t: &[f64], x0: usize, y0: usize, x1: usize, y1: usize| {
        t[y1 * sw + x1] - t[y0 * sw + x1] - t[y1 * sw + x0] + t[y0 * sw + x0]
    };

    ImageF32::from_fn(w, h, |x, y| {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius + 1).min(w);
        let y1 = (y + radius + 1).min(h);
        let n = ((x1 - x0) * (y1 - y0)) as f64;
        if n < 2.0 {
            return 0.0;
        }
        let s = rect(&sum, x0, y0, x1, y1);
        let sq = rect(&sum_sq, x0, y0, x1, y1);
        (((sq - s * s / n) / (n - 1.0)).max(0.0)) as f32
    })
}
