//! Mask-aware median filter on a disparity map.
//!
//! Each valid pixel is replaced by the median of the valid, finite samples in
//! its `(2r+1)²` window. A pixel whose original value is farther than
//! `incoherence_threshold` from that median is flagged incoherent in the
//! output mask. Invalid pixels keep their value and stay invalid.

use crate::error::{ensure_size, ConfigError};
use crate::image::ImageF32;
use crate::masking::{is_valid, MASK_INVALID, MASK_VALID};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedianOptions {
    pub radius: usize,
    /// Maximum distance (pixels) between a disparity and its local median.
    pub incoherence_threshold: f32,
}

impl Default for MedianOptions {
    fn default() -> Self {
        Self {
            radius: 2,
            incoherence_threshold: 1.0,
        }
    }
}

impl MedianOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius < 1 {
            return Err(ConfigError::InvalidParameter {
                name: "median.radius",
                reason: "must be >= 1".to_string(),
            });
        }
        if !(self.incoherence_threshold >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "median.incoherence_threshold",
                reason: format!("must be >= 0 (got {})", self.incoherence_threshold),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct MedianOutput {
    pub filtered: ImageF32,
    /// 255 where the pixel was valid and coherent, 0 otherwise.
    pub mask: ImageF32,
    pub incoherent: usize,
}

pub fn median_filter(
    disparity: &ImageF32,
    mask: Option<&ImageF32>,
    opts: &MedianOptions,
) -> Result<MedianOutput, ConfigError> {
    opts.validate()?;
    if let Some(m) = mask {
        ensure_size("median mask", (disparity.w, disparity.h), (m.w, m.h))?;
    }
    let (w, h) = (disparity.w, disparity.h);
    let r = opts.radius;
    let valid_at = |x: usize, y: usize| mask.map_or(true, |m| is_valid(m.get(x, y)));

    let mut filtered = disparity.clone();
    let mut out_mask = ImageF32::filled(w, h, MASK_INVALID);
    let mut incoherent = 0usize;
    let mut window = Vec::with_capacity((2 * r + 1) * (2 * r + 1));

    for y in 0..h {
        for x in 0..w {
            let v = disparity.get(x, y);
            if !valid_at(x, y) || !v.is_finite() {
                continue;
            }
            window.clear();
            for wy in y.saturating_sub(r)..(y + r + 1).min(h) {
                for wx in x.saturating_sub(r)..(x + r + 1).min(w) {
                    let s = disparity.get(wx, wy);
                    if s.is_finite() && valid_at(wx, wy) {
                        window.push(s);
                    }
                }
            }
            let med = median(&mut window).unwrap_or(v);
            filtered.set(x, y, med);
            if (v - med).abs() > opts.incoherence_threshold {
                incoherent += 1;
            } else {
                out_mask.set(x, y, MASK_VALID);
            }
        }
    }
    Ok(MedianOutput {
        filtered,
        mask: out_mask,
        incoherent,
    })
}

/// Median of finite samples; mean of the two middle values for even counts.
fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = values.len();
    Some(if n % 2 == 1 {
        values[n / 2]
    } else {
        0.5 * (values[n / 2 - 1] + values[n / 2])
    })
}
