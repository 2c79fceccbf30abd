//! Left/right coherency check.
//!
//! A left pixel `p` with direct disparity `d` is coherent when the reverse
//! disparity `d'` read at the nearest right pixel `round(p + d)` brings it
//! back: `|d.h + d'.h| <= tolerance` and `|d.v + d'.v| <= tolerance`. The
//! direct disparity must also lie within the disparity bounds.

use crate::error::{ensure_size, ConfigError};
use crate::image::{ImageF32, Span};
use crate::masking::{is_valid, MASK_INVALID, MASK_VALID};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BijectionOptions {
    pub tolerance: f32,
}

impl Default for BijectionOptions {
    fn default() -> Self {
        Self { tolerance: 0.5 }
    }
}

impl BijectionOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "bijection.tolerance",
                reason: format!("must be >= 0 (got {})", self.tolerance),
            });
        }
        Ok(())
    }
}

/// Direct maps live on the left grid, reverse maps on the right grid.
#[derive(Clone, Copy, Debug)]
pub struct BijectionInput<'a> {
    pub direct_h: &'a ImageF32,
    pub direct_v: &'a ImageF32,
    pub reverse_h: &'a ImageF32,
    pub reverse_v: &'a ImageF32,
    /// Pixels already invalid on the left grid.
    pub left_mask: Option<&'a ImageF32>,
    pub hbounds: Span,
    pub vbounds: Span,
}

#[derive(Clone, Debug)]
pub struct BijectionOutput {
    pub mask: ImageF32,
    /// Valid input pixels rejected by the check.
    pub rejected: usize,
}

pub fn bijection_mask(
    input: &BijectionInput<'_>,
    opts: &BijectionOptions,
) -> Result<BijectionOutput, ConfigError> {
    opts.validate()?;
    let (w, h) = (input.direct_h.w, input.direct_h.h);
    ensure_size("direct vertical disparity", (w, h), (input.direct_v.w, input.direct_v.h))?;
    let right = (input.reverse_h.w, input.reverse_h.h);
    ensure_size("reverse vertical disparity", right, (input.reverse_v.w, input.reverse_v.h))?;
    if let Some(m) = input.left_mask {
        ensure_size("left mask", (w, h), (m.w, m.h))?;
    }

    let hb = (input.hbounds.lo as f32, input.hbounds.hi as f32);
    let vb = (input.vbounds.lo as f32, input.vbounds.hi as f32);
    let mut rejected = 0usize;
    let mask = ImageF32::from_fn(w, h, |x, y| {
        if input.left_mask.is_some_and(|m| !is_valid(m.get(x, y))) {
            return MASK_INVALID;
        }
        let hd = input.direct_h.get(x, y);
        let vd = input.direct_v.get(x, y);
        let coherent = hd >= hb.0
            && hd <= hb.1
            && vd >= vb.0
            && vd <= vb.1
            && {
                let rx = (x as f32 + hd).round() as isize;
                let ry = (y as f32 + vd).round() as isize;
                match (
                    input.reverse_h.get_checked(rx, ry),
                    input.reverse_v.get_checked(rx, ry),
                ) {
                    (Some(rh), Some(rv)) => {
                        (hd + rh).abs() <= opts.tolerance && (vd + rv).abs() <= opts.tolerance
                    }
                    _ => false,
                }
            };
        if coherent {
            MASK_VALID
        } else {
            rejected += 1;
            MASK_INVALID
        }
    });
    Ok(BijectionOutput { mask, rejected })
}
