//! Subsampled output grid.
//!
//! Output pixel `(ox, oy)` maps to input pixel
//! `(gx + ox·step, gy + oy·step)` where `(gx, gy)` is the grid phase.

use crate::error::ConfigError;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SubsampleGrid {
    pub step: usize,
    pub phase: [usize; 2],
    /// Input raster size.
    pub input_size: (usize, usize),
    /// Output raster size.
    pub output_size: (usize, usize),
}

impl SubsampleGrid {
    pub fn new(
        input_w: usize,
        input_h: usize,
        step: usize,
        phase: [usize; 2],
    ) -> Result<Self, ConfigError> {
        if step < 1 {
            return Err(ConfigError::InvalidStep);
        }
        if phase[0] >= step || phase[1] >= step {
            return Err(ConfigError::GridIndexOutOfRange {
                grid_index: phase,
                step,
            });
        }
        let out_w = input_w.saturating_sub(phase[0]).div_ceil(step);
        let out_h = input_h.saturating_sub(phase[1]).div_ceil(step);
        Ok(Self {
            step,
            phase,
            input_size: (input_w, input_h),
            output_size: (out_w, out_h),
        })
    }

    /// Identity grid over a `w × h` raster.
    pub fn full(w: usize, h: usize) -> Self {
        Self {
            step: 1,
            phase: [0, 0],
            input_size: (w, h),
            output_size: (w, h),
        }
    }

    #[inline]
    pub fn to_input(&self, ox: usize, oy: usize) -> (usize, usize) {
        (
            self.phase[0] + ox * self.step,
            self.phase[1] + oy * self.step,
        )
    }

    #[inline]
    pub fn output_len(&self) -> usize {
        self.output_size.0 * self.output_size.1
    }
}
