//! Parameter types configuring the block matcher.
//!
//! Defaults follow the usual satellite stereo setup: a 7×7 block (radius 3),
//! a ±10 pixel horizontal search, no vertical search and full-resolution
//! output.

use crate::error::{Axis, ConfigError};
use crate::image::Span;
use crate::metric::MetricKind;
use crate::tiling::ParallelOptions;
use log::warn;
use serde::{Deserialize, Serialize};

/// How the per-pixel search window is derived.
///
/// - `Global`: every pixel explores the full disparity bounds.
/// - `Uniform`: every pixel explores `[hdisp ± radius_x] × [vdisp ± radius_y]`.
/// - `Maps`: same as `Uniform`, centred on per-pixel initial disparities that
///   are handed to the matcher as rasters (see `StereoPair`).
///
/// Local windows are always intersected with the global bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Exploration {
    #[default]
    Global,
    Uniform {
        hdisp: i32,
        vdisp: i32,
        radius_x: u32,
        radius_y: u32,
    },
    Maps {
        radius_x: u32,
        radius_y: u32,
    },
}

/// Block matcher configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Block half-size; blocks are `(2·radius+1)²` pixels.
    pub radius: usize,
    pub min_hdisp: i32,
    pub max_hdisp: i32,
    pub min_vdisp: i32,
    pub max_vdisp: i32,
    /// Process one pixel out of `step` along each axis.
    pub step: usize,
    /// Phase `[x, y]` of the subsample grid, each in `[0, step - 1]`.
    pub grid_index: [usize; 2],
    pub metric: MetricKind,
    pub exploration: Exploration,
    pub parallel: ParallelOptions,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            radius: 3,
            min_hdisp: -10,
            max_hdisp: 10,
            min_vdisp: 0,
            max_vdisp: 0,
            step: 1,
            grid_index: [0, 0],
            metric: MetricKind::Ssd,
            exploration: Exploration::Global,
            parallel: ParallelOptions::default(),
        }
    }
}

impl MatchOptions {
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_hdisp(mut self, min: i32, max: i32) -> Self {
        self.min_hdisp = min;
        self.max_hdisp = max;
        self
    }

    pub fn with_vdisp(mut self, min: i32, max: i32) -> Self {
        self.min_vdisp = min;
        self.max_vdisp = max;
        self
    }

    pub fn with_step(mut self, step: usize, grid_index: [usize; 2]) -> Self {
        self.step = step;
        self.grid_index = grid_index;
        self
    }

    pub fn with_metric(mut self, metric: MetricKind) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_exploration(mut self, exploration: Exploration) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_parallel(mut self, parallel: ParallelOptions) -> Self {
        self.parallel = parallel;
        self
    }

    #[inline]
    pub fn hbounds(&self) -> Span {
        Span::new(self.min_hdisp, self.max_hdisp)
    }

    #[inline]
    pub fn vbounds(&self) -> Span {
        Span::new(self.min_vdisp, self.max_vdisp)
    }

    /// Check every parameter that does not depend on the input rasters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.radius < 1 {
            return Err(ConfigError::InvalidRadius {
                radius: self.radius,
            });
        }
        if self.min_hdisp > self.max_hdisp {
            return Err(ConfigError::InvertedBounds {
                axis: Axis::Horizontal,
                min: self.min_hdisp,
                max: self.max_hdisp,
            });
        }
        if self.min_vdisp > self.max_vdisp {
            return Err(ConfigError::InvertedBounds {
                axis: Axis::Vertical,
                min: self.min_vdisp,
                max: self.max_vdisp,
            });
        }
        if self.step < 1 {
            return Err(ConfigError::InvalidStep);
        }
        if self.grid_index.iter().any(|&g| g >= self.step) {
            return Err(ConfigError::GridIndexOutOfRange {
                grid_index: self.grid_index,
                step: self.step,
            });
        }
        if let Exploration::Uniform {
            hdisp,
            vdisp,
            radius_x,
            radius_y,
        } = self.exploration
        {
            let h = Span::around(hdisp, radius_x.min(i32::MAX as u32) as i32).clip(self.hbounds());
            let v = Span::around(vdisp, radius_y.min(i32::MAX as u32) as i32).clip(self.vbounds());
            if h.is_empty() || v.is_empty() {
                warn!(
                    "BlockMatcher: uniform exploration around ({hdisp}, {vdisp}) misses the disparity bounds; every pixel will get the default value"
                );
            }
        }
        Ok(())
    }
}
