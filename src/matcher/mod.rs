//! Pixel-wise block matcher.
//!
//! For every pixel of the (possibly subsampled) output grid the matcher
//! scans all integer disparities `(dx, dy)` of the active search window and
//! keeps the candidate whose right block best agrees with the left block
//! under the configured metric. Three rasters are produced: horizontal
//! disparity, vertical disparity and the optimal metric value, plus a mask
//! telling selected candidates apart from default values.
//!
//! Degenerate pixels never fail:
//! - masked pixels (left or right mask `<= 0` at the pixel) and
//! - pixels without any admissible candidate (right block out of the image,
//!   empty exploration window, masked right centres, degenerate scores)
//!
//! receive the minimum disparity bounds and a zero metric.
//!
//! ```
//! use block_disparity::image::ImageF32;
//! use block_disparity::matcher::{BlockMatcher, MatchOptions, StereoPair};
//!
//! let left = ImageF32::from_fn(32, 16, |x, y| ((x * 7 + y * 13) % 11) as f32);
//! let right = ImageF32::from_fn(32, 16, |x, y| ((x.saturating_sub(2) * 7 + y * 13) % 11) as f32);
//! let matcher = BlockMatcher::new(MatchOptions::default().with_radius(2).with_hdisp(-4, 4))?;
//! let (maps, report) = matcher.compute(&StereoPair::new(&left, &right))?;
//! assert_eq!(maps.hdisp.w, 32);
//! assert_eq!(report.masked, 0);
//! # Ok::<(), block_disparity::ConfigError>(())
//! ```

mod block;
pub mod grid;
pub mod options;
mod search;

pub(crate) use self::block::BlockEvaluator;
pub(crate) use self::search::SearchSetup;
pub use self::grid::SubsampleGrid;
pub use self::options::{Exploration, MatchOptions};

use crate::diagnostics::MatchReport;
use crate::error::{ensure_size, ConfigError};
use crate::image::ImageF32;
use crate::metric::Scorer;
use crate::tiling::{partition_rows, run_regions, stitch_rows, ProgressFn};
use log::debug;
use search::MatchStats;
use std::time::Instant;

/// Read-only inputs of one matching run.
#[derive(Clone, Copy, Debug)]
pub struct StereoPair<'a> {
    pub left: &'a ImageF32,
    pub right: &'a ImageF32,
    /// Same grid as `left`; valid iff `> 0`.
    pub left_mask: Option<&'a ImageF32>,
    /// Same grid as `right`; valid iff `> 0`.
    pub right_mask: Option<&'a ImageF32>,
    /// Per-pixel initial estimates on the `left` grid, used by
    /// [`Exploration::Maps`].
    pub initial_hdisp: Option<&'a ImageF32>,
    pub initial_vdisp: Option<&'a ImageF32>,
}

impl<'a> StereoPair<'a> {
    pub fn new(left: &'a ImageF32, right: &'a ImageF32) -> Self {
        Self {
            left,
            right,
            left_mask: None,
            right_mask: None,
            initial_hdisp: None,
            initial_vdisp: None,
        }
    }

    pub fn with_left_mask(mut self, mask: &'a ImageF32) -> Self {
        self.left_mask = Some(mask);
        self
    }

    pub fn with_right_mask(mut self, mask: &'a ImageF32) -> Self {
        self.right_mask = Some(mask);
        self
    }

    pub fn with_masks(self, left: Option<&'a ImageF32>, right: Option<&'a ImageF32>) -> Self {
        Self {
            left_mask: left,
            right_mask: right,
            ..self
        }
    }

    pub fn with_initial_disparity(mut self, hdisp: &'a ImageF32, vdisp: &'a ImageF32) -> Self {
        self.initial_hdisp = Some(hdisp);
        self.initial_vdisp = Some(vdisp);
        self
    }

    /// The pair seen from the right image: images and masks swapped, no
    /// initial estimates.
    pub fn reversed(&self) -> StereoPair<'a> {
        StereoPair {
            left: self.right,
            right: self.left,
            left_mask: self.right_mask,
            right_mask: self.left_mask,
            initial_hdisp: None,
            initial_vdisp: None,
        }
    }

    /// Check that every attached raster lives on the grid it belongs to.
    pub fn validate(&self, exploration: &Exploration) -> Result<(), ConfigError> {
        if self.left.is_empty() {
            return Err(ConfigError::EmptyImage { name: "left image" });
        }
        if self.right.is_empty() {
            return Err(ConfigError::EmptyImage {
                name: "right image",
            });
        }
        let left_size = (self.left.w, self.left.h);
        let right_size = (self.right.w, self.right.h);
        if let Some(m) = self.left_mask {
            ensure_size("left mask", left_size, (m.w, m.h))?;
        }
        if let Some(m) = self.right_mask {
            ensure_size("right mask", right_size, (m.w, m.h))?;
        }
        if let Some(m) = self.initial_hdisp {
            ensure_size("initial horizontal disparity", left_size, (m.w, m.h))?;
        }
        if let Some(m) = self.initial_vdisp {
            ensure_size("initial vertical disparity", left_size, (m.w, m.h))?;
        }
        if matches!(exploration, Exploration::Maps { .. })
            && (self.initial_hdisp.is_none() || self.initial_vdisp.is_none())
        {
            return Err(ConfigError::MissingInitialDisparity);
        }
        Ok(())
    }
}

/// Integer disparity rasters produced by the matcher, on the output grid.
#[derive(Clone, Debug)]
pub struct DisparityMaps {
    pub hdisp: ImageF32,
    pub vdisp: ImageF32,
    pub metric: ImageF32,
    /// 255 where a candidate was selected, 0 where the default was written.
    pub mask: ImageF32,
    pub grid: SubsampleGrid,
}

/// Validated block matcher.
#[derive(Clone, Debug)]
pub struct BlockMatcher {
    options: MatchOptions,
    scorer: Scorer,
}

impl BlockMatcher {
    pub fn new(options: MatchOptions) -> Result<Self, ConfigError> {
        let options = MatchOptions {
            metric: options.metric.sanitized(),
            ..options
        };
        options.validate()?;
        let scorer = options.metric.scorer();
        Ok(Self { options, scorer })
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn compute(
        &self,
        pair: &StereoPair<'_>,
    ) -> Result<(DisparityMaps, MatchReport), ConfigError> {
        self.compute_with_progress(pair, None)
    }

    /// Run the matcher, reporting each completed band through `progress`.
    pub fn compute_with_progress(
        &self,
        pair: &StereoPair<'_>,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<(DisparityMaps, MatchReport), ConfigError> {
        let t0 = Instant::now();
        pair.validate(&self.options.exploration)?;
        let grid = SubsampleGrid::new(
            pair.left.w,
            pair.left.h,
            self.options.step,
            self.options.grid_index,
        )?;
        let setup = SearchSetup {
            pair: *pair,
            grid,
            hbounds: self.options.hbounds(),
            vbounds: self.options.vbounds(),
            exploration: self.options.exploration,
            radius: self.options.radius,
            scorer: self.scorer,
        };

        let (out_w, out_h) = grid.output_size;
        let regions = partition_rows(out_w, out_h, self.options.parallel.rows_per_region);
        debug!(
            "BlockMatcher: {}x{} -> {}x{} ({} bands), h={:?} v={:?} metric={}",
            pair.left.w,
            pair.left.h,
            out_w,
            out_h,
            regions.len(),
            setup.hbounds,
            setup.vbounds,
            self.options.metric.label()
        );
        let bands = run_regions(&regions, &self.options.parallel, progress, |band| {
            setup.match_band(band)
        });

        let mut stats = MatchStats::default();
        for band in &bands {
            stats.merge(&band.stats);
        }
        let mut hdisp = Vec::with_capacity(bands.len());
        let mut vdisp = Vec::with_capacity(bands.len());
        let mut metric = Vec::with_capacity(bands.len());
        let mut mask = Vec::with_capacity(bands.len());
        for band in bands {
            hdisp.push(band.hdisp);
            vdisp.push(band.vdisp);
            metric.push(band.metric);
            mask.push(band.valid);
        }
        let maps = DisparityMaps {
            hdisp: stitch_rows(out_w, out_h, hdisp),
            vdisp: stitch_rows(out_w, out_h, vdisp),
            metric: stitch_rows(out_w, out_h, metric),
            mask: stitch_rows(out_w, out_h, mask),
            grid,
        };

        let report = MatchReport {
            output_width: out_w,
            output_height: out_h,
            metric: self.options.metric.label().to_string(),
            regions: regions.len(),
            masked: stats.masked,
            no_candidate: stats.no_candidate,
            candidates_evaluated: stats.candidates,
            elapsed_ms: t0.elapsed().as_secs_f64() * 1000.0,
        };
        debug!(
            "BlockMatcher: masked={} no_candidate={} candidates={} in {:.2} ms",
            report.masked, report.no_candidate, report.candidates_evaluated, report.elapsed_ms
        );
        Ok((maps, report))
    }
}
