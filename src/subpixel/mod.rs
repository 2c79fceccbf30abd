//! Sub-pixel disparity refinement.
//!
//! Consumes the integer maps of a [`BlockMatcher`](crate::BlockMatcher) run
//! together with the image pair, and estimates a fractional correction in
//! `[-1, 1]` per axis from the local shape of the metric around the integer
//! optimum. The neighbouring scores are recomputed from the images, so bands
//! are independent of each other.
//!
//! Every pixel goes through the same extremum guard first; only
//! pixels whose integer disparity is a genuine local optimum reach the
//! selected method. Everything else keeps its integer disparity:
//! masked pixels, unscorable centres, wrong extrema (counted), exact matches
//! and flat metric curvature. Pixels the matcher left invalid (`mask == 0`)
//! are passed through untouched and counted as masked.
//!
//! Metric output: parabolic and triangular keep the metric of the integer
//! pass; dichotomy writes the best score found during its search.

mod dichotomy;
pub(crate) mod extremum;
pub mod fit;
pub mod options;

pub use self::options::{RefineMethod, SubPixelOptions};

use crate::diagnostics::RefineReport;
use crate::error::{ensure_size, Axis, ConfigError};
use crate::image::Region;
use crate::masking::is_valid;
use crate::matcher::{
    BlockEvaluator, DisparityMaps, Exploration, MatchOptions, SearchSetup, StereoPair,
    SubsampleGrid,
};
use crate::metric::Scorer;
use crate::tiling::{partition_rows, run_regions, stitch_rows, ProgressFn};
use extremum::{examine, Guard, Neighbourhood};
use log::debug;
use std::time::Instant;

/// Validated refinement stage. The matching options must be the ones used to
/// produce the integer maps (radius, bounds, metric, grid).
#[derive(Clone, Debug)]
pub struct SubPixelRefiner {
    matching: MatchOptions,
    options: SubPixelOptions,
    scorer: Scorer,
}

struct RefineBand {
    hdisp: Vec<f32>,
    vdisp: Vec<f32>,
    metric: Vec<f32>,
    report: RefineReport,
}

impl SubPixelRefiner {
    pub fn new(matching: &MatchOptions, options: SubPixelOptions) -> Result<Self, ConfigError> {
        let matching = MatchOptions {
            metric: matching.metric.sanitized(),
            ..matching.clone()
        };
        matching.validate()?;
        options.validate()?;
        let scorer = matching.metric.scorer();
        Ok(Self {
            matching,
            options,
            scorer,
        })
    }

    pub fn options(&self) -> &SubPixelOptions {
        &self.options
    }

    pub fn refine(
        &self,
        pair: &StereoPair<'_>,
        maps: &DisparityMaps,
    ) -> Result<(DisparityMaps, RefineReport), ConfigError> {
        self.refine_with_progress(pair, maps, None)
    }

    pub fn refine_with_progress(
        &self,
        pair: &StereoPair<'_>,
        maps: &DisparityMaps,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<(DisparityMaps, RefineReport), ConfigError> {
        let t0 = Instant::now();
        pair.validate(&Exploration::Global)?;
        let grid = SubsampleGrid::new(
            pair.left.w,
            pair.left.h,
            self.matching.step,
            self.matching.grid_index,
        )?;
        check_maps(maps, &grid)?;

        if self.options.method == RefineMethod::None {
            let report = RefineReport {
                method: RefineMethod::None.label().to_string(),
                skipped: grid.output_len(),
                ..RefineReport::default()
            };
            return Ok((maps.clone(), report));
        }

        let setup = SearchSetup {
            pair: *pair,
            grid,
            hbounds: self.matching.hbounds(),
            vbounds: self.matching.vbounds(),
            exploration: Exploration::Global,
            radius: self.matching.radius,
            scorer: self.scorer,
        };
        let (out_w, out_h) = grid.output_size;
        let regions = partition_rows(out_w, out_h, self.matching.parallel.rows_per_region);
        let bands = run_regions(&regions, &self.matching.parallel, progress, |band| {
            self.refine_band(&setup, maps, band)
        });

        let mut report = RefineReport {
            method: self.options.method.label().to_string(),
            ..RefineReport::default()
        };
        let mut hdisp = Vec::with_capacity(bands.len());
        let mut vdisp = Vec::with_capacity(bands.len());
        let mut metric = Vec::with_capacity(bands.len());
        for band in bands {
            report.merge(&band.report);
            hdisp.push(band.hdisp);
            vdisp.push(band.vdisp);
            metric.push(band.metric);
        }
        report.elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "SubPixelRefiner[{}]: refined={} wrong_extrema={} masked={} skipped={} in {:.2} ms",
            report.method,
            report.refined,
            report.wrong_extrema,
            report.masked,
            report.skipped,
            report.elapsed_ms
        );

        let refined = DisparityMaps {
            hdisp: stitch_rows(out_w, out_h, hdisp),
            vdisp: stitch_rows(out_w, out_h, vdisp),
            metric: stitch_rows(out_w, out_h, metric),
            mask: maps.mask.clone(),
            grid,
        };
        Ok((refined, report))
    }

    fn refine_band(
        &self,
        setup: &SearchSetup<'_>,
        maps: &DisparityMaps,
        band: &Region,
    ) -> RefineBand {
        let mut eval = setup.evaluator();
        let n = band.area();
        let mut out = RefineBand {
            hdisp: Vec::with_capacity(n),
            vdisp: Vec::with_capacity(n),
            metric: Vec::with_capacity(n),
            report: RefineReport::default(),
        };
        for oy in band.y0..band.y1() {
            for ox in band.x0..band.x1() {
                let i = maps.hdisp.idx(ox, oy);
                let input = (maps.hdisp.data[i], maps.vdisp.data[i], maps.metric.data[i]);
                // Default values written by the matcher carry no optimum.
                let (h, v, m) = if is_valid(maps.mask.data[i]) {
                    let (x, y) = setup.grid.to_input(ox, oy);
                    self.refine_pixel(setup, &mut eval, x, y, input, &mut out.report)
                } else {
                    out.report.masked += 1;
                    input
                };
                out.hdisp.push(h);
                out.vdisp.push(v);
                out.metric.push(m);
            }
        }
        out
    }

    fn refine_pixel(
        &self,
        setup: &SearchSetup<'_>,
        eval: &mut BlockEvaluator<'_>,
        x: usize,
        y: usize,
        input: (f32, f32, f32),
        report: &mut RefineReport,
    ) -> (f32, f32, f32) {
        let (h, v, m) = input;
        if !h.is_finite() || !v.is_finite() {
            report.skipped += 1;
            return input;
        }
        let (hd, vd) = (h.round() as i32, v.round() as i32);
        let nbhd = match examine(setup, eval, x, y, hd, vd) {
            Guard::Masked => {
                report.masked += 1;
                return input;
            }
            Guard::WrongExtremum => {
                report.wrong_extrema += 1;
                return input;
            }
            Guard::Unscored | Guard::Exact => {
                report.skipped += 1;
                return input;
            }
            Guard::Refine(nbhd) => nbhd,
        };

        let (dx, dy, metric) = match self.options.method {
            RefineMethod::None => (None, None, m),
            RefineMethod::Parabolic => {
                let (dx, dy) = parabolic(&nbhd, self.scorer.minimize());
                (dx, dy, m)
            }
            RefineMethod::Triangular => {
                let minimize = self.scorer.minimize();
                let fit = |axis| {
                    nbhd.axis(axis)
                        .and_then(|(a, b, c)| fit::triangular_offset(a, b, c, minimize))
                };
                (fit(Axis::Horizontal), fit(Axis::Vertical), m)
            }
            RefineMethod::Dichotomy => {
                let res = dichotomy::search(eval, x, y, hd, vd, &nbhd, &self.options);
                (res.dx, res.dy, res.score as f32)
            }
        };

        if dx.is_none() && dy.is_none() {
            report.skipped += 1;
            return input;
        }
        report.refined += 1;
        (
            (hd as f64 + dx.unwrap_or(0.0)) as f32,
            (vd as f64 + dy.unwrap_or(0.0)) as f32,
            metric,
        )
    }
}

/// Joint 2D fit when the full neighbourhood is usable, else one parabola per
/// axis.
fn parabolic(nbhd: &Neighbourhood, minimize: bool) -> (Option<f64>, Option<f64>) {
    if let Some((dx, dy)) = nbhd
        .full()
        .and_then(|s| fit::quadratic_2d_offset(&s, minimize))
    {
        return (Some(dx), Some(dy));
    }
    let fit = |axis| {
        nbhd.axis(axis)
            .and_then(|(a, b, c)| fit::parabola_offset(a, b, c))
    };
    (fit(Axis::Horizontal), fit(Axis::Vertical))
}

fn check_maps(maps: &DisparityMaps, grid: &SubsampleGrid) -> Result<(), ConfigError> {
    if maps.grid != *grid {
        return Err(ConfigError::SizeMismatch {
            name: "disparity grid",
            expected: grid.output_size,
            found: maps.grid.output_size,
        });
    }
    let expected = grid.output_size;
    ensure_size("horizontal disparity", expected, (maps.hdisp.w, maps.hdisp.h))?;
    ensure_size("vertical disparity", expected, (maps.vdisp.w, maps.vdisp.h))?;
    ensure_size("metric", expected, (maps.metric.w, maps.metric.h))?;
    ensure_size("match mask", expected, (maps.mask.w, maps.mask.h))
}
