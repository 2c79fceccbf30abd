//! End-to-end disparity estimation for one rectified pair.
//!
//! Stages, in order:
//! 1. validity masks for both images (input mask, local variance, no-data),
//! 2. block matching on the left grid,
//! 3. sub-pixel refinement,
//! 4. post-processing: median filter per explored axis, left/right
//!    bijection check, metric threshold.
//!
//! Post-processing never alters the matcher's contract: it only refines the
//! disparities (median) and narrows the output validity mask.

use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{
    InputDescriptor, MatchReport, PipelineReport, PostprocessReport, RefineReport,
    TimingBreakdown,
};
use crate::error::ConfigError;
use crate::image::ImageF32;
use crate::masking::{build_validity_mask, MaskOptions};
use crate::matcher::{
    BlockMatcher, DisparityMaps, Exploration, MatchOptions, StereoPair, SubsampleGrid,
};
use crate::postprocess::{
    bijection_mask, combine_masks, count_valid, median_filter, metric_threshold_mask,
    BijectionInput, BijectionOptions, MedianOptions,
};
use crate::subpixel::{RefineMethod, SubPixelOptions, SubPixelRefiner};
use crate::tiling::ProgressFn;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Options of every pipeline stage.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub matching: MatchOptions,
    pub subpixel: SubPixelOptions,
    /// Criteria applied to both images before matching.
    pub mask: MaskOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<MedianOptions>,
    /// Requires a full-resolution output grid (`step == 1`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bijection: Option<BijectionOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_threshold: Option<f32>,
}

impl PipelineOptions {
    pub fn with_matching(mut self, matching: MatchOptions) -> Self {
        self.matching = matching;
        self
    }

    pub fn with_subpixel(mut self, subpixel: SubPixelOptions) -> Self {
        self.subpixel = subpixel;
        self
    }

    pub fn with_mask(mut self, mask: MaskOptions) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_median(mut self, median: MedianOptions) -> Self {
        self.median = Some(median);
        self
    }

    pub fn with_bijection(mut self, bijection: BijectionOptions) -> Self {
        self.bijection = Some(bijection);
        self
    }

    pub fn with_metric_threshold(mut self, threshold: f32) -> Self {
        self.metric_threshold = Some(threshold);
        self
    }
}

/// Final rasters of a pipeline run, all on the output grid.
#[derive(Clone, Debug)]
pub struct DisparityOutput {
    pub hdisp: ImageF32,
    pub vdisp: ImageF32,
    pub metric: ImageF32,
    /// 255 where every stage accepted the pixel, 0 otherwise.
    pub mask: ImageF32,
    pub grid: SubsampleGrid,
    pub report: PipelineReport,
}

impl DisparityOutput {
    /// Ordered band list `[hdisp, vdisp]`, followed by `metric` on request,
    /// for assembly into a multi-band product.
    pub fn to_bands(&self, include_metric: bool) -> Vec<&ImageF32> {
        let mut bands = vec![&self.hdisp, &self.vdisp];
        if include_metric {
            bands.push(&self.metric);
        }
        bands
    }
}

/// Validated chain of matcher, refiner and filters.
#[derive(Clone, Debug)]
pub struct DisparityPipeline {
    options: PipelineOptions,
    matcher: BlockMatcher,
    refiner: SubPixelRefiner,
}

impl DisparityPipeline {
    pub fn new(options: PipelineOptions) -> Result<Self, ConfigError> {
        let matcher = BlockMatcher::new(options.matching.clone())?;
        let refiner = SubPixelRefiner::new(&options.matching, options.subpixel)?;
        if let Some(m) = &options.median {
            m.validate()?;
        }
        if let Some(b) = &options.bijection {
            b.validate()?;
            if options.matching.step != 1 {
                return Err(ConfigError::InvalidParameter {
                    name: "bijection",
                    reason: "the coherency check needs a full-resolution grid (step = 1)"
                        .to_string(),
                });
            }
        }
        if options.metric_threshold.is_some_and(|t| t.is_nan()) {
            return Err(ConfigError::InvalidParameter {
                name: "metric_threshold",
                reason: "must be a number".to_string(),
            });
        }
        Ok(Self {
            options,
            matcher,
            refiner,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn run(&self, pair: &StereoPair<'_>) -> Result<DisparityOutput, ConfigError> {
        self.run_with_progress(pair, None)
    }

    /// Run every stage; `progress` is notified for the bands of the direct
    /// matching and refinement passes.
    pub fn run_with_progress(
        &self,
        pair: &StereoPair<'_>,
        progress: Option<ProgressFn<'_>>,
    ) -> Result<DisparityOutput, ConfigError> {
        let t_total = Instant::now();
        let mut timings = TimingBreakdown::default();
        pair.validate(&self.options.matching.exploration)?;

        let t0 = Instant::now();
        let (left_mask, right_mask) = self.validity_masks(pair)?;
        if left_mask.is_some() || right_mask.is_some() {
            timings.push_since("masks", t0);
        }
        let working = pair.with_masks(
            left_mask.as_ref().or(pair.left_mask),
            right_mask.as_ref().or(pair.right_mask),
        );

        let t0 = Instant::now();
        let (maps, matching) = self.matcher.compute_with_progress(&working, progress)?;
        timings.push_since("matching", t0);

        let (maps, refinement) = self.refine(&working, maps, progress, &mut timings)?;

        let mut post = PostprocessReport::default();
        let mut mask = maps.mask.clone();
        let mut hdisp = maps.hdisp;
        let mut vdisp = maps.vdisp;

        if let Some(opts) = &self.options.median {
            let t0 = Instant::now();
            let axes = [
                (self.options.matching.hbounds(), &mut hdisp),
                (self.options.matching.vbounds(), &mut vdisp),
            ];
            for (bounds, disp) in axes {
                if bounds.is_degenerate() {
                    continue;
                }
                let out = median_filter(disp, Some(&mask), opts)?;
                post.median_incoherent += out.incoherent;
                *disp = out.filtered;
                mask = combine_masks(&mask, &out.mask)?;
            }
            timings.push_since("median", t0);
        }

        let mut reverse_matching = None;
        if let Some(opts) = &self.options.bijection {
            let t0 = Instant::now();
            let (rev, report) = self.reverse_maps(&working)?;
            let check = bijection_mask(
                &BijectionInput {
                    direct_h: &hdisp,
                    direct_v: &vdisp,
                    reverse_h: &rev.hdisp,
                    reverse_v: &rev.vdisp,
                    left_mask: Some(&mask),
                    hbounds: self.options.matching.hbounds(),
                    vbounds: self.options.matching.vbounds(),
                },
                opts,
            )?;
            post.bijection_rejected = check.rejected;
            mask = combine_masks(&mask, &check.mask)?;
            reverse_matching = Some(report);
            timings.push_since("bijection", t0);
        }

        if let Some(threshold) = self.options.metric_threshold {
            let minimize = self.options.matching.metric.minimize();
            let (m, _) = metric_threshold_mask(&maps.metric, threshold, minimize);
            let before = count_valid(&mask);
            mask = combine_masks(&mask, &m)?;
            post.metric_rejected = before - count_valid(&mask);
        }

        let valid_pixels = count_valid(&mask);
        timings.total_ms = elapsed_ms(t_total);
        debug!(
            "DisparityPipeline: {} / {} valid pixels in {:.2} ms",
            valid_pixels,
            maps.grid.output_len(),
            timings.total_ms
        );

        let report = PipelineReport {
            input: InputDescriptor {
                left_width: pair.left.w,
                left_height: pair.left.h,
                right_width: pair.right.w,
                right_height: pair.right.h,
                output_width: maps.grid.output_size.0,
                output_height: maps.grid.output_size.1,
            },
            timings,
            matching,
            reverse_matching,
            refinement,
            postprocess: post,
            valid_pixels,
        };
        Ok(DisparityOutput {
            hdisp,
            vdisp,
            metric: maps.metric,
            mask,
            grid: maps.grid,
            report,
        })
    }

    /// Validity masks for both images, `None` when no criterion applies.
    fn validity_masks(
        &self,
        pair: &StereoPair<'_>,
    ) -> Result<(Option<ImageF32>, Option<ImageF32>), ConfigError> {
        if self.options.mask.is_trivial() {
            return Ok((None, None));
        }
        let radius = self.options.matching.radius;
        let left = build_validity_mask(pair.left, pair.left_mask, radius, &self.options.mask)?;
        let right = build_validity_mask(pair.right, pair.right_mask, radius, &self.options.mask)?;
        Ok((Some(left), Some(right)))
    }

    fn refine(
        &self,
        pair: &StereoPair<'_>,
        maps: DisparityMaps,
        progress: Option<ProgressFn<'_>>,
        timings: &mut TimingBreakdown,
    ) -> Result<(DisparityMaps, Option<RefineReport>), ConfigError> {
        if self.options.subpixel.method == RefineMethod::None {
            return Ok((maps, None));
        }
        let t0 = Instant::now();
        let (refined, report) = self.refiner.refine_with_progress(pair, &maps, progress)?;
        timings.push_since("refinement", t0);
        Ok((refined, Some(report)))
    }

    /// Right-to-left maps: swapped images and masks, negated bounds, global
    /// exploration, same metric and refinement.
    fn reverse_maps(
        &self,
        pair: &StereoPair<'_>,
    ) -> Result<(DisparityMaps, MatchReport), ConfigError> {
        let m = &self.options.matching;
        let reverse_opts = MatchOptions {
            exploration: Exploration::Global,
            ..m.clone()
        }
        .with_hdisp(-m.max_hdisp, -m.min_hdisp)
        .with_vdisp(-m.max_vdisp, -m.min_vdisp);
        let reversed = pair.reversed();
        let (maps, report) = BlockMatcher::new(reverse_opts.clone())?.compute(&reversed)?;
        if self.options.subpixel.method == RefineMethod::None {
            return Ok((maps, report));
        }
        let (refined, _) =
            SubPixelRefiner::new(&reverse_opts, self.options.subpixel)?.refine(&reversed, &maps)?;
        Ok((refined, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_metric_threshold_is_rejected() {
        let opts = PipelineOptions::default().with_metric_threshold(f32::NAN);
        assert!(matches!(
            DisparityPipeline::new(opts),
            Err(ConfigError::InvalidParameter {
                name: "metric_threshold",
                ..
            })
        ));
    }

    #[test]
    fn invalid_median_radius_is_rejected() {
        let opts = PipelineOptions::default().with_median(MedianOptions {
            radius: 0,
            incoherence_threshold: 1.0,
        });
        assert!(DisparityPipeline::new(opts).is_err());
    }

    #[test]
    fn method_none_skips_refinement_report() {
        let left = ImageF32::from_fn(16, 10, |x, y| ((x * 7 + y * 3) % 13) as f32);
        let opts = PipelineOptions::default()
            .with_matching(MatchOptions::default().with_radius(1).with_hdisp(-2, 2))
            .with_subpixel(SubPixelOptions::default().with_method(RefineMethod::None));
        let out = DisparityPipeline::new(opts)
            .unwrap()
            .run(&StereoPair::new(&left, &left))
            .unwrap();
        assert!(out.report.refinement.is_none());
        assert!(out.report.timings.stage("refinement").is_none());
        assert_eq!(out.report.input.output_height, 10);
    }
}
