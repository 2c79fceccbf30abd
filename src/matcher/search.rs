//! Per-band exhaustive disparity search.
//!
//! Candidates are scanned with the vertical offset in the outer loop and the
//! horizontal offset in the inner loop, both ascending. Only a strictly better
//! score replaces the current optimum, so the first optimum in scan order is
//! kept.

use super::block::BlockEvaluator;
use super::grid::SubsampleGrid;
use super::options::Exploration;
use super::StereoPair;
use crate::image::{ImageF32, Region, Span};
use crate::masking::{is_valid, MASK_INVALID, MASK_VALID};
use crate::metric::Scorer;

/// Counters accumulated per band and summed once all bands are done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct MatchStats {
    pub masked: usize,
    pub no_candidate: usize,
    pub candidates: u64,
}

impl MatchStats {
    pub(crate) fn merge(&mut self, other: &MatchStats) {
        self.masked += other.masked;
        self.no_candidate += other.no_candidate;
        self.candidates += other.candidates;
    }
}

pub(crate) struct BandOutput {
    pub hdisp: Vec<f32>,
    pub vdisp: Vec<f32>,
    pub metric: Vec<f32>,
    pub valid: Vec<f32>,
    pub stats: MatchStats,
}

impl BandOutput {
    fn with_capacity(n: usize) -> Self {
        Self {
            hdisp: Vec::with_capacity(n),
            vdisp: Vec::with_capacity(n),
            metric: Vec::with_capacity(n),
            valid: Vec::with_capacity(n),
            stats: MatchStats::default(),
        }
    }
}

/// Everything a band needs, shared read-only across workers.
pub(crate) struct SearchSetup<'a> {
    pub pair: StereoPair<'a>,
    pub grid: SubsampleGrid,
    pub hbounds: Span,
    pub vbounds: Span,
    pub exploration: Exploration,
    pub radius: usize,
    pub scorer: Scorer,
}

impl SearchSetup<'_> {
    /// Value written for pixels without any admissible candidate.
    #[inline]
    pub(crate) fn sentinel(&self) -> (f32, f32, f32) {
        (self.hbounds.lo as f32, self.vbounds.lo as f32, 0.0)
    }

    /// Search window at input pixel `(x, y)` before image-bound clipping.
    pub(crate) fn window(&self, x: usize, y: usize) -> (Span, Span) {
        match self.exploration {
            Exploration::Global => (self.hbounds, self.vbounds),
            Exploration::Uniform {
                hdisp,
                vdisp,
                radius_x,
                radius_y,
            } => (
                Span::around(hdisp, to_i32(radius_x)).clip(self.hbounds),
                Span::around(vdisp, to_i32(radius_y)).clip(self.vbounds),
            ),
            Exploration::Maps { radius_x, radius_y } => (
                local_window(self.pair.initial_hdisp, x, y, to_i32(radius_x), self.hbounds),
                local_window(self.pair.initial_vdisp, x, y, to_i32(radius_y), self.vbounds),
            ),
        }
    }

    /// True when either mask rejects input pixel `(x, y)`.
    #[inline]
    pub(crate) fn is_masked(&self, x: usize, y: usize) -> bool {
        let rejects = |mask: Option<&ImageF32>| {
            mask.and_then(|m| m.get_checked(x as isize, y as isize))
                .is_some_and(|v| !is_valid(v))
        };
        rejects(self.pair.left_mask) || rejects(self.pair.right_mask)
    }

    pub(crate) fn evaluator(&self) -> BlockEvaluator<'_> {
        BlockEvaluator::new(
            self.pair.left,
            self.pair.right,
            self.pair.right_mask,
            self.radius,
            self.scorer,
        )
    }

    /// Match every output pixel of `band` (output grid coordinates).
    pub(crate) fn match_band(&self, band: &Region) -> BandOutput {
        let mut eval = self.evaluator();
        let mut out = BandOutput::with_capacity(band.area());
        for oy in band.y0..band.y1() {
            for ox in band.x0..band.x1() {
                let (x, y) = self.grid.to_input(ox, oy);
                let (h, v, m, found) = self.match_pixel(&mut eval, x, y, &mut out.stats);
                out.hdisp.push(h);
                out.vdisp.push(v);
                out.metric.push(m);
                out.valid.push(if found { MASK_VALID } else { MASK_INVALID });
            }
        }
        out
    }

    fn match_pixel(
        &self,
        eval: &mut BlockEvaluator<'_>,
        x: usize,
        y: usize,
        stats: &mut MatchStats,
    ) -> (f32, f32, f32, bool) {
        let (sh, sv, sm) = self.sentinel();
        if self.is_masked(x, y) {
            stats.masked += 1;
            return (sh, sv, sm, false);
        }
        let (wh, wv) = self.window(x, y);
        let (ih, iv) = eval.inside_spans(x, y);
        let (hs, vs) = (wh.clip(ih), wv.clip(iv));
        if hs.is_empty() || vs.is_empty() {
            stats.no_candidate += 1;
            return (sh, sv, sm, false);
        }

        eval.load_left(x, y);
        let mut best: Option<(i32, i32, f64)> = None;
        for dy in vs.lo..=vs.hi {
            for dx in hs.lo..=hs.hi {
                stats.candidates += 1;
                let Some(score) = eval.score(x, y, dx, dy) else {
                    continue;
                };
                match best {
                    Some((_, _, b)) if !self.scorer.is_better(score, b) => {}
                    _ => best = Some((dx, dy, score)),
                }
            }
        }

        match best {
            Some((dx, dy, score)) => (dx as f32, dy as f32, score as f32, true),
            None => {
                stats.no_candidate += 1;
                (sh, sv, sm, false)
            }
        }
    }
}

/// Window of half-width `radius` around the rounded initial estimate,
/// clipped to `bounds`. A missing or non-finite estimate explores `bounds`.
fn local_window(
    initial: Option<&ImageF32>,
    x: usize,
    y: usize,
    radius: i32,
    bounds: Span,
) -> Span {
    match initial.map(|m| m.get(x, y)) {
        Some(v) if v.is_finite() => Span::around(v.round() as i32, radius).clip(bounds),
        _ => bounds,
    }
}

#[inline]
fn to_i32(v: u32) -> i32 {
    v.min(i32::MAX as u32) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricKind;

    fn setup<'a>(pair: StereoPair<'a>, exploration: Exploration) -> SearchSetup<'a> {
        SearchSetup {
            pair,
            grid: SubsampleGrid::full(pair.left.w, pair.left.h),
            hbounds: Span::new(-4, 4),
            vbounds: Span::new(-1, 1),
            exploration,
            radius: 1,
            scorer: MetricKind::Ssd.scorer(),
        }
    }

    #[test]
    fn uniform_window_is_clipped_to_bounds() {
        let img = ImageF32::new(4, 4);
        let s = setup(
            StereoPair::new(&img, &img),
            Exploration::Uniform {
                hdisp: 3,
                vdisp: 0,
                radius_x: 2,
                radius_y: 5,
            },
        );
        assert_eq!(s.window(0, 0), (Span::new(1, 4), Span::new(-1, 1)));
    }

    #[test]
    fn map_window_follows_rounded_estimate() {
        let img = ImageF32::new(4, 4);
        let mut init_h = ImageF32::filled(4, 4, 1.6);
        init_h.set(1, 1, f32::NAN);
        let init_v = ImageF32::new(4, 4);
        let pair = StereoPair::new(&img, &img).with_initial_disparity(&init_h, &init_v);
        let s = setup(
            pair,
            Exploration::Maps {
                radius_x: 1,
                radius_y: 0,
            },
        );
        assert_eq!(s.window(0, 0), (Span::new(1, 3), Span::new(0, 0)));
        assert_eq!(s.window(1, 1).0, Span::new(-4, 4));
    }

    #[test]
    fn ties_keep_first_candidate_in_scan_order() {
        // Flat images: every candidate scores 0.
        let img = ImageF32::filled(9, 9, 5.0);
        let s = setup(StereoPair::new(&img, &img), Exploration::Global);
        let out = s.match_band(&Region::new(4, 4, 1, 1));
        assert_eq!((out.hdisp[0], out.vdisp[0]), (-3.0, -1.0));
        assert_eq!(out.metric[0], 0.0);
        assert_eq!(out.valid[0], MASK_VALID);
    }

    #[test]
    fn border_pixel_without_candidate_gets_sentinel() {
        let left = ImageF32::from_fn(9, 9, |x, y| (x * y) as f32);
        // A 2-pixel wide right image cannot hold a 3×3 block.
        let right = ImageF32::new(2, 9);
        let s = setup(StereoPair::new(&left, &right), Exploration::Global);
        let out = s.match_band(&Region::new(4, 0, 1, 1));
        assert_eq!((out.hdisp[0], out.vdisp[0], out.metric[0]), (-4.0, -1.0, 0.0));
        assert_eq!(out.valid[0], MASK_INVALID);
        assert_eq!(out.stats.no_candidate, 1);
    }
}
