//! Dichotomic search in continuous disparity space.
//!
//! Each axis is searched independently, horizontal first: starting from the
//! integer optimum, the metric is evaluated at `best ± h` on the bilinearly
//! resampled right image, the best of the three positions is kept and `h` is
//! halved. `h` starts at 0.5, so with a unimodal metric the true optimum stays
//! within `h` of the current best.

use super::extremum::Neighbourhood;
use super::options::SubPixelOptions;
use crate::error::Axis;
use crate::interpolation::bilinear;
use crate::matcher::BlockEvaluator;

/// Refined offsets and best score found.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DichotomyResult {
    pub dx: Option<f64>,
    pub dy: Option<f64>,
    pub score: f64,
}

/// Search around `(x + hd, y + vd)` in the right image. The left block of
/// `(x, y)` must already be loaded in `eval`.
pub(crate) fn search(
    eval: &mut BlockEvaluator<'_>,
    x: usize,
    y: usize,
    hd: i32,
    vd: i32,
    nbhd: &Neighbourhood,
    opts: &SubPixelOptions,
) -> DichotomyResult {
    let cx = x as f64 + hd as f64;
    let cy = y as f64 + vd as f64;
    let mut score = nbhd.center();
    let mut dx = None;
    let mut dy = None;

    if nbhd.axis(Axis::Horizontal).is_some() {
        let (off, s) = search_axis(eval, opts, score, |eval, t| {
            probe(eval, cx + t, cy)
        });
        dx = Some(off);
        score = s;
    }
    if nbhd.axis(Axis::Vertical).is_some() {
        let hx = cx + dx.unwrap_or(0.0);
        let (off, s) = search_axis(eval, opts, score, |eval, t| probe(eval, hx, cy + t));
        dy = Some(off);
        score = s;
    }
    DichotomyResult { dx, dy, score }
}

fn search_axis<F>(
    eval: &mut BlockEvaluator<'_>,
    opts: &SubPixelOptions,
    start: f64,
    mut eval_at: F,
) -> (f64, f64)
where
    F: FnMut(&mut BlockEvaluator<'_>, f64) -> Option<f64>,
{
    let mut best = (0.0f64, start);
    let mut half = 0.5f64;
    for _ in 0..opts.dichotomy_iterations {
        if half < opts.dichotomy_tolerance {
            break;
        }
        let mut next = best;
        for t in [best.0 - half, best.0 + half] {
            if let Some(s) = eval_at(eval, t) {
                if eval.scorer().is_better(s, next.1) {
                    next = (t, s);
                }
            }
        }
        best = next;
        half *= 0.5;
    }
    (best.0, best.1)
}

/// Score the right block centred on the fractional position `(rx, ry)`.
fn probe(eval: &mut BlockEvaluator<'_>, rx: f64, ry: f64) -> Option<f64> {
    let right = eval.right();
    let r = eval.radius() as isize;
    let buf = eval.right_buf_mut();
    let mut k = 0;
    for j in -r..=r {
        for i in -r..=r {
            buf[k] = bilinear(right, rx + i as f64, ry + j as f64)?;
            k += 1;
        }
    }
    eval.score_buffer()
}
