//! Extremum guard shared by every refinement method.
//!
//! The metric is re-evaluated at the integer disparity and its 8 neighbours.
//! A neighbour is unavailable when it leaves the global disparity bounds, its
//! right block leaves the right image, its right centre is masked or its
//! score is not finite. Refinement only proceeds when the centre is scored and
//! no available neighbour strictly improves on it.

use crate::error::Axis;
use crate::matcher::{BlockEvaluator, SearchSetup};

/// Tolerance on the ideal score under which a match counts as exact.
const EXACT_EPS: f64 = 1e-9;

/// Scores at `(dx, dy) ∈ {-1, 0, 1}²` around the integer disparity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Neighbourhood {
    scores: [[Option<f64>; 3]; 3],
}

impl Neighbourhood {
    #[cfg(test)]
    pub(crate) fn from_scores(scores: [[Option<f64>; 3]; 3]) -> Self {
        Self { scores }
    }

    #[inline]
    pub(crate) fn at(&self, dx: i32, dy: i32) -> Option<f64> {
        self.scores[(dy + 1) as usize][(dx + 1) as usize]
    }

    #[inline]
    pub(crate) fn center(&self) -> f64 {
        self.at(0, 0).unwrap_or(f64::NAN)
    }

    /// `(f(-1), f(0), f(+1))` along `axis` when both neighbours exist.
    pub(crate) fn axis(&self, axis: Axis) -> Option<(f64, f64, f64)> {
        let (m, p) = match axis {
            Axis::Horizontal => (self.at(-1, 0), self.at(1, 0)),
            Axis::Vertical => (self.at(0, -1), self.at(0, 1)),
        };
        Some((m?, self.at(0, 0)?, p?))
    }

    /// All nine scores, row-major over `dy`, when every one is available.
    pub(crate) fn full(&self) -> Option<[[f64; 3]; 3]> {
        let mut out = [[0.0; 3]; 3];
        for (dst, src) in out.iter_mut().zip(&self.scores) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = (*s)?;
            }
        }
        Some(out)
    }
}

/// What the refinement stage does with a pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Guard {
    Masked,
    /// Centre not scorable; pass through.
    Unscored,
    /// A neighbour beats the centre; pass through and count.
    WrongExtremum,
    /// Centre already reaches the ideal score; offset is zero.
    Exact,
    Refine(Neighbourhood),
}

/// Run the guard for input pixel `(x, y)` with integer disparity `(hd, vd)`.
pub(crate) fn examine(
    setup: &SearchSetup<'_>,
    eval: &mut BlockEvaluator<'_>,
    x: usize,
    y: usize,
    hd: i32,
    vd: i32,
) -> Guard {
    if setup.is_masked(x, y) {
        return Guard::Masked;
    }
    if !setup.hbounds.contains(hd) || !setup.vbounds.contains(vd) {
        return Guard::Unscored;
    }

    eval.load_left(x, y);
    let mut scores = [[None; 3]; 3];
    for (j, row) in scores.iter_mut().enumerate() {
        let dy = vd + j as i32 - 1;
        if !setup.vbounds.contains(dy) {
            continue;
        }
        for (i, cell) in row.iter_mut().enumerate() {
            let dx = hd + i as i32 - 1;
            if setup.hbounds.contains(dx) {
                *cell = eval.score(x, y, dx, dy);
            }
        }
    }
    let nbhd = Neighbourhood { scores };

    let Some(center) = nbhd.at(0, 0) else {
        return Guard::Unscored;
    };
    let scorer = eval.scorer();
    let beaten = nbhd
        .scores
        .iter()
        .flatten()
        .flatten()
        .any(|&s| scorer.is_better(s, center));
    if beaten {
        return Guard::WrongExtremum;
    }
    if (center - scorer.ideal()).abs() <= EXACT_EPS {
        return Guard::Exact;
    }
    Guard::Refine(nbhd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nbhd(scores: [[Option<f64>; 3]; 3]) -> Neighbourhood {
        Neighbourhood { scores }
    }

    #[test]
    fn axis_requires_both_neighbours() {
        let n = nbhd([
            [None, Some(5.0), None],
            [Some(3.0), Some(1.0), Some(2.0)],
            [None, None, None],
        ]);
        assert_eq!(n.axis(Axis::Horizontal), Some((3.0, 1.0, 2.0)));
        assert_eq!(n.axis(Axis::Vertical), None);
        assert!(n.full().is_none());
        assert_eq!(n.center(), 1.0);
    }

    #[test]
    fn full_neighbourhood_is_row_major() {
        let mut s = [[None; 3]; 3];
        for (j, row) in s.iter_mut().enumerate() {
            for (i, c) in row.iter_mut().enumerate() {
                *c = Some((j * 3 + i) as f64);
            }
        }
        let full = nbhd(s).full().unwrap();
        assert_eq!(full[2][0], 6.0);
        assert_eq!(nbhd(s).at(1, -1), Some(2.0));
    }
}
