//! Closed-form sub-pixel fits on metric samples at offsets -1, 0, +1.
//!
//! Every fit returns an offset in `[-1, 1]`, or `None` when the samples are
//! flat (zero curvature or slope), in which case the caller keeps the integer
//! disparity.

use nalgebra::{Matrix2, Vector2};

/// Denominators below this are treated as flat.
const FLAT_EPS: f64 = 1e-12;

/// Vertex of the parabola through `(-1, m)`, `(0, c)`, `(1, p)`.
///
/// The vertex formula is the same for minima and maxima; the extremum guard
/// already ensured `c` is the optimum of the three.
pub fn parabola_offset(m: f64, c: f64, p: f64) -> Option<f64> {
    let den = m - 2.0 * c + p;
    if !den.is_finite() || den.abs() < FLAT_EPS {
        return None;
    }
    let off = 0.5 * (m - p) / den;
    off.is_finite().then(|| off.clamp(-1.0, 1.0))
}

/// Equiangular fit: two lines of opposite slope through the samples, the
/// steeper one anchored on the worse neighbour.
pub fn triangular_offset(m: f64, c: f64, p: f64, minimize: bool) -> Option<f64> {
    let (m, c, p) = if minimize { (m, c, p) } else { (-m, -c, -p) };
    let den = m.max(p) - c;
    if !den.is_finite() || den < FLAT_EPS {
        return None;
    }
    let off = 0.5 * (m - p) / den;
    off.is_finite().then(|| off.clamp(-1.0, 1.0))
}

/// Stationary point of the quadratic surface fitted to a full 3×3 sample
/// grid (`s[dy + 1][dx + 1]`). Returns `(dx, dy)` offsets.
///
/// `None` when the Hessian is singular or does not curve in the optimising
/// direction (positive definite for minima, negative definite for maxima).
pub fn quadratic_2d_offset(s: &[[f64; 3]; 3], minimize: bool) -> Option<(f64, f64)> {
    let gx = 0.5 * (s[1][2] - s[1][0]);
    let gy = 0.5 * (s[2][1] - s[0][1]);
    let hxx = s[1][2] - 2.0 * s[1][1] + s[1][0];
    let hyy = s[2][1] - 2.0 * s[1][1] + s[0][1];
    let hxy = 0.25 * (s[2][2] - s[2][0] - s[0][2] + s[0][0]);

    let hessian = Matrix2::new(hxx, hxy, hxy, hyy);
    let det = hessian.determinant();
    if !det.is_finite() || det <= FLAT_EPS {
        return None;
    }
    let curved = if minimize { hxx > 0.0 } else { hxx < 0.0 };
    if !curved {
        return None;
    }
    let offset = -(hessian.try_inverse()? * Vector2::new(gx, gy));
    if !offset.x.is_finite() || !offset.y.is_finite() {
        return None;
    }
    Some((offset.x.clamp(-1.0, 1.0), offset.y.clamp(-1.0, 1.0)))
}
