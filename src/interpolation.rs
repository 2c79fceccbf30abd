//! Bilinear sampling of rasters at fractional positions.
//!
//! The dichotomy refinement resamples the right image at fractional disparity
//! offsets with [`bilinear`]; synthetic translated pairs are generated with
//! [`resample_translated`] using the same kernel.

use crate::image::ImageF32;

/// Bilinear interpolation at `(x, y)`; `None` outside `[0, w-1] × [0, h-1]`.
///
/// A position lying exactly on the last row/column is accepted: the missing
/// neighbour carries a zero weight and is clamped.
#[inline]
pub fn bilinear(img: &ImageF32, x: f64, y: f64) -> Option<f32> {
    if !x.is_finite() || !y.is_finite() || img.is_empty() {
        return None;
    }
    let max_x = (img.w - 1) as f64;
    let max_y = (img.h - 1) as f64;
    if x < 0.0 || y < 0.0 || x > max_x || y > max_y {
        return None;
    }
    let xf = x.floor();
    let yf = y.floor();
    let x0 = xf as usize;
    let y0 = yf as usize;
    let x1 = (x0 + 1).min(img.w - 1);
    let y1 = (y0 + 1).min(img.h - 1);
    let tx = x - xf;
    let ty = y - yf;

    let p00 = img.get(x0, y0) as f64;
    let p10 = img.get(x1, y0) as f64;
    let p01 = img.get(x0, y1) as f64;
    let p11 = img.get(x1, y1) as f64;
    let top = p00 * (1.0 - tx) + p10 * tx;
    let bottom = p01 * (1.0 - tx) + p11 * tx;
    Some((top * (1.0 - ty) + bottom * ty) as f32)
}

/// Build `out(x, y) = src(x - dx, y - dy)`, i.e. `src` content moved by
/// `(dx, dy)`. Samples falling outside `src` take `fill`.
pub fn resample_translated(src: &ImageF32, dx: f64, dy: f64, fill: f32) -> ImageF32 {
    ImageF32::from_fn(src.w, src.h, |x, y| {
        bilinear(src, x as f64 - dx, y as f64 - dy).unwrap_or(fill)
    })
}
