//! Block gathering and scoring at integer disparities.
//!
//! The left block is read with replicated borders; a candidate is only
//! scored when the whole right block lies inside the right image. The
//! evaluator owns its two scratch buffers, so one instance per band keeps the
//! candidate loop allocation-free.

use crate::image::{ImageF32, ImageView, Span};
use crate::masking::is_valid;
use crate::metric::Scorer;

pub(crate) struct BlockEvaluator<'a> {
    left: &'a ImageF32,
    right: &'a ImageF32,
    right_mask: Option<&'a ImageF32>,
    radius: usize,
    scorer: Scorer,
    left_buf: Vec<f32>,
    right_buf: Vec<f32>,
}

impl<'a> BlockEvaluator<'a> {
    pub(crate) fn new(
        left: &'a ImageF32,
        right: &'a ImageF32,
        right_mask: Option<&'a ImageF32>,
        radius: usize,
        scorer: Scorer,
    ) -> Self {
        let side = 2 * radius + 1;
        Self {
            left,
            right,
            right_mask,
            radius,
            scorer,
            left_buf: vec![0.0; side * side],
            right_buf: vec![0.0; side * side],
        }
    }

    #[inline]
    pub(crate) fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    #[inline]
    pub(crate) fn right(&self) -> &'a ImageF32 {
        self.right
    }

    #[inline]
    pub(crate) fn radius(&self) -> usize {
        self.radius
    }

    #[inline]
    pub(crate) fn right_buf_mut(&mut self) -> &mut [f32] {
        &mut self.right_buf
    }

    /// Gather the left block centred on `(x, y)`.
    pub(crate) fn load_left(&mut self, x: usize, y: usize) {
        let r = self.radius as isize;
        let (cx, cy) = (x as isize, y as isize);
        let mut k = 0;
        for by in cy - r..=cy + r {
            for bx in cx - r..=cx + r {
                self.left_buf[k] = self.left.get_clamped(bx, by);
                k += 1;
            }
        }
    }

    /// Horizontal and vertical disparities for which the right block centred
    /// on `(x + dx, y + dy)` stays inside the right image.
    pub(crate) fn inside_spans(&self, x: usize, y: usize) -> (Span, Span) {
        let r = self.radius as i64;
        let span = |c: usize, len: usize| {
            let lo = r - c as i64;
            let hi = len as i64 - 1 - r - c as i64;
            Span::new(clamp_i32(lo), clamp_i32(hi))
        };
        (span(x, self.right.w), span(y, self.right.h))
    }

    /// Score the candidate `(dx, dy)` for the pixel whose left block is
    /// loaded. `None` when the right block leaves the image, the right centre
    /// is masked, or the score is not finite.
    pub(crate) fn score(&mut self, x: usize, y: usize, dx: i32, dy: i32) -> Option<f64> {
        let r = self.radius as i64;
        let rx = x as i64 + dx as i64;
        let ry = y as i64 + dy as i64;
        if rx - r < 0
            || ry - r < 0
            || rx + r >= self.right.w as i64
            || ry + r >= self.right.h as i64
        {
            return None;
        }
        let (rx, ry) = (rx as usize, ry as usize);
        if let Some(mask) = self.right_mask {
            if !is_valid(mask.get(rx, ry)) {
                return None;
            }
        }
        let side = 2 * self.radius + 1;
        let x0 = rx - self.radius;
        for (k, by) in (ry - self.radius..=ry + self.radius).enumerate() {
            let row = &self.right.row(by)[x0..x0 + side];
            self.right_buf[k * side..(k + 1) * side].copy_from_slice(row);
        }
        let s = self.scorer.score(&self.left_buf, &self.right_buf);
        s.is_finite().then_some(s)
    }

    /// Score the right buffer as currently filled by the caller.
    #[inline]
    pub(crate) fn score_buffer(&self) -> Option<f64> {
        let s = self.scorer.score(&self.left_buf, &self.right_buf);
        s.is_finite().then_some(s)
    }
}

#[inline]
fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
