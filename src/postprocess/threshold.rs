use crate::image::ImageF32;
use crate::masking::{MASK_INVALID, MASK_VALID};

/// Mask out pixels whose metric is worse than `threshold`: above it for
/// minimised metrics, below it for maximised ones. Non-finite metrics are
/// always rejected. Returns the mask and the number of rejected pixels.
pub fn metric_threshold_mask(
    metric: &ImageF32,
    threshold: f32,
    minimize: bool,
) -> (ImageF32, usize) {
    let mut rejected = 0usize;
    let mask = ImageF32::from_fn(metric.w, metric.h, |x, y| {
        let m = metric.get(x, y);
        let ok = if minimize { m <= threshold } else { m >= threshold };
        if ok {
            MASK_VALID
        } else {
            rejected += 1;
            MASK_INVALID
        }
    });
    (mask, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_metric() {
        let metric = ImageF32::from_vec(3, 1, vec![0.2, 0.6, f32::NAN]).unwrap();
        let (mask, rejected) = metric_threshold_mask(&metric, 0.5, false);
        assert_eq!(mask.data, vec![MASK_INVALID, MASK_VALID, MASK_INVALID]);
        assert_eq!(rejected, 2);
        let (mask, _) = metric_threshold_mask(&metric, 0.5, true);
        assert_eq!(mask.data, vec![MASK_VALID, MASK_INVALID, MASK_INVALID]);
    }
}
