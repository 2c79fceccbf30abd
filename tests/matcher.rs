mod common;

use block_disparity::image::ImageF32;
use block_disparity::masking::{MASK_INVALID, MASK_VALID};
use block_disparity::matcher::{BlockMatcher, Exploration, MatchOptions, StereoPair};
use block_disparity::metric::{ncc, ssd, MetricKind};
use block_disparity::tiling::ParallelOptions;
use block_disparity::ConfigError;
use common::synthetic_image::{bright_square, hashed_texture, shifted_pair};

fn block(img: &ImageF32, cx: i32, cy: i32, r: i32) -> Vec<f32> {
    let mut out = Vec::new();
    for y in cy - r..=cy + r {
        for x in cx - r..=cx + r {
            out.push(img.get(x as usize, y as usize));
        }
    }
    out
}

#[test]
fn bright_square_shifted_two_columns() {
    let left = bright_square(9, 9, 2, 3, 3);
    let right = bright_square(9, 9, 4, 3, 3);
    let opts = MatchOptions::default()
        .with_radius(2)
        .with_hdisp(-5, 5)
        .with_vdisp(0, 0);
    let (maps, _) = BlockMatcher::new(opts)
        .unwrap()
        .compute(&StereoPair::new(&left, &right))
        .unwrap();

    for y in 3..6 {
        for x in 2..5 {
            assert_eq!(maps.hdisp.get(x, y), 2.0, "hdisp at ({x}, {y})");
            assert_eq!(maps.vdisp.get(x, y), 0.0);
            assert_eq!(maps.metric.get(x, y), 0.0);
            assert_eq!(maps.mask.get(x, y), MASK_VALID);
        }
    }
}

#[test]
fn flat_images_give_zero_ncc_everywhere() {
    let img = ImageF32::filled(5, 5, 42.0);
    let opts = MatchOptions::default()
        .with_radius(1)
        .with_hdisp(-1, 1)
        .with_metric(MetricKind::Ncc);
    let (maps, _) = BlockMatcher::new(opts)
        .unwrap()
        .compute(&StereoPair::new(&img, &img))
        .unwrap();
    assert!(maps.metric.data.iter().all(|&m| m == 0.0));
    assert!(maps.hdisp.data.iter().all(|d| d.is_finite()));
}

#[test]
fn integer_shift_is_recovered_at_interior_pixels() {
    let (w, h, r) = (40usize, 30usize, 2usize);
    let (left, right) = shifted_pair(w, h, 2, 1, 7);
    let opts = MatchOptions::default()
        .with_radius(r)
        .with_hdisp(-3, 3)
        .with_vdisp(-1, 2);
    let (maps, report) = BlockMatcher::new(opts)
        .unwrap()
        .compute(&StereoPair::new(&left, &right))
        .unwrap();
    assert_eq!(report.masked, 0);

    for y in r + 1..h - r - 1 {
        for x in r + 2..w - r - 2 {
            assert_eq!(
                (maps.hdisp.get(x, y), maps.vdisp.get(x, y)),
                (2.0, 1.0),
                "disparity at ({x}, {y})"
            );
            assert_eq!(maps.metric.get(x, y), 0.0);
        }
    }
}

#[test]
fn masked_pixels_receive_sentinel() {
    let (left, right) = shifted_pair(20, 20, 1, 0, 3);
    let mut left_mask = ImageF32::filled(20, 20, MASK_VALID);
    left_mask.set(8, 8, MASK_INVALID);
    let mut right_mask = ImageF32::filled(20, 20, 1.0);
    right_mask.set(12, 10, -1.0);

    let opts = MatchOptions::default()
        .with_radius(1)
        .with_hdisp(-3, 3)
        .with_vdisp(-1, 1);
    let pair = StereoPair::new(&left, &right)
        .with_left_mask(&left_mask)
        .with_right_mask(&right_mask);
    let (maps, report) = BlockMatcher::new(opts).unwrap().compute(&pair).unwrap();

    for (x, y) in [(8, 8), (12, 10)] {
        assert_eq!(maps.hdisp.get(x, y), -3.0);
        assert_eq!(maps.vdisp.get(x, y), -1.0);
        assert_eq!(maps.metric.get(x, y), 0.0);
        assert_eq!(maps.mask.get(x, y), MASK_INVALID);
    }
    assert_eq!(report.masked, 2);
    // The masked right centre is also excluded as a candidate for (11, 10).
    assert_eq!(maps.hdisp.get(5, 5), 1.0);
    assert_ne!(maps.hdisp.get(11, 10), 1.0);
}

#[test]
fn ssd_mean_excludes_zero_mean_blocks() {
    let (mut left, right) = shifted_pair(30, 20, 1, 0, 41);
    for y in 6..15 {
        for x in 10..19 {
            left.set(x, y, 0.0);
        }
    }
    let base = MatchOptions::default()
        .with_radius(1)
        .with_hdisp(-2, 2)
        .with_vdisp(0, 0);
    let pair = StereoPair::new(&left, &right);
    let (maps, report) = BlockMatcher::new(base.clone().with_metric(MetricKind::SsdMean))
        .unwrap()
        .compute(&pair)
        .unwrap();

    // Every candidate of a zero left block scores +inf and is dropped.
    for y in 7..14 {
        for x in 11..18 {
            assert_eq!(maps.hdisp.get(x, y), -2.0, "hdisp at ({x}, {y})");
            assert_eq!(maps.vdisp.get(x, y), 0.0);
            assert_eq!(maps.metric.get(x, y), 0.0);
            assert_eq!(maps.mask.get(x, y), MASK_INVALID);
        }
    }
    assert!(report.no_candidate >= 49);
    assert_eq!(maps.hdisp.get(5, 10), 1.0);
    assert_eq!(maps.metric.get(5, 10), 0.0);
    assert_eq!(maps.mask.get(5, 10), MASK_VALID);

    // Plain SSD still matches the flat block.
    let (ssd_maps, _) = BlockMatcher::new(base).unwrap().compute(&pair).unwrap();
    assert_eq!(ssd_maps.mask.get(14, 10), MASK_VALID);
}

#[test]
fn degenerate_window_reports_zero_disparity() {
    let left = hashed_texture(16, 12, 1);
    let right = hashed_texture(16, 12, 2);
    let opts = MatchOptions::default()
        .with_radius(1)
        .with_hdisp(0, 0)
        .with_vdisp(0, 0);
    let (maps, _) = BlockMatcher::new(opts)
        .unwrap()
        .compute(&StereoPair::new(&left, &right))
        .unwrap();
    assert!(maps.hdisp.data.iter().all(|&d| d == 0.0));
    assert!(maps.vdisp.data.iter().all(|&d| d == 0.0));
    for y in 1..11 {
        for x in 1..15 {
            assert_eq!(maps.mask.get(x, y), MASK_VALID);
        }
    }
}

#[test]
fn parallel_and_sequential_runs_are_identical() {
    let left = hashed_texture(37, 29, 11);
    let right = hashed_texture(37, 29, 12);
    let base = MatchOptions::default()
        .with_radius(2)
        .with_hdisp(-4, 3)
        .with_vdisp(-1, 1)
        .with_metric(MetricKind::Ncc);
    let seq = base.clone().with_parallel(ParallelOptions::disabled());
    let par = base.with_parallel(
        ParallelOptions::default()
            .with_rows_per_region(3)
            .with_min_pixels(0),
    );
    let pair = StereoPair::new(&left, &right);
    let (a, ra) = BlockMatcher::new(seq).unwrap().compute(&pair).unwrap();
    let (b, rb) = BlockMatcher::new(par).unwrap().compute(&pair).unwrap();

    let bits = |img: &ImageF32| img.data.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&a.hdisp), bits(&b.hdisp));
    assert_eq!(bits(&a.vdisp), bits(&b.vdisp));
    assert_eq!(bits(&a.metric), bits(&b.metric));
    assert_eq!(ra.candidates_evaluated, rb.candidates_evaluated);
}

#[test]
fn selected_candidate_is_optimal_among_explored() {
    let (w, h, r) = (24i32, 20i32, 2i32);
    let left = hashed_texture(w as usize, h as usize, 21);
    let right = hashed_texture(w as usize, h as usize, 22);
    let (hb, vb) = ((-3, 2), (-1, 1));

    for metric in [MetricKind::Ssd, MetricKind::Ncc] {
        let opts = MatchOptions::default()
            .with_radius(r as usize)
            .with_hdisp(hb.0, hb.1)
            .with_vdisp(vb.0, vb.1)
            .with_metric(metric);
        let (maps, _) = BlockMatcher::new(opts)
            .unwrap()
            .compute(&StereoPair::new(&left, &right))
            .unwrap();

        // Pixels whose whole search window stays inside the right image.
        for y in r - vb.0..h - r - vb.1 {
            for x in r - hb.0..w - r - hb.1 {
                let a = block(&left, x, y, r);
                let mut best = if metric.minimize() {
                    f64::INFINITY
                } else {
                    f64::NEG_INFINITY
                };
                for dy in vb.0..=vb.1 {
                    for dx in hb.0..=hb.1 {
                        let b = block(&right, x + dx, y + dy, r);
                        let s = if metric.minimize() { ssd(&a, &b) } else { ncc(&a, &b) };
                        best = if metric.minimize() { best.min(s) } else { best.max(s) };
                    }
                }
                let (ux, uy) = (x as usize, y as usize);
                let got = maps.metric.get(ux, uy) as f64;
                assert!(
                    (got - best).abs() <= 1e-4 * best.abs().max(1.0),
                    "{metric:?} at ({x}, {y}): reported {got}, best {best}"
                );
                let hd = maps.hdisp.get(ux, uy) as i32;
                let vd = maps.vdisp.get(ux, uy) as i32;
                let b = block(&right, x + hd, y + vd, r);
                let chosen = if metric.minimize() { ssd(&a, &b) } else { ncc(&a, &b) };
                assert!((chosen - best).abs() <= 1e-9 * best.abs().max(1.0));
            }
        }
    }
}

#[test]
fn lp_with_exponent_two_matches_ssd() {
    let left = hashed_texture(20, 16, 31);
    let right = hashed_texture(20, 16, 32);
    let pair = StereoPair::new(&left, &right);
    let base = MatchOptions::default().with_radius(1).with_hdisp(-2, 2);
    let (a, _) = BlockMatcher::new(base.clone().with_metric(MetricKind::Ssd))
        .unwrap()
        .compute(&pair)
        .unwrap();
    let (b, _) = BlockMatcher::new(base.with_metric(MetricKind::Lp { p: 2.0 }))
        .unwrap()
        .compute(&pair)
        .unwrap();
    assert_eq!(a.hdisp, b.hdisp);
    for (x, y) in a.metric.data.iter().zip(&b.metric.data) {
        assert!((x - y).abs() <= 1e-3 * x.abs().max(1.0));
    }
}

#[test]
fn subsampled_grid_matches_full_resolution_samples() {
    let (left, right) = shifted_pair(23, 17, 1, 0, 5);
    let base = MatchOptions::default().with_radius(2).with_hdisp(-2, 2);
    let pair = StereoPair::new(&left, &right);
    let (full, _) = BlockMatcher::new(base.clone()).unwrap().compute(&pair).unwrap();
    let (sub, _) = BlockMatcher::new(base.with_step(3, [1, 2]))
        .unwrap()
        .compute(&pair)
        .unwrap();

    assert_eq!(sub.grid.output_size, (8, 5));
    for oy in 0..5 {
        for ox in 0..8 {
            let (x, y) = sub.grid.to_input(ox, oy);
            assert_eq!(sub.hdisp.get(ox, oy), full.hdisp.get(x, y));
            assert_eq!(sub.metric.get(ox, oy), full.metric.get(x, y));
        }
    }
}

#[test]
fn map_exploration_follows_initial_estimates() {
    let (left, right) = shifted_pair(24, 16, 3, 0, 9);
    let init_h = ImageF32::filled(24, 16, 2.8);
    let init_v = ImageF32::new(24, 16);
    let opts = MatchOptions::default()
        .with_radius(2)
        .with_hdisp(-6, 6)
        .with_exploration(Exploration::Maps {
            radius_x: 0,
            radius_y: 0,
        });
    let matcher = BlockMatcher::new(opts).unwrap();

    let err = matcher.compute(&StereoPair::new(&left, &right)).unwrap_err();
    assert!(matches!(err, ConfigError::MissingInitialDisparity));

    let pair = StereoPair::new(&left, &right).with_initial_disparity(&init_h, &init_v);
    let (maps, report) = matcher.compute(&pair).unwrap();
    assert_eq!(maps.hdisp.get(10, 8), 3.0);
    assert_eq!(maps.metric.get(10, 8), 0.0);
    // One candidate per pixel that can hold the right block.
    assert!(report.candidates_evaluated <= (24 * 16) as u64);
}

#[test]
fn invalid_configuration_is_rejected_up_front() {
    let zero_radius = MatchOptions::default().with_radius(0);
    assert!(matches!(
        BlockMatcher::new(zero_radius),
        Err(ConfigError::InvalidRadius { radius: 0 })
    ));
    let inverted = MatchOptions::default().with_vdisp(2, -2);
    assert!(matches!(
        BlockMatcher::new(inverted),
        Err(ConfigError::InvertedBounds { .. })
    ));

    let left = ImageF32::new(8, 8);
    let right = ImageF32::new(8, 8);
    let bad_mask = ImageF32::new(7, 8);
    let pair = StereoPair::new(&left, &right).with_left_mask(&bad_mask);
    let err = BlockMatcher::new(MatchOptions::default())
        .unwrap()
        .compute(&pair)
        .unwrap_err();
    assert!(matches!(err, ConfigError::SizeMismatch { .. }));
}
