//! Row-band partitioning of an output grid and the region driver.
//!
//! The output grid is split into full-width bands of `rows_per_region` rows.
//! Each band is computed into its own buffers, sequentially or with Rayon, and
//! the results are returned in band order so that stitching is independent of
//! scheduling. Bands only read shared immutable inputs.

use crate::image::{ImageF32, Region};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Controls whether regions are processed sequentially or with Rayon.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelOptions {
    pub enabled: bool,
    /// Output rows per band.
    pub rows_per_region: usize,
    /// Smallest output grid (in pixels) worth dispatching to the pool.
    pub min_pixels_for_parallel: usize,
}

impl ParallelOptions {
    /// Sequential execution regardless of image size.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn with_rows_per_region(mut self, rows: usize) -> Self {
        self.rows_per_region = rows.max(1);
        self
    }

    pub fn with_min_pixels(mut self, pixels: usize) -> Self {
        self.min_pixels_for_parallel = pixels;
        self
    }

    /// Returns true when a grid of `pixel_count` outputs should use the pool.
    pub fn should_parallelize(&self, pixel_count: usize) -> bool {
        self.enabled && pixel_count >= self.min_pixels_for_parallel
    }
}

impl Default for ParallelOptions {
    fn default() -> Self {
        Self {
            enabled: cfg!(feature = "parallel"),
            rows_per_region: 32,
            min_pixels_for_parallel: 4096,
        }
    }
}

/// Progress notification emitted after a band completes.
#[derive(Clone, Copy, Debug)]
pub struct RegionProgress {
    /// Bands finished so far, including this one.
    pub completed: usize,
    pub total: usize,
    pub region: Region,
}

/// Progress callback shared by worker threads.
pub type ProgressFn<'a> = &'a (dyn Fn(RegionProgress) + Sync);

/// Split a `width × height` grid into full-width bands of at most
/// `rows_per_region` rows, top to bottom.
pub fn partition_rows(width: usize, height: usize, rows_per_region: usize) -> Vec<Region> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let rows = rows_per_region.max(1);
    (0..height)
        .step_by(rows)
        .map(|y0| Region::new(0, y0, width, rows.min(height - y0)))
        .collect()
}

/// Evaluate `f` over every region and return the results in region order.
pub fn run_regions<T, F>(
    regions: &[Region],
    parallel: &ParallelOptions,
    progress: Option<ProgressFn<'_>>,
    f: F,
) -> Vec<T>
where
    T: Send,
    F: Fn(&Region) -> T + Sync,
{
    let total = regions.len();
    let completed = AtomicUsize::new(0);
    let task = |region: &Region| {
        let out = f(region);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(cb) = progress {
            cb(RegionProgress {
                completed: done,
                total,
                region: *region,
            });
        }
        out
    };

    let pixels: usize = regions.iter().map(Region::area).sum();
    if total > 1 && parallel.should_parallelize(pixels) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            return regions.par_iter().map(task).collect();
        }
    }
    regions.iter().map(task).collect()
}

/// Concatenate full-width band buffers, in band order, into one raster.
pub fn stitch_rows<I>(width: usize, height: usize, bands: I) -> ImageF32
where
    I: IntoIterator<Item = Vec<f32>>,
{
    let mut data = Vec::with_capacity(width * height);
    for band in bands {
        data.extend_from_slice(&band);
    }
    data.resize(width * height, 0.0);
    ImageF32 {
        w: width,
        h: height,
        stride: width,
        data,
    }
}
