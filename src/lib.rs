#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod matcher;
pub mod pipeline;
pub mod subpixel;

// Building blocks shared by the stages; public for tools and tests.
pub mod config;
pub mod interpolation;
pub mod masking;
pub mod metric;
pub mod postprocess;
pub mod tiling;

// --- High-level re-exports -------------------------------------------------

// Main entry points.
pub use crate::error::ConfigError;
pub use crate::matcher::{BlockMatcher, DisparityMaps, MatchOptions, StereoPair};
pub use crate::metric::MetricKind;
pub use crate::pipeline::{DisparityOutput, DisparityPipeline, PipelineOptions};
pub use crate::subpixel::{RefineMethod, SubPixelOptions, SubPixelRefiner};

// Reports returned by the entry points.
pub use crate::diagnostics::{MatchReport, PipelineReport, RefineReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```
/// use block_disparity::prelude::*;
///
/// let left = ImageF32::from_fn(24, 12, |x, y| ((x * x + 3 * y) % 17) as f32);
/// let right = left.clone();
/// let pipeline = DisparityPipeline::new(PipelineOptions::default())?;
/// let out = pipeline.run(&StereoPair::new(&left, &right))?;
/// assert_eq!(out.to_bands(true).len(), 3);
/// # Ok::<(), ConfigError>(())
/// ```
pub mod prelude {
    pub use crate::image::ImageF32;
    pub use crate::{
        BlockMatcher, ConfigError, DisparityPipeline, MatchOptions, MetricKind, PipelineOptions,
        RefineMethod, StereoPair, SubPixelOptions,
    };
}
