//! Configuration errors raised before any pixel is processed.
//!
//! Per-pixel degeneracies (masked pixels, empty search windows, flat metric
//! curvature, failed extremum checks) are never reported here; they resolve
//! to documented default values in the output rasters.

use std::fmt;

/// Which disparity axis a parameter refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => f.write_str("horizontal"),
            Axis::Vertical => f.write_str("vertical"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Block radius must be at least 1.
    InvalidRadius { radius: usize },
    /// `min > max` on one disparity axis.
    InvertedBounds { axis: Axis, min: i32, max: i32 },
    /// Subsampling step must be at least 1.
    InvalidStep,
    /// Grid phase must lie in `[0, step - 1]` on both axes.
    GridIndexOutOfRange { grid_index: [usize; 2], step: usize },
    /// A required raster has zero width or height.
    EmptyImage { name: &'static str },
    /// A raster does not share the grid of the image it is attached to.
    SizeMismatch {
        name: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// Map-based exploration was requested without both initial maps.
    MissingInitialDisparity,
    /// Parameter outside of its admissible domain.
    InvalidParameter { name: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidRadius { radius } => {
                write!(f, "block radius must be >= 1 (got {radius})")
            }
            ConfigError::InvertedBounds { axis, min, max } => write!(
                f,
                "minimum {axis} disparity {min} exceeds maximum {axis} disparity {max}"
            ),
            ConfigError::InvalidStep => write!(f, "subsampling step must be >= 1"),
            ConfigError::GridIndexOutOfRange { grid_index, step } => write!(
                f,
                "grid index ({}, {}) must lie in [0, {}] on both axes",
                grid_index[0],
                grid_index[1],
                step.saturating_sub(1)
            ),
            ConfigError::EmptyImage { name } => write!(f, "{name} is empty"),
            ConfigError::SizeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "{name} is {}x{}, expected {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            ConfigError::MissingInitialDisparity => write!(
                f,
                "map-based exploration requires both horizontal and vertical initial disparity maps"
            ),
            ConfigError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Check that `image` has the `expected` size, naming it in the error.
pub(crate) fn ensure_size(
    name: &'static str,
    expected: (usize, usize),
    found: (usize, usize),
) -> Result<(), ConfigError> {
    if expected == found {
        Ok(())
    } else {
        Err(ConfigError::SizeMismatch {
            name,
            expected,
            found,
        })
    }
}
