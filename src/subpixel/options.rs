use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Sub-pixel refinement strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefineMethod {
    /// Keep the integer disparities.
    None,
    /// Vertex of a parabola through the three scores of each axis, or of a
    /// 2D quadratic when the full 3×3 neighbourhood is available.
    #[default]
    Parabolic,
    /// Equiangular (V-shaped) fit on each axis.
    Triangular,
    /// Bracket halving on the right image resampled at fractional offsets.
    Dichotomy,
}

impl RefineMethod {
    pub fn label(&self) -> &'static str {
        match self {
            RefineMethod::None => "none",
            RefineMethod::Parabolic => "parabolic",
            RefineMethod::Triangular => "triangular",
            RefineMethod::Dichotomy => "dichotomy",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubPixelOptions {
    pub method: RefineMethod,
    /// Maximum bracket halvings per axis for [`RefineMethod::Dichotomy`].
    pub dichotomy_iterations: usize,
    /// Stop halving once the bracket half-width drops below this (pixels).
    pub dichotomy_tolerance: f64,
}

impl Default for SubPixelOptions {
    fn default() -> Self {
        Self {
            method: RefineMethod::Parabolic,
            dichotomy_iterations: 10,
            dichotomy_tolerance: 1e-3,
        }
    }
}

impl SubPixelOptions {
    pub fn with_method(mut self, method: RefineMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_dichotomy(mut self, iterations: usize, tolerance: f64) -> Self {
        self.dichotomy_iterations = iterations;
        self.dichotomy_tolerance = tolerance;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.method != RefineMethod::Dichotomy {
            return Ok(());
        }
        if self.dichotomy_iterations == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "dichotomy_iterations",
                reason: "must be >= 1".to_string(),
            });
        }
        if !(self.dichotomy_tolerance.is_finite() && self.dichotomy_tolerance > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "dichotomy_tolerance",
                reason: format!("must be a positive number (got {})", self.dichotomy_tolerance),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dichotomy_parameters_are_checked() {
        assert!(SubPixelOptions::default().validate().is_ok());
        let d = SubPixelOptions::default().with_method(RefineMethod::Dichotomy);
        assert!(d.validate().is_ok());
        assert!(d.with_dichotomy(0, 1e-3).validate().is_err());
        assert!(d.with_dichotomy(5, -1.0).validate().is_err());
        // Ignored for the closed-form methods.
        assert!(SubPixelOptions::default()
            .with_dichotomy(0, 0.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn method_names_round_trip_through_json() {
        let m: RefineMethod = serde_json::from_str("\"triangular\"").unwrap();
        assert_eq!(m, RefineMethod::Triangular);
        assert_eq!(serde_json::to_string(&RefineMethod::None).unwrap(), "\"none\"");
    }
}
