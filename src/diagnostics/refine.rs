use serde::{Deserialize, Serialize};

/// Outcome counts of the sub-pixel refinement pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineReport {
    pub method: String,
    /// Pixels that received a fractional correction on at least one axis.
    pub refined: usize,
    /// Pixels whose integer disparity was not a local optimum.
    pub wrong_extrema: usize,
    /// Pixels the matcher left invalid or whose left centre is masked.
    pub masked: usize,
    /// Pixels passed through for any other reason (no score at the integer
    /// disparity, no usable neighbour, exact match).
    pub skipped: usize,
    pub elapsed_ms: f64,
}

impl RefineReport {
    pub(crate) fn merge(&mut self, other: &RefineReport) {
        self.refined += other.refined;
        self.wrong_extrema += other.wrong_extrema;
        self.masked += other.masked;
        self.skipped += other.skipped;
    }
}
