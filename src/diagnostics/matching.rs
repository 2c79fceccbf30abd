use serde::{Deserialize, Serialize};

/// Summary of one block-matching pass.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub output_width: usize,
    pub output_height: usize,
    pub metric: String,
    /// Number of bands the output grid was split into.
    pub regions: usize,
    /// Pixels rejected by the left or right mask.
    pub masked: usize,
    /// Pixels for which no candidate could be scored.
    pub no_candidate: usize,
    pub candidates_evaluated: u64,
    pub elapsed_ms: f64,
}
