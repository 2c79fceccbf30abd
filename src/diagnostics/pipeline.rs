use crate::diagnostics::{MatchReport, RefineReport, TimingBreakdown};
use serde::{Deserialize, Serialize};

/// End-to-end trace of a [`DisparityPipeline`](crate::DisparityPipeline) run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub matching: MatchReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_matching: Option<MatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<RefineReport>,
    pub postprocess: PostprocessReport,
    /// Output pixels still valid after every stage.
    pub valid_pixels: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub left_width: usize,
    pub left_height: usize,
    pub right_width: usize,
    pub right_height: usize,
    pub output_width: usize,
    pub output_height: usize,
}

/// Pixels invalidated by each post-processing filter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostprocessReport {
    pub median_incoherent: usize,
    pub bijection_rejected: usize,
    pub metric_rejected: usize,
}
