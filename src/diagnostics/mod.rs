//! Serializable reports returned by every stage of the disparity engine.
//!
//! `PipelineReport` is the main entry point returned by the pipeline,
//! bundling the matcher, refinement and post-processing reports plus a timing
//! breakdown. Each stage report can also be obtained on its own from the
//! stage API.

pub mod matching;
pub mod pipeline;
pub mod refine;
pub mod timing;

pub use matching::MatchReport;
pub use pipeline::{InputDescriptor, PipelineReport, PostprocessReport};
pub use refine::RefineReport;
pub use timing::{StageTiming, TimingBreakdown};
