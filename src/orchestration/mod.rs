//! Request orchestration: the postback resolution pipeline.

pub mod pipeline;

pub use pipeline::{PipelineError, PostbackOutcome, PostbackPipeline, PostbackRequest};
