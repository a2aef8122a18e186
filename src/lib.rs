pub mod camera;
pub mod config;
pub mod depth;
pub mod error;
pub mod export;
pub mod frame;
pub mod pipeline;
pub mod pose;
pub mod render;
pub mod tracker;

pub use config::Config;
pub use error::{PipelineError, PipelineResult};
pub use pipeline::{FrameOutput, PipelineDriver, RunSummary};
