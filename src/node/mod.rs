//! Node orchestration

pub mod pipeline;

pub use pipeline::{TickPipeline, TickReport};
