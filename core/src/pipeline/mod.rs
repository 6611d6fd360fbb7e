// ranmix/src/pipeline/mod.rs

//! A small named-step async pipeline used to sequence multi-step operations
//! such as order submission and chat-bot callback processing.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};
