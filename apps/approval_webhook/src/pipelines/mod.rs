// apps/approval_webhook/src/pipelines/mod.rs

//! Pipelines run by the webhook server.

pub mod contexts;
pub mod decision_pipeline;

pub use decision_pipeline::{build_decision_pipeline, DecisionDeps};
