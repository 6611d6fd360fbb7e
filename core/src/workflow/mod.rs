// ranmix/src/workflow/mod.rs

//! The approval-gated order: payment evidence in, human decision, then AI track generation.

pub mod pipelines;
pub mod session;
pub mod state;

pub use pipelines::{submission_pipeline, RecordedHook, SubmissionCtx, SubmissionCtxData};
pub use session::{ApprovalGatedOrder, DownloadTarget, WorkflowDeps};
pub use state::{OrderPhase, PaymentForm, SessionSnapshot};
