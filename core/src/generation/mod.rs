// ranmix/src/generation/mod.rs

//! AI music generation: provider seam, polling client and download naming.

pub mod client;
pub mod filename;
pub mod http;
pub mod model;
pub mod simulated;

use crate::error::RanmixResult;
use async_trait::async_trait;

pub use client::{GenerationClient, PollPolicy, PollProgress};
pub use filename::{branded_download_url, generate_download_filename, BRAND};
pub use http::HttpGenerationProvider;
pub use model::{GenerationJob, GenerationRequest, JobStatus};
pub use simulated::SimulatedProvider;

/// An external system that turns prompts into audio.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
  fn name(&self) -> &'static str;

  /// Submits a request and returns the provider's initial job snapshot.
  async fn submit(&self, request: &GenerationRequest) -> RanmixResult<GenerationJob>;

  /// One status round trip.
  async fn status(&self, job_id: &str) -> RanmixResult<GenerationJob>;
}
