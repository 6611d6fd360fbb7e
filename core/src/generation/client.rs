// ranmix/src/generation/client.rs

//! `GenerationClient`: request submission and bounded status polling.

use super::model::{GenerationJob, GenerationRequest, JobStatus};
use super::GenerationProvider;
use crate::error::{RanmixError, RanmixResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

/// Fixed-interval polling budget. Total wall time is bounded by `interval * max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
  pub interval: Duration,
  pub max_attempts: u32,
}

impl Default for PollPolicy {
  fn default() -> Self {
    Self {
      interval: Duration::from_secs(5),
      max_attempts: 60,
    }
  }
}

impl PollPolicy {
  pub fn budget(&self) -> Duration {
    self.interval * self.max_attempts
  }
}

/// Handed to the progress callback after every poll attempt.
#[derive(Debug, Clone)]
pub struct PollProgress {
  pub attempt: u32,
  pub max_attempts: u32,
  pub elapsed: Duration,
  /// Most recent successful snapshot; `None` until a poll has succeeded.
  pub snapshot: Option<GenerationJob>,
}

#[derive(Clone)]
pub struct GenerationClient {
  provider: Arc<dyn GenerationProvider>,
  policy: PollPolicy,
}

impl GenerationClient {
  pub fn new(provider: Arc<dyn GenerationProvider>, policy: PollPolicy) -> Self {
    Self { provider, policy }
  }

  pub fn policy(&self) -> PollPolicy {
    self.policy
  }

  /// Submits `request`. An empty prompt fails with `Validation` before the provider is contacted.
  #[instrument(name = "GenerationClient::request", skip_all, fields(provider = self.provider.name()), err(Display))]
  pub async fn request(&self, request: &GenerationRequest) -> RanmixResult<GenerationJob> {
    request.validate()?;
    let job = self.provider.submit(request).await?;
    event!(Level::INFO, job_id = %job.id, status = ?job.status, "Generation job submitted.");
    Ok(job)
  }

  pub async fn poll(&self, job_id: &str) -> RanmixResult<GenerationJob> {
    self.provider.status(job_id).await
  }

  /// Polls `job_id` with the client's policy. See [`GenerationClient::run_with_policy`].
  pub async fn run_to_completion(
    &self,
    job_id: &str,
    on_progress: &(dyn Fn(&PollProgress) + Send + Sync),
    cancel: &CancellationToken,
  ) -> RanmixResult<GenerationJob> {
    self.run_with_policy(job_id, self.policy, on_progress, cancel).await
  }

  /// Polls until the job is terminal or the attempt budget runs out.
  ///
  /// Transport errors use up an attempt and are retried. A provider-reported failure ends the
  /// run with `Provider`. Exhausting the budget yields `Timeout`. Cancelling `cancel` stops
  /// between attempts with `Cancelled`.
  #[instrument(name = "GenerationClient::run_to_completion", skip(self, on_progress, cancel), err(Display))]
  pub async fn run_with_policy(
    &self,
    job_id: &str,
    policy: PollPolicy,
    on_progress: &(dyn Fn(&PollProgress) + Send + Sync),
    cancel: &CancellationToken,
  ) -> RanmixResult<GenerationJob> {
    let started = Instant::now();
    let mut last_snapshot: Option<GenerationJob> = None;

    for attempt in 1..=policy.max_attempts {
      if cancel.is_cancelled() {
        return Err(RanmixError::Cancelled);
      }

      match self.provider.status(job_id).await {
        Ok(job) => {
          on_progress(&PollProgress {
            attempt,
            max_attempts: policy.max_attempts,
            elapsed: started.elapsed(),
            snapshot: Some(job.clone()),
          });
          match job.status {
            JobStatus::Completed => {
              event!(Level::INFO, attempt, "Generation job completed.");
              return Ok(job);
            }
            JobStatus::Failed => {
              return Err(RanmixError::Provider {
                job_id: job_id.to_string(),
                reason: job.error.unwrap_or_else(|| "provider reported failure".to_string()),
              });
            }
            JobStatus::Pending | JobStatus::Processing => last_snapshot = Some(job),
          }
        }
        Err(e) if e.is_retryable() => {
          event!(Level::WARN, attempt, error = %e, "Status poll failed; retrying.");
          on_progress(&PollProgress {
            attempt,
            max_attempts: policy.max_attempts,
            elapsed: started.elapsed(),
            snapshot: last_snapshot.clone(),
          });
        }
        Err(e) => return Err(e),
      }

      if attempt < policy.max_attempts {
        tokio::select! {
          _ = cancel.cancelled() => return Err(RanmixError::Cancelled),
          _ = tokio::time::sleep(policy.interval) => {}
        }
      }
    }

    Err(RanmixError::Timeout {
      waiting_for: format!("generation job '{}'", job_id),
      waited: started.elapsed(),
    })
  }
}
