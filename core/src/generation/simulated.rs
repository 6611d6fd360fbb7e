// ranmix/src/generation/simulated.rs

//! In-process provider for demos and tests.

use super::model::{GenerationJob, GenerationRequest, JobStatus};
use super::GenerationProvider;
use crate::error::{RanmixError, RanmixResult};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

struct SimJob {
  job: GenerationJob,
  polls: u32,
}

/// Completes (or fails) each job after a fixed number of status polls.
pub struct SimulatedProvider {
  polls_until_done: u32,
  fail_jobs: bool,
  asset_base: String,
  jobs: Mutex<HashMap<String, SimJob>>,
  next_id: AtomicU64,
  submissions: AtomicU64,
}

impl SimulatedProvider {
  pub fn new(polls_until_done: u32) -> Self {
    Self {
      polls_until_done: polls_until_done.max(1),
      fail_jobs: false,
      asset_base: "https://example.com".to_string(),
      jobs: Mutex::new(HashMap::new()),
      next_id: AtomicU64::new(1),
      submissions: AtomicU64::new(0),
    }
  }

  /// Jobs end in `failed` instead of `completed`.
  pub fn failing(mut self) -> Self {
    self.fail_jobs = true;
    self
  }

  pub fn with_asset_base(mut self, base: impl Into<String>) -> Self {
    self.asset_base = base.into().trim_end_matches('/').to_string();
    self
  }

  pub fn submissions(&self) -> u64 {
    self.submissions.load(Ordering::SeqCst)
  }
}

impl Default for SimulatedProvider {
  fn default() -> Self {
    Self::new(3)
  }
}

fn truncated(s: &str, n: usize) -> String {
  s.chars().take(n).collect()
}

#[async_trait]
impl GenerationProvider for SimulatedProvider {
  fn name(&self) -> &'static str {
    "simulated"
  }

  async fn submit(&self, request: &GenerationRequest) -> RanmixResult<GenerationJob> {
    self.submissions.fetch_add(1, Ordering::SeqCst);
    let id = format!("sim_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
    let prompt = request.effective_prompt();
    let job = GenerationJob {
      id: id.clone(),
      status: JobStatus::Processing,
      title: Some(format!("🎵 {}...", truncated(&prompt, 30))),
      prompt,
      style: Some(request.effective_style().to_string()),
      duration_seconds: Some(request.effective_duration()),
      instrumental: request.instrumental,
      result_url: None,
      video_url: None,
      tags: vec!["AI Generated".to_string(), "RAN MIXOLOGY".to_string()],
      error: None,
      created_at: Utc::now(),
    };
    self.jobs.lock().insert(id, SimJob { job: job.clone(), polls: 0 });
    Ok(job)
  }

  async fn status(&self, job_id: &str) -> RanmixResult<GenerationJob> {
    let mut jobs = self.jobs.lock();
    let sim = jobs
      .get_mut(job_id)
      .ok_or_else(|| RanmixError::NotFound(format!("generation job '{}'", job_id)))?;
    if sim.job.status.is_terminal() {
      return Ok(sim.job.clone());
    }
    sim.polls += 1;
    if sim.polls >= self.polls_until_done {
      if self.fail_jobs {
        sim.job.status = JobStatus::Failed;
        sim.job.error = Some("simulated generation failure".to_string());
      } else {
        sim.job.status = JobStatus::Completed;
        sim.job.result_url = Some(format!("{}/generated-music-{}.mp3", self.asset_base, job_id));
        sim.job.video_url = Some(format!("{}/generated-music-{}.mp4", self.asset_base, job_id));
        sim.job.title = Some(format!("🎵 {} - RAN MIXOLOGY", truncated(&sim.job.prompt, 40)));
        sim.job.tags.push("Suno AI".to_string());
      }
    }
    Ok(sim.job.clone())
  }
}
