// tests/generation_client_tests.rs
mod common;

use common::*;
use parking_lot::Mutex;
use ranmix::generation::{GenerationProvider, JobStatus, PollProgress, SimulatedProvider};
use ranmix::{GenerationClient, GenerationRequest, PollPolicy, RanmixError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn policy(max_attempts: u32) -> PollPolicy {
  PollPolicy {
    interval: Duration::from_secs(5),
    max_attempts,
  }
}

fn client_for(provider: Arc<dyn GenerationProvider>, max_attempts: u32) -> GenerationClient {
  GenerationClient::new(provider, policy(max_attempts))
}

/// Collects every progress report handed to the callback.
fn recorder() -> (Arc<Mutex<Vec<PollProgress>>>, impl Fn(&PollProgress) + Send + Sync) {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let sink = seen.clone();
  (seen, move |p: &PollProgress| sink.lock().push(p.clone()))
}

#[tokio::test]
async fn blank_prompt_never_reaches_the_provider() {
  setup_tracing();
  let provider = Arc::new(SimulatedProvider::default());
  let client = client_for(provider.clone(), 6);

  let err = client.request(&GenerationRequest::new("   ")).await.unwrap_err();
  assert!(matches!(err, RanmixError::Validation(_)));
  assert_eq!(provider.submissions(), 0);
}

#[tokio::test(start_paused = true)]
async fn job_runs_to_completion_with_progress() {
  setup_tracing();
  let provider = Arc::new(SimulatedProvider::new(3).with_asset_base("https://cdn.example.com/"));
  let client = client_for(provider.clone(), 6);

  let job = client
    .request(&GenerationRequest::new("jazz piano").instrumental(true))
    .await
    .unwrap();
  assert_eq!(job.status, JobStatus::Processing);
  assert_eq!(job.style.as_deref(), Some("auto"));
  assert_eq!(job.duration_seconds, Some(30));

  let (seen, on_progress) = recorder();
  let done = client
    .run_to_completion(&job.id, &on_progress, &CancellationToken::new())
    .await
    .unwrap();

  assert_eq!(done.status, JobStatus::Completed);
  assert_eq!(
    done.result_url.as_deref(),
    Some(format!("https://cdn.example.com/generated-music-{}.mp3", job.id).as_str())
  );
  let seen = seen.lock();
  assert_eq!(seen.len(), 3);
  assert_eq!(seen.iter().map(|p| p.attempt).collect::<Vec<_>>(), vec![1, 2, 3]);
  assert_eq!(seen[2].elapsed, Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn transport_blips_use_an_attempt_and_are_retried() {
  let provider = Arc::new(ScriptedProvider::new(vec![
    Ok(JobStatus::Processing),
    transport_blip(),
    transport_blip(),
    Ok(JobStatus::Completed),
  ]));
  let client = client_for(provider.clone(), 6);
  let (seen, on_progress) = recorder();

  let done = client
    .run_to_completion("job-1", &on_progress, &CancellationToken::new())
    .await
    .unwrap();
  assert_eq!(done.status, JobStatus::Completed);
  assert_eq!(provider.status_calls.load(Ordering::SeqCst), 4);

  // Failed polls still report, carrying the last good snapshot.
  let seen = seen.lock();
  assert_eq!(seen.len(), 4);
  assert_eq!(
    seen[1].snapshot.as_ref().map(|j| j.status),
    Some(JobStatus::Processing)
  );
}

#[tokio::test(start_paused = true)]
async fn provider_failure_ends_the_run_without_retry() {
  let provider = Arc::new(ScriptedProvider::new(vec![Ok(JobStatus::Processing), Ok(JobStatus::Failed)]));
  let client = client_for(provider.clone(), 6);

  let err = client
    .run_to_completion("job-1", &|_: &PollProgress| {}, &CancellationToken::new())
    .await
    .unwrap_err();
  match err {
    RanmixError::Provider { job_id, reason } => {
      assert_eq!(job_id, "job-1");
      assert_eq!(reason, "model crashed");
    }
    other => panic!("expected a provider error, got {}", other),
  }
  assert_eq!(provider.status_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn stuck_job_times_out_within_the_budget() {
  let provider = Arc::new(ScriptedProvider::new(vec![Ok(JobStatus::Processing)]));
  let client = client_for(provider.clone(), 6);
  let started = tokio::time::Instant::now();

  let err = client
    .run_to_completion("job-1", &|_: &PollProgress| {}, &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, RanmixError::Timeout { .. }));
  assert_eq!(provider.status_calls.load(Ordering::SeqCst), 6);
  assert!(started.elapsed() <= client.policy().budget());
}

#[tokio::test(start_paused = true)]
async fn unknown_job_is_not_retried() {
  let provider = Arc::new(SimulatedProvider::default());
  let client = client_for(provider, 6);
  let started = tokio::time::Instant::now();

  let err = client
    .run_to_completion("sim_404", &|_: &PollProgress| {}, &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(err, RanmixError::NotFound(_)));
  assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_polling_between_attempts() {
  let provider = Arc::new(ScriptedProvider::new(vec![Ok(JobStatus::Processing)]));
  let client = client_for(provider.clone(), 60);
  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_secs(12)).await;
    trigger.cancel();
  });

  let err = client
    .run_to_completion("job-1", &|_: &PollProgress| {}, &cancel)
    .await
    .unwrap_err();
  assert!(matches!(err, RanmixError::Cancelled));
  // Polls at 0s, 5s and 10s; cancelled during the third sleep.
  assert_eq!(provider.status_calls.load(Ordering::SeqCst), 3);
}

#[test]
fn request_defaults_and_drink_inspired_prompts() {
  let plain = GenerationRequest::new("rainy afternoon");
  assert_eq!(plain.effective_style(), "auto");
  assert_eq!(plain.effective_duration(), 30);

  let inspired = GenerationRequest::new("rainy afternoon").inspired_by("Lychee Mojito", "chill");
  let prompt = inspired.effective_prompt();
  assert!(prompt.contains("rainy afternoon"));
  assert!(prompt.contains("Lychee Mojito"));
}
