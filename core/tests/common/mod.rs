// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use ranmix::channel::{EvidenceImage, InMemoryChannel, NotificationChannelClient};
use ranmix::clock::ManualClock;
use ranmix::config::WorkflowConfig;
use ranmix::generation::{GenerationJob, GenerationProvider, GenerationRequest, JobStatus, SimulatedProvider};
use ranmix::order::MemoryOrderRepository;
use ranmix::store::StorageBackend;
use ranmix::workflow::{ApprovalGatedOrder, PaymentForm, WorkflowDeps};
use ranmix::{DecisionStrategy, GenerationClient, PollPolicy, RanmixError, RanmixResult};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

// --- Tracing ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Storage ---

/// Reads like an empty store; every write fails.
#[derive(Default)]
pub struct FailingStorage {
  pub write_attempts: AtomicUsize,
}

impl StorageBackend for FailingStorage {
  fn read(&self, _key: &str) -> RanmixResult<Option<String>> {
    Ok(None)
  }

  fn write(&self, key: &str, _value: &str) -> RanmixResult<()> {
    self.write_attempts.fetch_add(1, Ordering::SeqCst);
    Err(RanmixError::Persistence {
      key: key.to_string(),
      reason: "quota exceeded".to_string(),
    })
  }

  fn remove(&self, _key: &str) -> RanmixResult<()> {
    Ok(())
  }
}

// --- Generation ---

/// Plays back a fixed list of status responses, then repeats the last one.
pub struct ScriptedProvider {
  script: Mutex<VecDeque<RanmixResult<JobStatus>>>,
  last: Mutex<Option<JobStatus>>,
  pub status_calls: AtomicUsize,
  pub submissions: AtomicUsize,
}

impl ScriptedProvider {
  pub fn new(script: Vec<RanmixResult<JobStatus>>) -> Self {
    Self {
      script: Mutex::new(script.into()),
      last: Mutex::new(None),
      status_calls: AtomicUsize::new(0),
      submissions: AtomicUsize::new(0),
    }
  }

  pub fn job(id: &str, status: JobStatus) -> GenerationJob {
    GenerationJob {
      id: id.to_string(),
      status,
      prompt: "jazz piano".to_string(),
      style: Some("auto".to_string()),
      duration_seconds: Some(30),
      instrumental: false,
      result_url: (status == JobStatus::Completed).then(|| format!("https://cdn.example.com/{}.mp3", id)),
      video_url: None,
      title: Some("jazz piano".to_string()),
      tags: vec![],
      error: (status == JobStatus::Failed).then(|| "model crashed".to_string()),
      created_at: fixed_now(),
    }
  }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
  fn name(&self) -> &'static str {
    "scripted"
  }

  async fn submit(&self, _request: &GenerationRequest) -> RanmixResult<GenerationJob> {
    self.submissions.fetch_add(1, Ordering::SeqCst);
    Ok(Self::job("job-1", JobStatus::Pending))
  }

  async fn status(&self, job_id: &str) -> RanmixResult<GenerationJob> {
    self.status_calls.fetch_add(1, Ordering::SeqCst);
    let next = self.script.lock().pop_front();
    let status = match next {
      Some(Ok(status)) => status,
      Some(Err(e)) => return Err(e),
      None => self.last.lock().unwrap_or(JobStatus::Processing),
    };
    *self.last.lock() = Some(status);
    Ok(Self::job(job_id, status))
  }
}

pub fn transport_blip() -> RanmixResult<JobStatus> {
  Err(RanmixError::Transport {
    service: "generation provider",
    reason: "502 Bad Gateway".to_string(),
  })
}

// --- Orders and sessions ---

pub fn fixed_now() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
}

pub fn receipt_image() -> EvidenceImage {
  EvidenceImage::new("receipt.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]).unwrap()
}

pub fn payment_form(name: &str) -> PaymentForm {
  PaymentForm {
    customer_name: name.to_string(),
    email: format!("{}@example.com", name.to_lowercase()),
    phone: "0901234567".to_string(),
    amount: 50_000,
    payment_method: "bank transfer".to_string(),
    evidence: Some(receipt_image()),
  }
}

/// Everything a session needs, with handles on the fakes.
pub struct Harness {
  pub channel: Arc<InMemoryChannel>,
  pub orders: Arc<MemoryOrderRepository>,
  pub clock: ManualClock,
  pub deps: Arc<WorkflowDeps>,
}

impl Harness {
  pub fn with_provider(provider: Arc<dyn GenerationProvider>) -> Self {
    Self::build(provider, false)
  }

  /// Sessions re-read the order record at the configured decision interval.
  pub fn polling() -> Self {
    let provider = Arc::new(SimulatedProvider::new(2).with_asset_base("https://cdn.example.com"));
    Self::build(provider, true)
  }

  fn build(provider: Arc<dyn GenerationProvider>, poll: bool) -> Self {
    let channel = Arc::new(InMemoryChannel::new());
    let orders = Arc::new(MemoryOrderRepository::new());
    let clock = ManualClock::new(fixed_now());
    let client = NotificationChannelClient::new(channel.clone(), orders.clone());
    let generation = GenerationClient::new(
      provider,
      PollPolicy {
        interval: Duration::from_secs(5),
        max_attempts: 6,
      },
    );
    let config = WorkflowConfig {
      approval_window: Duration::from_secs(300),
      decision_poll_interval: Duration::from_secs(3),
    };
    let strategy = if poll {
      DecisionStrategy::poll(&config)
    } else {
      DecisionStrategy::Push
    };
    let deps = Arc::new(
      WorkflowDeps::new(client, generation, Arc::new(clock.clone()), config).with_decision_strategy(strategy),
    );
    Self {
      channel,
      orders,
      clock,
      deps,
    }
  }

  pub fn simulated() -> (Self, Arc<SimulatedProvider>) {
    let provider = Arc::new(SimulatedProvider::new(2).with_asset_base("https://cdn.example.com"));
    (Self::with_provider(provider.clone()), provider)
  }

  pub fn session(&self) -> ApprovalGatedOrder {
    ApprovalGatedOrder::new(self.deps.clone())
  }
}
