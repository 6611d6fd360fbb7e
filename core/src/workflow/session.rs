// ranmix/src/workflow/session.rs

//! `ApprovalGatedOrder`: one customer's trip from payment evidence to a finished track.

use super::pipelines::{submission_pipeline, RecordedHook, SubmissionCtx, SubmissionCtxData};
use super::state::{OrderPhase, PaymentForm, SessionSnapshot};
use crate::channel::{DecisionStrategy, NotificationChannelClient};
use crate::clock::Clock;
use crate::config::WorkflowConfig;
use crate::error::{RanmixError, RanmixResult};
use crate::generation::{branded_download_url, generate_download_filename, GenerationClient, GenerationJob, GenerationRequest, PollProgress};
use crate::order::{Order, OrderStatus};
use crate::pipeline::{ContextData, Pipeline, PipelineResult};
use crate::task::TaskHandle;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

/// Collaborators shared by every session.
pub struct WorkflowDeps {
  pub channel: NotificationChannelClient,
  pub generation: GenerationClient,
  pub clock: Arc<dyn Clock>,
  pub config: WorkflowConfig,
  /// Used by [`ApprovalGatedOrder::await_approval`]. Push unless set otherwise.
  pub decision_strategy: DecisionStrategy,
  pub(crate) submission: Pipeline<SubmissionCtxData, RanmixError>,
}

impl WorkflowDeps {
  pub fn new(
    channel: NotificationChannelClient,
    generation: GenerationClient,
    clock: Arc<dyn Clock>,
    config: WorkflowConfig,
  ) -> Self {
    Self {
      channel,
      generation,
      clock,
      config,
      decision_strategy: DecisionStrategy::Push,
      submission: submission_pipeline(),
    }
  }

  pub fn with_decision_strategy(mut self, strategy: DecisionStrategy) -> Self {
    self.decision_strategy = strategy;
    self
  }
}

/// Where the finished track can be fetched, with its branded file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
  pub url: String,
  pub filename: String,
}

/// A single session. Transitions are strictly sequential; every async result is discarded
/// once the session is cancelled.
pub struct ApprovalGatedOrder {
  deps: Arc<WorkflowDeps>,
  phase: OrderPhase,
  submission: Option<SubmissionCtx>,
  /// Whether the approver has seen this order at least once.
  delivered: bool,
  order_status: Option<OrderStatus>,
  job: Option<GenerationJob>,
  last_error: Option<String>,
  cancel: CancellationToken,
  snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl ApprovalGatedOrder {
  pub fn new(deps: Arc<WorkflowDeps>) -> Self {
    let (snapshot_tx, _) = watch::channel(SessionSnapshot::initial());
    Self {
      deps,
      phase: OrderPhase::Created,
      submission: None,
      delivered: false,
      order_status: None,
      job: None,
      last_error: None,
      cancel: CancellationToken::new(),
      snapshot_tx,
    }
  }

  pub fn phase(&self) -> OrderPhase {
    self.phase
  }

  pub fn order(&self) -> Option<Order> {
    self.submission.as_ref().and_then(|ctx| ctx.read().order.clone())
  }

  pub fn job(&self) -> Option<&GenerationJob> {
    self.job.as_ref()
  }

  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// A receiver that sees every published snapshot.
  pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
    self.snapshot_tx.subscribe()
  }

  /// A handle the UI can keep to tear the session down from elsewhere.
  pub fn handle(&self) -> TaskHandle {
    TaskHandle::new("approval-session", self.cancel.clone())
  }

  /// Stops every pending wait and poll. Results arriving afterwards are dropped.
  pub fn cancel(&self) {
    self.cancel.cancel();
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancel.is_cancelled()
  }

  fn ensure_live(&self) -> RanmixResult<()> {
    if self.cancel.is_cancelled() {
      return Err(RanmixError::Cancelled);
    }
    Ok(())
  }

  fn order_id(&self) -> Option<String> {
    self.submission.as_ref().and_then(|ctx| ctx.read().order.as_ref().map(|o| o.id.clone()))
  }

  fn transition(&mut self, to: OrderPhase) {
    event!(Level::INFO, from = %self.phase, to = %to, "Order phase transition.");
    self.phase = to;
    self.publish();
  }

  fn fail_with(&mut self, err: &RanmixError) {
    self.last_error = Some(err.to_string());
    self.publish();
  }

  /// Poll progress is kept; it belongs to the current job until a new one starts.
  fn publish(&self) {
    let order_id = self.order_id();
    self.snapshot_tx.send_modify(|snap| {
      snap.phase = self.phase;
      snap.order_id = order_id;
      snap.order_status = self.order_status;
      snap.job = self.job.clone();
      snap.last_error = self.last_error.clone();
    });
  }

  /// `Created -> Submitted -> PendingApproval`.
  ///
  /// Invalid input leaves the session in `Created` with no order written. A delivery failure
  /// leaves it in `Submitted` and returns `Delivery`; use [`ApprovalGatedOrder::retry_notify`].
  #[instrument(name = "ApprovalGatedOrder::submit", skip_all, fields(customer = %form.customer_name))]
  pub async fn submit(&mut self, form: PaymentForm) -> RanmixResult<String> {
    self.ensure_live()?;
    if self.phase != OrderPhase::Created {
      return Err(RanmixError::InvalidTransition {
        action: "submit",
        phase: self.phase,
      });
    }

    // Observers see `Submitted` while the notice is still in flight.
    let tx = self.snapshot_tx.clone();
    let on_recorded: RecordedHook = Arc::new(move |order: &Order| {
      let order_id = order.id.clone();
      tx.send_modify(|snap| {
        snap.phase = OrderPhase::Submitted;
        snap.order_id = Some(order_id);
        snap.order_status = Some(OrderStatus::Pending);
      });
    });
    let ctx = ContextData::new(SubmissionCtxData {
      form,
      order: None,
      receipt: None,
      channel: self.deps.channel.clone(),
      clock: self.deps.clock.clone(),
      on_recorded: Some(on_recorded),
    });
    self.submission = Some(ctx.clone());
    self.run_submission(ctx).await
  }

  /// Re-sends the notice for the existing order without re-validating or re-creating it.
  ///
  /// Valid from `Submitted`, including after an approval timeout.
  #[instrument(name = "ApprovalGatedOrder::retry_notify", skip_all)]
  pub async fn retry_notify(&mut self) -> RanmixResult<String> {
    self.ensure_live()?;
    let ctx = match (&self.phase, &self.submission) {
      (OrderPhase::Submitted, Some(ctx)) => ctx.clone(),
      _ => {
        return Err(RanmixError::InvalidTransition {
          action: "retry notification",
          phase: self.phase,
        })
      }
    };
    self.run_submission(ctx).await
  }

  async fn run_submission(&mut self, ctx: SubmissionCtx) -> RanmixResult<String> {
    let outcome = tokio::select! {
      _ = self.cancel.cancelled() => return Err(RanmixError::Cancelled),
      outcome = self.deps.submission.run(ctx.clone()) => outcome,
    };

    let (order_id, failure) = {
      let guard = ctx.read();
      (
        guard.order.as_ref().map(|o| o.id.clone()),
        guard.receipt.as_ref().and_then(|r| r.failure.clone()),
      )
    };

    let Some(order_id) = order_id else {
      // Nothing was written: validation or record creation failed.
      self.submission = None;
      let err = match outcome {
        Err(e) => e,
        Ok(_) => RanmixError::NotFound("order record after submission".into()),
      };
      self.fail_with(&err);
      return Err(err);
    };

    self.order_status = Some(OrderStatus::Pending);
    if self.phase == OrderPhase::Created {
      // The record exists from here on, whatever the delivery outcome.
      self.transition(OrderPhase::Submitted);
    }
    match outcome {
      Ok(PipelineResult::Completed) => {
        self.delivered = true;
        self.last_error = None;
        self.transition(OrderPhase::PendingApproval);
        Ok(order_id)
      }
      Ok(PipelineResult::Stopped) => {
        let err = RanmixError::Delivery {
          order_id: order_id.clone(),
          reason: failure.unwrap_or_else(|| "channel did not accept the message".into()),
        };
        self.fail_with(&err);
        Err(err)
      }
      Err(e) => {
        self.fail_with(&e);
        Err(e)
      }
    }
  }

  /// `PendingApproval -> Approved | Rejected`, observed with the configured strategy.
  ///
  /// When the approval window elapses the session falls back to `Submitted`, the order record
  /// stays `pending`, and `Timeout` is returned. Waiting again from there is allowed.
  pub async fn await_approval(&mut self) -> RanmixResult<OrderStatus> {
    let strategy = self.deps.decision_strategy;
    self.await_approval_with(strategy).await
  }

  #[instrument(name = "ApprovalGatedOrder::await_approval", skip(self))]
  pub async fn await_approval_with(&mut self, strategy: DecisionStrategy) -> RanmixResult<OrderStatus> {
    self.ensure_live()?;
    let resumable = self.phase == OrderPhase::Submitted && self.delivered;
    if self.phase != OrderPhase::PendingApproval && !resumable {
      return Err(RanmixError::InvalidTransition {
        action: "await approval",
        phase: self.phase,
      });
    }
    let order_id = self
      .order_id()
      .ok_or_else(|| RanmixError::NotFound("order record for approval".into()))?;
    if resumable {
      self.transition(OrderPhase::PendingApproval);
    }

    let window = self.deps.config.approval_window;
    let outcome = self
      .deps
      .channel
      .await_decision(&order_id, strategy, window, &self.cancel)
      .await;
    if self.cancel.is_cancelled() {
      return Err(RanmixError::Cancelled);
    }

    match outcome {
      Ok(status) => {
        self.order_status = Some(status);
        self.last_error = None;
        let next = match status {
          OrderStatus::Approved => OrderPhase::Approved,
          OrderStatus::Rejected => OrderPhase::Rejected,
          OrderStatus::Pending => return Ok(status),
        };
        self.transition(next);
        Ok(status)
      }
      Err(e @ RanmixError::Timeout { .. }) => {
        self.last_error = Some(e.to_string());
        self.transition(OrderPhase::Submitted);
        Err(e)
      }
      Err(e) => {
        self.fail_with(&e);
        Err(e)
      }
    }
  }

  /// `Approved | GenerationFailed -> GenerationRequested -> GenerationInProgress -> ...`.
  ///
  /// A restart after `GenerationFailed` submits a brand-new job. A blank prompt is refused
  /// before anything changes. A poll timeout keeps `GenerationInProgress`; continue with
  /// [`ApprovalGatedOrder::resume_generation`].
  #[instrument(name = "ApprovalGatedOrder::request_generation", skip_all)]
  pub async fn request_generation(
    &mut self,
    request: GenerationRequest,
    on_progress: impl Fn(&PollProgress) + Send + Sync,
  ) -> RanmixResult<GenerationJob> {
    self.ensure_live()?;
    if !self.phase.can_request_generation() {
      return Err(RanmixError::InvalidTransition {
        action: "request generation",
        phase: self.phase,
      });
    }
    request.validate()?;

    let resume_phase = self.phase;
    self.job = None;
    self.snapshot_tx.send_modify(|snap| {
      snap.poll_attempt = None;
      snap.poll_elapsed = None;
    });
    self.transition(OrderPhase::GenerationRequested);

    let submitted = tokio::select! {
      _ = self.cancel.cancelled() => return Err(RanmixError::Cancelled),
      submitted = self.deps.generation.request(&request) => submitted,
    };
    match submitted {
      Ok(job) => {
        self.job = Some(job);
        self.transition(OrderPhase::GenerationInProgress);
      }
      Err(e) => {
        self.last_error = Some(e.to_string());
        let back_to = if e.is_retryable() { resume_phase } else { OrderPhase::GenerationFailed };
        self.transition(back_to);
        return Err(e);
      }
    }

    self.drive_job(&on_progress).await
  }

  /// Continues polling the current job after a poll timeout.
  pub async fn resume_generation(
    &mut self,
    on_progress: impl Fn(&PollProgress) + Send + Sync,
  ) -> RanmixResult<GenerationJob> {
    self.ensure_live()?;
    if self.phase != OrderPhase::GenerationInProgress || self.job.is_none() {
      return Err(RanmixError::InvalidTransition {
        action: "resume generation",
        phase: self.phase,
      });
    }
    self.drive_job(&on_progress).await
  }

  async fn drive_job(&mut self, on_progress: &(dyn Fn(&PollProgress) + Send + Sync)) -> RanmixResult<GenerationJob> {
    let job_id = match &self.job {
      Some(job) => job.id.clone(),
      None => return Err(RanmixError::NotFound("generation job".into())),
    };

    let tx = self.snapshot_tx.clone();
    let cancel = self.cancel.clone();
    let report = move |progress: &PollProgress| {
      if cancel.is_cancelled() {
        return;
      }
      tx.send_modify(|snap| {
        snap.poll_attempt = Some((progress.attempt, progress.max_attempts));
        snap.poll_elapsed = Some(progress.elapsed);
        if let Some(job) = &progress.snapshot {
          snap.job = Some(job.clone());
        }
      });
      on_progress(progress);
    };

    let outcome = self
      .deps
      .generation
      .run_to_completion(&job_id, &report, &self.cancel)
      .await;
    if self.cancel.is_cancelled() {
      return Err(RanmixError::Cancelled);
    }

    match outcome {
      Ok(job) => {
        self.job = Some(job.clone());
        self.last_error = None;
        self.transition(OrderPhase::GenerationCompleted);
        Ok(job)
      }
      Err(e @ RanmixError::Timeout { .. }) => {
        self.fail_with(&e);
        Err(e)
      }
      Err(RanmixError::Cancelled) => Err(RanmixError::Cancelled),
      Err(e) => {
        self.last_error = Some(e.to_string());
        self.transition(OrderPhase::GenerationFailed);
        Err(e)
      }
    }
  }

  /// The branded download for a completed track.
  pub fn download_target(&self) -> Option<DownloadTarget> {
    if self.phase != OrderPhase::GenerationCompleted {
      return None;
    }
    let job = self.job.as_ref()?;
    let url = job.result_url.as_deref()?;
    let title = job.title.as_deref().unwrap_or("track");
    let today = self.deps.clock.today();
    match branded_download_url(url, title, today) {
      Ok(branded) => Some(DownloadTarget {
        url: branded,
        filename: generate_download_filename(title, today),
      }),
      Err(e) => {
        event!(Level::WARN, error = %e, "Result URL could not be branded.");
        None
      }
    }
  }
}
