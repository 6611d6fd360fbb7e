// ranmix/src/task.rs

//! Cancellable handles for background work (occupancy ticker, session waits).

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{event, Level};

/// Owns a cancellation token and, optionally, the task driven by it.
///
/// Dropping the handle does not cancel; teardown must be explicit via [`TaskHandle::cancel`].
#[derive(Debug)]
pub struct TaskHandle {
  name: &'static str,
  token: CancellationToken,
  join: Option<JoinHandle<()>>,
}

impl TaskHandle {
  pub fn new(name: &'static str, token: CancellationToken) -> Self {
    Self { name, token, join: None }
  }

  /// Spawns `fut` on the current runtime, handing it a child of a fresh token.
  pub fn spawn<F, Fut>(name: &'static str, f: F) -> Self
  where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: std::future::Future<Output = ()> + Send + 'static,
  {
    let token = CancellationToken::new();
    let join = tokio::spawn(f(token.child_token()));
    Self {
      name,
      token,
      join: Some(join),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Idempotent.
  pub fn cancel(&self) {
    if !self.token.is_cancelled() {
      event!(Level::DEBUG, task = self.name, "Cancelling task.");
      self.token.cancel();
    }
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  pub fn token(&self) -> CancellationToken {
    self.token.clone()
  }

  /// Cancels and waits for the spawned task, if any, to wind down.
  pub async fn shutdown(mut self) {
    self.cancel();
    if let Some(join) = self.join.take() {
      if let Err(e) = join.await {
        event!(Level::WARN, task = self.name, error = %e, "Task ended abnormally.");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicBool, Ordering};
  use std::sync::Arc;

  #[tokio::test]
  async fn shutdown_stops_spawned_loop() {
    let exited = Arc::new(AtomicBool::new(false));
    let exited_clone = exited.clone();
    let handle = TaskHandle::spawn("test-loop", move |token| async move {
      token.cancelled().await;
      exited_clone.store(true, Ordering::SeqCst);
    });
    handle.cancel();
    assert!(handle.is_cancelled());
    handle.shutdown().await;
    assert!(exited.load(Ordering::SeqCst));
  }
}
