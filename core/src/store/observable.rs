// ranmix/src/store/observable.rs

//! In-memory state plus a subscriber registry.

use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{event, Level};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Inner<T> {
  state: RwLock<T>,
  subscribers: Mutex<Vec<(u64, Callback<T>)>>,
  next_id: AtomicU64,
}

/// Shared, observable state. Clones refer to the same state.
pub struct Observable<T> {
  inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
  fn clone(&self) -> Self {
    Self {
      inner: self.inner.clone(),
    }
  }
}

impl<T> Observable<T>
where
  T: Clone + Send + Sync + 'static,
{
  pub fn new(initial: T) -> Self {
    Self {
      inner: Arc::new(Inner {
        state: RwLock::new(initial),
        subscribers: Mutex::new(Vec::new()),
        next_id: AtomicU64::new(1),
      }),
    }
  }

  /// A copy of the current state; later mutations do not affect it.
  pub fn get(&self) -> T {
    self.inner.state.read().clone()
  }

  /// Reads through a borrowed view without cloning the whole state.
  pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    f(&self.inner.state.read())
  }

  /// Registers `callback` and invokes it once, right away, with the current state.
  pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
    let callback: Callback<T> = Arc::new(callback);
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    self.inner.subscribers.lock().push((id, callback.clone()));

    let snapshot = self.get();
    callback(&snapshot);

    let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
    Subscription::new(move || {
      if let Some(inner) = weak.upgrade() {
        inner.subscribers.lock().retain(|(sub_id, _)| *sub_id != id);
      }
    })
  }

  pub fn subscriber_count(&self) -> usize {
    self.inner.subscribers.lock().len()
  }

  /// Applies `f` under the write lock, then notifies every subscriber with the resulting state.
  ///
  /// `f` must stay synchronous; the snapshot handed to subscribers is taken before the lock is
  /// released so no observer sees a half-applied change.
  pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    let (result, snapshot) = {
      let mut guard = self.inner.state.write();
      let result = f(&mut guard);
      (result, guard.clone())
    };
    self.notify(&snapshot);
    result
  }

  /// Like [`Observable::update`] but only notifies when `f` reports a change.
  pub fn update_if<R>(&self, f: impl FnOnce(&mut T) -> (R, bool)) -> R {
    let (result, snapshot) = {
      let mut guard = self.inner.state.write();
      let (result, changed) = f(&mut guard);
      (result, changed.then(|| guard.clone()))
    };
    if let Some(snapshot) = snapshot {
      self.notify(&snapshot);
    }
    result
  }

  fn notify(&self, snapshot: &T) {
    let callbacks: Vec<Callback<T>> = self.inner.subscribers.lock().iter().map(|(_, cb)| cb.clone()).collect();
    event!(Level::TRACE, subscribers = callbacks.len(), "Notifying subscribers.");
    for callback in callbacks {
      callback(snapshot);
    }
  }

  /// Drops every subscriber, e.g. on teardown.
  pub fn clear_subscribers(&self) {
    self.inner.subscribers.lock().clear();
  }
}

/// Returned by `subscribe`; call [`Subscription::unsubscribe`] to stop receiving updates.
///
/// Dropping the handle without unsubscribing leaves the callback registered.
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
  cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
  pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
    Self {
      cancel: Some(Box::new(cancel)),
    }
  }

  pub fn unsubscribe(mut self) {
    if let Some(cancel) = self.cancel.take() {
      cancel();
    }
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
  }
}
