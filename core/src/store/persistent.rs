// ranmix/src/store/persistent.rs

//! `PersistentStore<T>`: an [`Observable`] mirrored to a [`StorageBackend`].

use super::observable::{Observable, Subscription};
use super::storage::StorageBackend;
use crate::error::RanmixError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// State that can live in a [`PersistentStore`].
///
/// Derived fields should be `#[serde(skip)]` and rebuilt in `recompute_derived`.
pub trait StoreState: Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static {
  fn recompute_derived(&mut self) {}
}

pub struct PersistentStore<T: StoreState> {
  key: String,
  storage: Arc<dyn StorageBackend>,
  state: Observable<T>,
}

impl<T: StoreState> PersistentStore<T> {
  /// Loads `key` from `storage`, falling back to `T::default()` when it is absent or unreadable.
  #[instrument(name = "PersistentStore::load", skip(storage), fields(state_type = %std::any::type_name::<T>()))]
  pub fn load(key: &str, storage: Arc<dyn StorageBackend>) -> Self {
    let mut initial = match storage.read(key) {
      Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
          event!(Level::WARN, error = %e, "Stored state is corrupt, starting from default.");
          T::default()
        }
      },
      Ok(None) => T::default(),
      Err(e) => {
        event!(Level::WARN, error = %e, "Could not read stored state, starting from default.");
        T::default()
      }
    };
    initial.recompute_derived();

    Self {
      key: key.to_string(),
      storage,
      state: Observable::new(initial),
    }
  }

  pub fn key(&self) -> &str {
    &self.key
  }

  pub fn get_state(&self) -> T {
    self.state.get()
  }

  pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
    self.state.read(f)
  }

  pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
    self.state.subscribe(callback)
  }

  /// Applies `f`, recomputes derived fields, persists, then notifies subscribers.
  ///
  /// A failed write is logged and leaves the in-memory change in place.
  pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
    let storage = &self.storage;
    let key = self.key.as_str();
    self.state.update(|state| {
      let result = f(state);
      state.recompute_derived();
      if let Err(e) = persist(storage.as_ref(), key, state) {
        event!(Level::WARN, key, error = %e, "Persistence warning; keeping in-memory state.");
      }
      result
    })
  }
}

impl<T: StoreState> PersistentStore<T> {
  /// Like [`PersistentStore::mutate`], but `f` edits a draft. An `Err` leaves the state, the
  /// stored copy and the subscribers untouched.
  pub fn try_mutate<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E> {
    let storage = &self.storage;
    let key = self.key.as_str();
    self.state.update_if(|state| {
      let mut draft = state.clone();
      match f(&mut draft) {
        Ok(result) => {
          draft.recompute_derived();
          if let Err(e) = persist(storage.as_ref(), key, &draft) {
            event!(Level::WARN, key, error = %e, "Persistence warning; keeping in-memory state.");
          }
          *state = draft;
          (Ok(result), true)
        }
        Err(e) => (Err(e), false),
      }
    })
  }
}

fn persist<T: Serialize>(storage: &dyn StorageBackend, key: &str, state: &T) -> Result<(), RanmixError> {
  let raw = serde_json::to_string(state).map_err(|e| RanmixError::Persistence {
    key: key.to_string(),
    reason: e.to_string(),
  })?;
  storage.write(key, &raw)
}
