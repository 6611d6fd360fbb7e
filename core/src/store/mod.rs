// ranmix/src/store/mod.rs

//! Observable state containers with best-effort durable persistence.

pub mod observable;
pub mod persistent;
pub mod storage;

pub use observable::{Observable, Subscription};
pub use persistent::{PersistentStore, StoreState};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
