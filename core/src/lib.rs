// ranmix/src/lib.rs

//! Ranmix: the ordering core of the RAN Mixology site.
//!
//! - A persisted, observable shopping cart.
//! - An event catalog with seat accounting and a periodic occupancy feed.
//! - An approval-gated workflow: payment evidence goes to a human approver over a chat
//!   channel, and an approved order unlocks an AI music generation job that is polled to
//!   completion.
//!
//! Everything hangs off an [`AppContext`]; tests and embedders can also build the pieces
//! directly.

pub mod app;
pub mod cart;
pub mod channel;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod generation;
pub mod order;
pub mod pipeline;
pub mod store;
pub mod task;
pub mod workflow;

pub use crate::app::{AppContext, AppParts};
pub use crate::cart::{format_price, parse_price, CartStore};
pub use crate::channel::{DecisionStrategy, DecisionToken, NotificationChannelClient, UnmatchedDecisionPolicy};
pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::config::{RanmixConfig, WorkflowConfig};
pub use crate::error::{RanmixError, RanmixResult};
pub use crate::events::EventCatalogStore;
pub use crate::generation::{GenerationClient, GenerationRequest, PollPolicy};
pub use crate::order::{Order, OrderStatus};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::task::TaskHandle;
pub use crate::workflow::{ApprovalGatedOrder, OrderPhase, PaymentForm};
