// apps/approval_webhook/src/repository/mod.rs

pub mod pg_orders;

pub use pg_orders::{PgOrderRepository, ORDER_CHANGES_CHANNEL};
