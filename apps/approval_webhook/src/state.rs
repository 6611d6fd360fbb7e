// apps/approval_webhook/src/state.rs
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines::contexts::DecisionCtxData;
use ranmix::order::OrderRepository;
use ranmix::Pipeline;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub orders: Arc<dyn OrderRepository>,
  pub decision_pipeline: Arc<Pipeline<DecisionCtxData, AppError>>,
  pub config: Arc<AppConfig>,
}
