// apps/approval_webhook/src/main.rs

mod config;
mod errors;
mod models;
mod pipelines;
mod repository;
mod state;
mod web;

use crate::config::AppConfig;
use crate::pipelines::{build_decision_pipeline, DecisionDeps};
use crate::repository::PgOrderRepository;
use crate::state::AppState;

use actix_web::{web as actix_data, App, HttpServer};
use ranmix::channel::TelegramChannel;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
  tracing::error!(error = %err, "{}", context);
  std::io::Error::other(format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE)
    .init();

  tracing::info!("Starting payment approval webhook server...");

  let app_config = AppConfig::from_env()
    .map(Arc::new)
    .map_err(|e| startup_error("Failed to load application configuration", e))?;

  let db_pool = PgPool::connect(&app_config.database_url)
    .await
    .map_err(|e| startup_error("Failed to connect to the database", e))?;
  tracing::info!("Successfully connected to the database.");

  sqlx::migrate!("./migrations")
    .run(&db_pool)
    .await
    .map_err(|e| startup_error("Failed to run database migrations", e))?;

  let telegram = match &app_config.telegram {
    Some(cfg) => Some(Arc::new(
      TelegramChannel::new(cfg).map_err(|e| startup_error("Failed to build the Telegram client", e))?,
    )),
    None => {
      tracing::warn!("TELEGRAM_BOT_TOKEN not set; decisions are recorded but callbacks go unanswered.");
      None
    }
  };
  if let (Some(telegram), Some(url)) = (&telegram, &app_config.telegram_webhook_url) {
    match telegram.set_webhook(url).await {
      Ok(()) => tracing::info!(%url, "Bot webhook registered."),
      Err(e) => tracing::warn!(error = %e, "Could not register the bot webhook; continuing."),
    }
  }

  let orders = Arc::new(PgOrderRepository::new(db_pool.clone()));
  let change_listener = orders.spawn_change_listener();

  let decision_pipeline = Arc::new(build_decision_pipeline(DecisionDeps {
    orders: orders.clone(),
    telegram,
    policy: app_config.unmatched_policy,
  }));
  tracing::info!("Decision pipeline built.");

  let app_state = AppState {
    db_pool,
    orders: orders.clone(),
    decision_pipeline,
    config: app_config.clone(),
  };

  let server_address = format!("{}:{}", app_config.server_host, app_config.server_port);
  tracing::info!("Attempting to bind server to {}...", server_address);

  let served = HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await;

  change_listener.shutdown().await;
  tracing::info!("Server stopped.");
  served
}
