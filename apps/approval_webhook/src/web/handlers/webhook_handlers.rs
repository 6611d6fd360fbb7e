// apps/approval_webhook/src/web/handlers/webhook_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{error, info, instrument, warn};

use crate::models::TelegramUpdate;
use crate::pipelines::contexts::DecisionCtxData;
use crate::state::AppState;
use ranmix::{ContextData, PipelineResult};

/// The bot retries any non-2xx answer, so every outcome is acknowledged with 200.
fn acknowledge() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

#[instrument(name = "handler::telegram_webhook", skip(app_state, body), fields(payload_bytes = body.len()))]
pub async fn telegram_webhook_handler(app_state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
  let update = match serde_json::from_slice::<TelegramUpdate>(&body) {
    Ok(update) => update,
    Err(e) => {
      warn!(error = %e, "Ignoring unparseable bot update.");
      return acknowledge();
    }
  };

  let ctx = ContextData::new(DecisionCtxData::from_update(update));
  match app_state.decision_pipeline.run(ctx.clone()).await {
    Ok(PipelineResult::Completed) => {
      let guard = ctx.read();
      info!(
        update_id = guard.update_id,
        outcome = ?guard.outcome,
        "Callback pipeline completed."
      );
    }
    Ok(PipelineResult::Stopped) => {
      info!(update_id = ctx.read().update_id, "Callback pipeline stopped; nothing to apply.");
    }
    Err(app_err) => {
      error!(error = %app_err, "Callback pipeline failed; acknowledging anyway.");
    }
  }
  acknowledge()
}
