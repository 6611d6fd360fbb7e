// apps/approval_webhook/src/web/routes.rs

use crate::state::AppState;
use crate::web::handlers::order_handlers;
use actix_web::web;

/// Reports database reachability and whether callbacks are answered in the chat.
async fn health_check_handler(app_state: web::Data<AppState>) -> actix_web::HttpResponse {
  let database = match sqlx::query("SELECT 1").execute(&app_state.db_pool).await {
    Ok(_) => "ok",
    Err(e) => {
      tracing::warn!(error = %e, "Health check could not reach the database.");
      "unreachable"
    }
  };
  let body = serde_json::json!({
    "status": if database == "ok" { "ok" } else { "degraded" },
    "database": database,
    "answers_callbacks": app_state.config.telegram.is_some(),
  });
  if database == "ok" {
    actix_web::HttpResponse::Ok().json(body)
  } else {
    actix_web::HttpResponse::ServiceUnavailable().json(body)
  }
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      // Bot callbacks (button presses on payment notices).
      .service(web::scope("/webhooks").route(
        "/telegram",
        web::post().to(crate::web::handlers::webhook_handlers::telegram_webhook_handler),
      ))
      // Order records shared with site sessions, which create orders here and poll for decisions.
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_id}/decision", web::post().to(order_handlers::record_decision_handler))
          .route(
            "/{order_id}/notifications",
            web::post().to(order_handlers::append_notification_handler),
          ),
      ),
  );
}
