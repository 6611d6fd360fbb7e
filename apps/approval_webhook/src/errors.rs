// apps/approval_webhook/src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use ranmix::RanmixError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: RanmixError,
  },
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
      AppError::Workflow { source } => match source {
        RanmixError::Validation(m) | RanmixError::MalformedToken { token: _, reason: m } => {
          HttpResponse::BadRequest().json(json!({"error": m}))
        }
        RanmixError::NotFound(m) => HttpResponse::NotFound().json(json!({"error": m})),
        other => HttpResponse::InternalServerError()
          .json(json!({"error": "Workflow processing error", "detail": other.to_string()})),
      },
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
