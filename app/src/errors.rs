// src/errors.rs

use crate::money::format_rand;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use pledge_flow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Item not found.")]
  NotFound,

  #[error("This item has already been fully pledged.")]
  AlreadyFulfilled,

  #[error("Amount must be a positive value.")]
  InvalidAmount,

  #[error("Amount exceeds remaining balance. Remaining: {}", format_rand(*remaining_cents))]
  ExceedsRemaining { remaining_cents: i64 },

  #[error("You must consent to the processing of your personal information.")]
  ConsentRequired,

  #[error("Administrator access is required.")]
  Unauthorized,

  #[error("Please sign in to continue.")]
  AuthRequired,

  #[error("{0}")]
  Validation(String),

  #[error("{0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Pledge reference {0} is already taken.")]
  DuplicateReference(String),

  #[error("Flow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(format!("{:#}", other)),
    }
  }
}

impl AppError {
  /// Stable machine-readable code sent as the `error` field.
  pub fn code(&self) -> &'static str {
    match self {
      AppError::NotFound => "NOT_FOUND",
      AppError::AlreadyFulfilled => "ALREADY_FULFILLED",
      AppError::InvalidAmount => "INVALID_AMOUNT",
      AppError::ExceedsRemaining { .. } => "EXCEEDS_REMAINING",
      AppError::ConsentRequired => "CONSENT_REQUIRED",
      AppError::Unauthorized => "UNAUTHORIZED",
      AppError::AuthRequired => "AUTH_REQUIRED",
      AppError::Validation(_) => "VALIDATION",
      AppError::Auth(_) => "AUTH",
      AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::DuplicateReference(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => "INTERNAL",
    }
  }

  fn is_internal(&self) -> bool {
    self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::NotFound => StatusCode::NOT_FOUND,
      AppError::AlreadyFulfilled | AppError::ExceedsRemaining { .. } => StatusCode::CONFLICT,
      AppError::InvalidAmount | AppError::ConsentRequired | AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized => StatusCode::FORBIDDEN,
      AppError::AuthRequired | AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    // Internal details stay in the log; clients get a generic message.
    let message = if self.is_internal() {
      tracing::error!(application_error = %self, "Responding with internal error");
      "An internal error occurred.".to_string()
    } else {
      tracing::debug!(application_error = %self, "Responding with error");
      self.to_string()
    };
    HttpResponse::build(self.status_code()).json(json!({ "error": self.code(), "message": message }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
