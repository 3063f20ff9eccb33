// src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Errors raised by the engine itself, as opposed to errors returned by hooks.
///
/// Every flow error type must be constructible from `FlowError` so that
/// engine-level failures (a required step without hooks, a context that was
/// never registered) surface through the same channel as business errors.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("No hooks registered for required step '{step_name}' in flow '{flow_name}'")]
  HandlerMissing { flow_name: String, step_name: String },

  #[error("No flow registered for context type {context_type}")]
  FlowNotRegistered { context_type: String },

  #[error("Context type mismatch in flow '{flow_name}' (expected {expected_type})")]
  TypeMismatch { flow_name: String, expected_type: String },

  #[error("Hook failed: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal flow error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for FlowError {
  fn from(err: AnyhowError) -> Self {
    FlowError::HandlerError { source: err }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
