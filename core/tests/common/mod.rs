// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use pledge_flow::{ContextData, Control, FlowError, Handler};
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub halt_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow engine error: {0}")]
  Flow(String),

  #[error("test hook failed: {0}")]
  Hook(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(err.to_string())
  }
}

/// Appends to the context and halts if `halt_at` names this step.
pub fn recording_hook(step_name: &'static str, message: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_hooks", step = step_name, counter = guard.counter, "hook ran");
      if guard.halt_at.as_deref() == Some(step_name) {
        return Ok(Control::Halt);
      }
      Ok(Control::Continue)
    })
  })
}

pub fn failing_hook(step_name: &'static str, error_message: &'static str) -> Handler<TestContext, TestError> {
  Box::new(move |ctx: ContextData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      tracing::warn!(target: "test_hooks", step = step_name, "failing with '{}'", error_message);
      Err(TestError::Hook(error_message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
