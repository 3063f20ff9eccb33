// src/flow/definition.rs

use crate::core::handler::Handler;
use crate::core::step::StepDef;
use crate::error::FlowError;
use std::collections::HashMap;

/// Hooks attached to one step, in execution order.
pub(crate) struct StepHooks<TData: Send + Sync + 'static, Err: 'static> {
  pub(crate) before: Vec<Handler<TData, Err>>,
  pub(crate) on: Vec<Handler<TData, Err>>,
  pub(crate) after: Vec<Handler<TData, Err>>,
}

impl<TData: Send + Sync + 'static, Err: 'static> StepHooks<TData, Err> {
  fn new() -> Self {
    Self {
      before: Vec::new(),
      on: Vec::new(),
      after: Vec::new(),
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.before.is_empty() && self.on.is_empty() && self.after.is_empty()
  }
}

/// An ordered list of named steps over a context type `TData`, whose hooks
/// fail with `Err`.
///
/// `Err` must be constructible from [`FlowError`] so that engine failures
/// (for example a required step that nobody attached a hook to) come back
/// through the same error type as the hooks' own failures.
pub struct Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) hooks: HashMap<String, StepHooks<TData, Err>>,
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new(name: impl Into<String>, steps: Vec<StepDef<TData>>) -> Self {
    let flow = Self {
      name: name.into(),
      steps: Vec::new(),
      hooks: HashMap::new(),
    };
    steps.into_iter().fold(flow, |mut flow, step| {
      flow.ensure_step_absent(&step.name);
      flow.steps.push(step);
      flow
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn has_step(&self, step_name: &str) -> bool {
    self.steps.iter().any(|s| s.name == step_name)
  }

  /// Marks an existing step optional (or required again).
  pub fn set_optional(&mut self, step_name: &str, optional: bool) -> Result<(), FlowError> {
    let step = self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })?;
    step.optional = optional;
    Ok(())
  }

  /// Panics on an unknown step name: attaching a hook to a typo is a wiring
  /// bug, caught the first time the flow is built.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.has_step(step_name) {
      panic!("flow '{}': step '{}' is not defined", self.name, step_name);
    }
  }

  fn ensure_step_absent(&self, step_name: &str) {
    if self.has_step(step_name) {
      panic!("flow '{}': step '{}' is defined twice", self.name, step_name);
    }
  }

  pub(crate) fn hooks_mut(&mut self, step_name: &str) -> &mut StepHooks<TData, Err> {
    self.ensure_step_exists(step_name);
    self.hooks.entry(step_name.to_string()).or_insert_with(StepHooks::new)
  }
}
