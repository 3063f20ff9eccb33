// src/core/step.rs

use std::sync::Arc;

/// Predicate evaluated against the context before a step runs; `true` skips it.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

/// A named step of a flow.
///
/// Optional steps are allowed to have no hooks, and a hook failure inside an
/// optional step is logged and swallowed instead of aborting the flow.
pub struct StepDef<TData: 'static> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static> StepDef<TData> {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: false,
      skip_if: None,
    }
  }

  pub fn optional(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      optional: true,
      skip_if: None,
    }
  }

  pub fn skip_if(mut self, condition: impl Fn(&TData) -> bool + Send + Sync + 'static) -> Self {
    self.skip_if = Some(Arc::new(condition));
    self
  }
}

impl<TData: 'static> Clone for StepDef<TData> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      optional: self.optional,
      skip_if: self.skip_if.clone(),
    }
  }
}

impl<TData: 'static> std::fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}
