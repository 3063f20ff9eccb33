// src/flow/hooks.rs

//! Registration of `before`, `on` and `after` hooks.
//!
//! A hook may fail with any error that converts into the flow's error type,
//! which lets a hook return `FlowError` directly while its flow uses an
//! application error.

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use crate::core::handler::boxed;
use crate::error::FlowError;
use crate::flow::definition::Flow;
use std::future::Future;

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn before<F, UserErr>(
    &mut self,
    step_name: &str,
    hook: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> &mut Self
  where
    F: Future<Output = Result<Control, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.hooks_mut(step_name).before.push(boxed(hook));
    self
  }

  pub fn on<F, UserErr>(
    &mut self,
    step_name: &str,
    hook: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> &mut Self
  where
    F: Future<Output = Result<Control, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.hooks_mut(step_name).on.push(boxed(hook));
    self
  }

  pub fn after<F, UserErr>(
    &mut self,
    step_name: &str,
    hook: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) -> &mut Self
  where
    F: Future<Output = Result<Control, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.hooks_mut(step_name).after.push(boxed(hook));
    self
  }
}
