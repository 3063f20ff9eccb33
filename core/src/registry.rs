// src/registry.rs

//! A registry of flows keyed by their context type.
//!
//! Callers build a `ContextData<T>` and hand it to [`FlowRegistry::run`];
//! the registry finds the flow registered for `T` and runs it, returning the
//! application error type `E`.

use crate::core::context_data::ContextData;
use crate::core::control::Outcome;
use crate::error::FlowError;
use crate::flow::Flow;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[async_trait]
trait ErasedFlow<E>: Send + Sync
where
  E: std::error::Error + Send + Sync + 'static,
{
  fn name(&self) -> &str;

  /// `ctx` must hold a `ContextData<T>` for the flow's own `T`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, E>;
}

struct FlowRunner<TData, FlowErr, E>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flow: Flow<TData, FlowErr>,
  _app_err: PhantomData<fn() -> E>,
}

#[async_trait]
impl<TData, FlowErr, E> ErasedFlow<E> for FlowRunner<TData, FlowErr, E>
where
  TData: 'static + Send + Sync,
  FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  E: std::error::Error + From<FlowErr> + From<FlowError> + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    self.flow.name()
  }

  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<Outcome, E> {
    let ctx_data = match ctx.downcast::<ContextData<TData>>() {
      Ok(ctx_data) => *ctx_data,
      Err(_) => {
        let expected_type = std::any::type_name::<ContextData<TData>>();
        event!(Level::ERROR, flow = %self.flow.name(), expected_type, "Context type mismatch.");
        return Err(E::from(FlowError::TypeMismatch {
          flow_name: self.flow.name().to_string(),
          expected_type: expected_type.to_string(),
        }));
      }
    };
    self.flow.run(ctx_data).await.map_err(E::from)
  }
}

pub struct FlowRegistry<E = FlowError>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  flows: RwLock<HashMap<TypeId, Arc<dyn ErasedFlow<E>>>>,
}

impl<E> FlowRegistry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      flows: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `flow` for its context type, replacing any earlier flow for
  /// the same type.
  pub fn register<TData, FlowErr>(&self, flow: Flow<TData, FlowErr>)
  where
    TData: 'static + Send + Sync,
    FlowErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    E: From<FlowErr>,
  {
    let context_type = std::any::type_name::<TData>();
    let flow_name = flow.name().to_string();
    let runner: Arc<dyn ErasedFlow<E>> = Arc::new(FlowRunner::<TData, FlowErr, E> {
      flow,
      _app_err: PhantomData,
    });

    let replaced = self.flows.write().insert(TypeId::of::<TData>(), runner);
    match replaced {
      Some(old) => event!(
        Level::WARN,
        context_type,
        flow = %flow_name,
        replaced = %old.name(),
        "Flow replaced an existing registration."
      ),
      None => event!(Level::DEBUG, context_type, flow = %flow_name, "Flow registered."),
    }
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.flows.read().contains_key(&TypeId::of::<TData>())
  }

  pub fn len(&self) -> usize {
    self.flows.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.flows.read().is_empty()
  }

  /// Runs the flow registered for `TData`.
  #[instrument(name = "FlowRegistry::run", skip_all, fields(context_type = %std::any::type_name::<TData>()))]
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<Outcome, E>
  where
    TData: 'static + Send + Sync,
  {
    let runner = self.flows.read().get(&TypeId::of::<TData>()).cloned();
    let Some(runner) = runner else {
      let context_type = std::any::type_name::<TData>();
      event!(Level::ERROR, context_type, "No flow registered for context type.");
      return Err(E::from(FlowError::FlowNotRegistered {
        context_type: context_type.to_string(),
      }));
    };
    runner.run_erased(Box::new(ctx_data)).await
  }
}

impl<E> Default for FlowRegistry<E>
where
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}
