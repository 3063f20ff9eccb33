// src/core/handler.rs

use crate::core::context_data::ContextData;
use crate::core::control::Control;
use std::future::Future;
use std::pin::Pin;

/// A boxed, type-erased hook.
///
/// Hooks receive their own clone of the flow's [`ContextData`] and resolve to
/// either a [`Control`] signal or the flow's error type. Lock guards taken on
/// the context must be released before the hook awaits anything.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<Control, Err>> + Send>> + Send + Sync,
>;

/// Boxes a user hook whose error converts into the flow's error type.
pub(crate) fn boxed<TData, Err, F, UserErr>(
  hook: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
) -> Handler<TData, Err>
where
  TData: Send + Sync + 'static,
  Err: 'static,
  F: Future<Output = Result<Control, UserErr>> + Send + 'static,
  UserErr: Into<Err> + 'static,
{
  Box::new(move |ctx| {
    let fut = hook(ctx);
    Box::pin(async move { fut.await.map_err(Into::into) })
  })
}
