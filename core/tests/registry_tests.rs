// tests/registry_tests.rs
mod common;

use common::*;
use pledge_flow::{ContextData, Control, Flow, FlowError, FlowRegistry, Outcome, StepDef};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct AlphaContext {
  val: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct BetaContext {
  num: i32,
}

fn alpha_flow(value: &'static str) -> Flow<AlphaContext, TestError> {
  let mut flow = Flow::new("alpha", vec![StepDef::required("alpha_task")]);
  flow.on("alpha_task", move |ctx: ContextData<AlphaContext>| async move {
    ctx.write().val = value.to_string();
    Ok::<_, TestError>(Control::Continue)
  });
  flow
}

#[tokio::test]
async fn dispatches_by_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();

  registry.register(alpha_flow("alpha_processed"));

  let mut beta = Flow::<BetaContext, TestError>::new("beta", vec![StepDef::required("beta_task")]);
  beta.on("beta_task", |ctx: ContextData<BetaContext>| async move {
    ctx.write().num = 100;
    Ok::<_, FlowError>(Control::Continue)
  });
  registry.register(beta);

  assert_eq!(registry.len(), 2);
  assert!(registry.is_registered::<AlphaContext>());
  assert!(registry.is_registered::<BetaContext>());

  let alpha_ctx = ContextData::new(AlphaContext::default());
  assert_eq!(registry.run(alpha_ctx.clone()).await.unwrap(), Outcome::Completed);
  assert_eq!(alpha_ctx.read().val, "alpha_processed");

  let beta_ctx = ContextData::new(BetaContext::default());
  assert_eq!(registry.run(beta_ctx.clone()).await.unwrap(), Outcome::Completed);
  assert_eq!(beta_ctx.read().num, 100);
}

#[tokio::test]
async fn unregistered_context_type_is_an_error() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  assert!(registry.is_empty());

  let err = registry.run(ContextData::new(BetaContext::default())).await.unwrap_err();
  match err {
    TestError::Flow(msg) => assert!(msg.contains("No flow registered"), "unexpected message: {msg}"),
    other => panic!("expected a flow error, got {other:?}"),
  }
}

#[tokio::test]
async fn registering_twice_replaces_the_earlier_flow() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::default();
  registry.register(alpha_flow("first"));
  registry.register(alpha_flow("second"));

  assert_eq!(registry.len(), 1);
  let ctx = ContextData::new(AlphaContext::default());
  registry.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().val, "second");
}

#[tokio::test]
async fn hook_errors_surface_through_the_registry() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  let mut flow = Flow::<TestContext, TestError>::new("failing", vec![StepDef::required("boom")]);
  flow.on("boom", failing_hook("boom", "kaput"));
  registry.register(flow);

  let err = registry.run(ContextData::new(TestContext::default())).await.unwrap_err();
  assert_eq!(err, TestError::Hook("kaput".to_string()));
}
