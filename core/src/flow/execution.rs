// src/flow/execution.rs

use crate::core::context_data::ContextData;
use crate::core::control::{Control, Outcome};
use crate::core::handler::Handler;
use crate::error::FlowError;
use crate::flow::definition::{Flow, StepHooks};
use tracing::{event, info_span, Instrument, Level};

enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  fn label(&self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

impl<TData, Err> Flow<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  ///
  /// A required step with no hooks fails with [`FlowError::HandlerMissing`].
  /// An error from a required step aborts the run. An error from an optional
  /// step is logged at WARN and the run continues with the next step.
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<Outcome, Err> {
    event!(Level::DEBUG, flow = %self.name, steps = self.steps.len(), "Flow run starting.");

    for (step_index, step) in self.steps.iter().enumerate() {
      let span = info_span!(
        "flow_step",
        flow = %self.name,
        step = %step.name,
        step_index,
        optional = step.optional
      );

      if let Some(skip_if) = &step.skip_if {
        let skip = skip_if(&*ctx_data.read());
        if skip {
          event!(parent: &span, Level::DEBUG, "Step skipped by its condition.");
          continue;
        }
      }

      let hooks = match self.hooks.get(&step.name) {
        Some(hooks) if !hooks.is_empty() => hooks,
        _ if step.optional => {
          event!(parent: &span, Level::DEBUG, "Optional step has no hooks, skipping.");
          continue;
        }
        _ => {
          event!(parent: &span, Level::ERROR, "Required step has no hooks.");
          return Err(Err::from(FlowError::HandlerMissing {
            flow_name: self.name.clone(),
            step_name: step.name.clone(),
          }));
        }
      };

      match self.run_step(hooks, &ctx_data).instrument(span.clone()).await {
        Ok(Control::Continue) => {}
        Ok(Control::Halt) => {
          event!(parent: &span, Level::INFO, "Flow halted by a hook.");
          return Ok(Outcome::Halted {
            step: step.name.clone(),
          });
        }
        Err(e) if step.optional => {
          event!(parent: &span, Level::WARN, error = %e, "Optional step failed, continuing.");
        }
        Err(e) => {
          event!(parent: &span, Level::ERROR, error = %e, "Step failed.");
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, flow = %self.name, "Flow run completed.");
    Ok(Outcome::Completed)
  }

  async fn run_step(&self, hooks: &StepHooks<TData, Err>, ctx_data: &ContextData<TData>) -> Result<Control, Err> {
    for (phase, handlers) in [
      (Phase::Before, &hooks.before),
      (Phase::On, &hooks.on),
      (Phase::After, &hooks.after),
    ] {
      if let Control::Halt = run_phase(&phase, handlers, ctx_data).await? {
        return Ok(Control::Halt);
      }
    }
    Ok(Control::Continue)
  }
}

async fn run_phase<TData, Err>(
  phase: &Phase,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<Control, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (hook_index, handler) in handlers.iter().enumerate() {
    event!(Level::TRACE, phase = phase.label(), hook_index, "Running hook.");
    if let Control::Halt = handler(ctx_data.clone()).await? {
      return Ok(Control::Halt);
    }
  }
  Ok(Control::Continue)
}
