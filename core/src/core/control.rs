// src/core/control.rs

/// What a hook tells the engine after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
  /// Run the remaining hooks of this step, then the next step.
  Continue,
  /// Stop the whole flow here. Nothing after this hook runs.
  Halt,
}

/// How a flow run ended when no error was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// Every step ran (or was skipped) to the end.
  Completed,
  /// A hook returned [`Control::Halt`] while running `step`.
  Halted { step: String },
}

impl Outcome {
  pub fn is_completed(&self) -> bool {
    matches!(self, Outcome::Completed)
  }
}
