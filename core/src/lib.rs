// src/lib.rs

//! pledge-flow: a small asynchronous step-flow engine.
//!
//! A [`Flow`] is an ordered list of named steps. Each step carries `before`,
//! `on` and `after` hooks which run against a shared [`ContextData`]. Hooks
//! either let the flow continue or halt it early; a failing hook aborts the
//! flow unless its step is marked optional, in which case the failure is
//! logged and the flow moves on.
//!
//! Flows are registered in a [`FlowRegistry`] keyed by their context type, so
//! a caller only needs to build the context and ask the registry to run it.

pub mod core;
pub mod error;
pub mod flow;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{Control, Outcome};
pub use crate::core::handler::Handler;
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::error::{FlowError, FlowResult};
pub use crate::flow::Flow;
pub use crate::registry::FlowRegistry;
