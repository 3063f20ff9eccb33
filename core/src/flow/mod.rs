// src/flow/mod.rs

//! The [`Flow`] type: definition, hook registration and execution.

pub mod definition;
mod execution;
mod hooks;

pub use definition::Flow;
