// src/pipelines/mod.rs

//! Every multi-step server operation runs as a `pledge_flow::Flow`.

use crate::errors::AppError;
use pledge_flow::FlowRegistry;

pub mod contexts;
pub mod login_pipeline;
pub mod pledge_pipeline;

/// Registers all flows. Called once at startup, before the server binds.
pub fn register_all_flows(registry: &FlowRegistry<AppError>) {
  tracing::info!("Registering flows...");
  pledge_pipeline::register_pledge_flow(registry);
  login_pipeline::register_login_flow(registry);
  tracing::info!(count = registry.len(), "All application flows registered.");
}
