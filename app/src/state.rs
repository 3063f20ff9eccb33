// src/state.rs

use crate::config::AppConfig;
use crate::db::Repository;
use crate::errors::AppError;
use crate::services::catalog::CatalogService;
use crate::services::notifier::NotificationDispatcher;
use pledge_flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub repo: Arc<dyn Repository>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
  pub catalog: CatalogService,
  pub notifier: Arc<NotificationDispatcher>,
}

impl AppState {
  /// Wires the services around `repo` and registers every flow.
  pub fn new(config: Arc<AppConfig>, repo: Arc<dyn Repository>, notifier: NotificationDispatcher) -> Self {
    let flows = Arc::new(FlowRegistry::<AppError>::new());
    crate::pipelines::register_all_flows(&flows);
    Self {
      catalog: CatalogService::new(Arc::clone(&repo), config.catalog_cache_ttl),
      repo,
      flows,
      config,
      notifier: Arc::new(notifier),
    }
  }
}
