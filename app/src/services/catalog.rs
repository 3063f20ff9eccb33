// src/services/catalog.rs

use crate::db::Repository;
use crate::errors::{AppError, Result as AppResult};
use crate::models::Item;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Read side of the catalog. The full listing is cached for a TTL and
/// dropped after every committed pledge.
#[derive(Clone)]
pub struct CatalogService {
  repo: Arc<dyn Repository>,
  listing: Cache<(), Arc<Vec<Item>>>,
}

impl CatalogService {
  pub fn new(repo: Arc<dyn Repository>, ttl: Duration) -> Self {
    let listing = Cache::builder().max_capacity(1).time_to_live(ttl).build();
    Self { repo, listing }
  }

  #[instrument(name = "catalog::list_items", skip(self), err(Display))]
  pub async fn list_items(&self) -> AppResult<Arc<Vec<Item>>> {
    let repo = Arc::clone(&self.repo);
    self
      .listing
      .try_get_with((), async move {
        debug!("Catalog cache miss; loading items.");
        repo.list_items().await.map(Arc::new)
      })
      .await
      .map_err(|shared: Arc<AppError>| AppError::Internal(format!("Failed to load catalog: {}", shared)))
  }

  /// Single items always come from the store so totals are current.
  pub async fn get_item(&self, item_id: i32) -> AppResult<Item> {
    self.repo.get_item(item_id).await?.ok_or(AppError::NotFound)
  }

  pub async fn invalidate(&self) {
    self.listing.invalidate(&()).await;
    debug!("Catalog cache invalidated.");
  }
}
