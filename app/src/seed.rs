// src/seed.rs

//! Startup seeding from a JSON item list, plus image backfill for items that
//! already exist. Never touches pledged totals.

use crate::db::Repository;
use crate::errors::{AppError, Result as AppResult};
use crate::money::AmountInput;
use crate::models::NewItem;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedItem {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  /// Rand, not cents.
  pub price: AmountInput,
  #[serde(default = "default_quantity")]
  pub quantity: i32,
  #[serde(default)]
  pub shop: Option<String>,
  #[serde(default)]
  pub image_url: Option<String>,
}

fn default_quantity() -> i32 {
  1
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
  pub inserted: usize,
  pub images_backfilled: usize,
}

pub fn load_seed_file(path: &Path) -> AppResult<Vec<SeedItem>> {
  let raw = std::fs::read_to_string(path)
    .map_err(|e| AppError::Config(format!("Cannot read seed file {}: {}", path.display(), e)))?;
  serde_json::from_str(&raw).map_err(|e| AppError::Config(format!("Invalid seed file {}: {}", path.display(), e)))
}

#[instrument(name = "seed::apply", skip_all, fields(count = items.len()), err(Display))]
pub async fn apply_seed(repo: &dyn Repository, items: Vec<SeedItem>) -> AppResult<SeedReport> {
  let existing: HashMap<String, (i32, Option<String>)> = repo
    .list_items()
    .await?
    .into_iter()
    .map(|item| (item.name, (item.id, item.image_url)))
    .collect();

  let mut report = SeedReport::default();
  for seed in items {
    match existing.get(&seed.name) {
      Some((item_id, current_image)) => {
        if let Some(image_url) = seed.image_url.as_deref() {
          if current_image.as_deref() != Some(image_url) {
            repo.set_item_image(*item_id, image_url).await?;
            info!(item_id, image_url, "Backfilled item image.");
            report.images_backfilled += 1;
          }
        }
      }
      None => {
        let price_cents = seed
          .price
          .to_minor_units()
          .map_err(|_| AppError::Config(format!("Seed item '{}' has an invalid price.", seed.name)))?;
        let item = repo
          .insert_item(NewItem {
            name: seed.name,
            description: seed.description,
            price_cents,
            quantity: seed.quantity,
            shop: seed.shop,
            image_url: seed.image_url,
          })
          .await?;
        info!(item_id = item.id, name = %item.name, "Seeded item.");
        report.inserted += 1;
      }
    }
  }
  Ok(report)
}
