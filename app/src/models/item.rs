// src/models/item.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
  pub id: i32,
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub quantity: i32,
  pub shop: Option<String>,
  pub image_url: Option<String>,
  pub total_pledged_cents: i64,
  pub is_locked: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Item {
  /// price x quantity: the most that may ever be pledged toward this item.
  pub fn cap_cents(&self) -> i64 {
    self.price_cents * i64::from(self.quantity)
  }

  pub fn remaining_cents(&self) -> i64 {
    (self.cap_cents() - self.total_pledged_cents).max(0)
  }
}

/// An item as created by seeding. Pledged total and lock always start empty.
#[derive(Debug, Clone)]
pub struct NewItem {
  pub name: String,
  pub description: Option<String>,
  pub price_cents: i64,
  pub quantity: i32,
  pub shop: Option<String>,
  pub image_url: Option<String>,
}
