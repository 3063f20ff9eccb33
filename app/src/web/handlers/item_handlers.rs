// src/web/handlers/item_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::Item;
use crate::state::AppState;

/// An item plus the figures the pledge form needs.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView<'a> {
  #[serde(flatten)]
  pub item: &'a Item,
  pub cap_cents: i64,
  pub remaining_cents: i64,
}

impl<'a> From<&'a Item> for ItemView<'a> {
  fn from(item: &'a Item) -> Self {
    Self {
      item,
      cap_cents: item.cap_cents(),
      remaining_cents: item.remaining_cents(),
    }
  }
}

#[instrument(name = "handler::list_items", skip(app_state))]
pub async fn list_items_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let items = app_state.catalog.list_items().await?;
  info!(count = items.len(), "Items listed.");
  let views: Vec<ItemView> = items.iter().map(ItemView::from).collect();
  Ok(HttpResponse::Ok().json(json!({ "items": views })))
}

#[instrument(name = "handler::get_item", skip(app_state, path), fields(item_id = *path))]
pub async fn get_item_handler(app_state: web::Data<AppState>, path: web::Path<i32>) -> Result<HttpResponse, AppError> {
  let item = app_state.catalog.get_item(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "item": ItemView::from(&item) })))
}
