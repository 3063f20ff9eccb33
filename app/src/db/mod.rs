// src/db/mod.rs

//! Persistence. Handlers and flows only ever see [`Repository`]; which store
//! backs it is decided once at startup.

pub mod memory;
pub mod postgres;

use crate::errors::Result as AppResult;
use crate::models::{CommittedPledge, Item, NewIdentity, NewItem, NewPledge, PledgeRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

#[async_trait]
pub trait Repository: Send + Sync {
  /// All items ordered by id.
  async fn list_items(&self) -> AppResult<Vec<Item>>;

  async fn get_item(&self, item_id: i32) -> AppResult<Option<Item>>;

  /// Sum of ledger amounts for the item, read from the ledger itself rather
  /// than the cached aggregate.
  async fn pledged_total(&self, item_id: i32) -> AppResult<i64>;

  /// Appends a pledge and updates its item's aggregate as one atomic step.
  ///
  /// Re-checks, under the item's lock: the item exists (`NotFound`), is not
  /// locked (`AlreadyFulfilled`) and has room for the amount
  /// (`ExceedsRemaining`). A reference that is already taken fails with
  /// `DuplicateReference` and writes nothing.
  async fn commit_pledge(&self, pledge: NewPledge) -> AppResult<CommittedPledge>;

  /// Every ledger row, oldest first.
  async fn list_pledges(&self) -> AppResult<Vec<PledgeRecord>>;

  async fn record_notification(&self, pledge_id: i32, sent: bool) -> AppResult<()>;

  async fn upsert_user(&self, identity: NewIdentity) -> AppResult<User>;

  async fn create_session(&self, token: &str, user_id: i32, expires_at: DateTime<Utc>) -> AppResult<()>;

  /// The user behind an unexpired session.
  async fn find_session_user(&self, token: &str) -> AppResult<Option<User>>;

  async fn delete_session(&self, token: &str) -> AppResult<()>;

  async fn insert_item(&self, item: NewItem) -> AppResult<Item>;

  async fn set_item_image(&self, item_id: i32, image_url: &str) -> AppResult<()>;

  /// Recomputes every item's pledged total and lock from the ledger.
  /// Returns how many items had drifted.
  async fn rebuild_item_totals(&self) -> AppResult<usize>;
}
