// src/db/memory.rs

//! In-process store used by tests and by local runs without `DATABASE_URL`.
//! Every operation takes the one mutex, so a commit's re-check and write
//! happen without interleaving, matching the row lock of the SQL store.

use crate::db::Repository;
use crate::errors::{AppError, Result as AppResult};
use crate::models::{CommittedPledge, Item, NewIdentity, NewItem, NewPledge, Pledge, PledgeRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

struct Session {
  user_id: i32,
  expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
  items: BTreeMap<i32, Item>,
  pledges: Vec<Pledge>,
  notifications: Vec<(i32, bool)>,
  users: Vec<User>,
  sessions: HashMap<String, Session>,
  next_item_id: i32,
  next_pledge_id: i32,
  next_user_id: i32,
}

impl MemoryState {
  fn ledger_sum(&self, item_id: i32) -> i64 {
    self
      .pledges
      .iter()
      .filter(|p| p.item_id == item_id)
      .map(|p| p.amount_cents)
      .sum()
  }
}

#[derive(Default)]
pub struct MemoryRepository {
  state: Mutex<MemoryState>,
}

impl MemoryRepository {
  pub fn new() -> Self {
    Self::default()
  }

  /// Overwrites an item's stored aggregate without touching the ledger.
  /// Lets tests simulate drift for `rebuild_item_totals`.
  pub fn force_item_total(&self, item_id: i32, total_pledged_cents: i64, is_locked: bool) {
    let mut state = self.state.lock();
    if let Some(item) = state.items.get_mut(&item_id) {
      item.total_pledged_cents = total_pledged_cents;
      item.is_locked = is_locked;
    }
  }
}

#[async_trait]
impl Repository for MemoryRepository {
  async fn list_items(&self) -> AppResult<Vec<Item>> {
    Ok(self.state.lock().items.values().cloned().collect())
  }

  async fn get_item(&self, item_id: i32) -> AppResult<Option<Item>> {
    Ok(self.state.lock().items.get(&item_id).cloned())
  }

  async fn pledged_total(&self, item_id: i32) -> AppResult<i64> {
    Ok(self.state.lock().ledger_sum(item_id))
  }

  async fn commit_pledge(&self, pledge: NewPledge) -> AppResult<CommittedPledge> {
    let mut state = self.state.lock();

    let item = state.items.get(&pledge.item_id).ok_or(AppError::NotFound)?;
    if item.is_locked {
      return Err(AppError::AlreadyFulfilled);
    }
    let cap = item.cap_cents();
    let current = state.ledger_sum(pledge.item_id);
    let new_total = match current.checked_add(pledge.amount_cents) {
      Some(total) if total <= cap => total,
      _ => {
        return Err(AppError::ExceedsRemaining {
          remaining_cents: (cap - current).max(0),
        })
      }
    };
    if state.pledges.iter().any(|p| p.reference == pledge.reference) {
      return Err(AppError::DuplicateReference(pledge.reference));
    }

    let now = Utc::now();
    state.next_pledge_id += 1;
    let row = Pledge {
      id: state.next_pledge_id,
      reference: pledge.reference,
      item_id: pledge.item_id,
      full_name: pledge.full_name,
      email: pledge.email,
      cell_number: pledge.cell_number,
      amount_cents: pledge.amount_cents,
      is_full: pledge.is_full,
      popi_consent: true,
      created_at: now,
    };
    state.pledges.push(row.clone());

    let item = state
      .items
      .get_mut(&row.item_id)
      .ok_or_else(|| AppError::Internal("item vanished during commit".to_string()))?;
    item.total_pledged_cents = new_total;
    item.is_locked = new_total >= cap;
    item.updated_at = now;

    Ok(CommittedPledge {
      pledge: row,
      item: item.clone(),
    })
  }

  async fn list_pledges(&self) -> AppResult<Vec<PledgeRecord>> {
    let state = self.state.lock();
    let records = state
      .pledges
      .iter()
      .map(|p| PledgeRecord {
        item_name: state.items.get(&p.item_id).map(|i| i.name.clone()),
        email_sent: state.notifications.iter().any(|(id, sent)| *id == p.id && *sent),
        pledge: p.clone(),
      })
      .collect();
    Ok(records)
  }

  async fn record_notification(&self, pledge_id: i32, sent: bool) -> AppResult<()> {
    self.state.lock().notifications.push((pledge_id, sent));
    Ok(())
  }

  async fn upsert_user(&self, identity: NewIdentity) -> AppResult<User> {
    let mut state = self.state.lock();
    let now = Utc::now();
    if let Some(user) = state.users.iter_mut().find(|u| u.external_id == identity.external_id) {
      user.name = identity.name.or(user.name.take());
      user.email = identity.email.or(user.email.take());
      user.login_method = identity.login_method.or(user.login_method.take());
      user.role = identity.role;
      user.last_signed_in = now;
      user.updated_at = now;
      return Ok(user.clone());
    }
    state.next_user_id += 1;
    let user = User {
      id: state.next_user_id,
      external_id: identity.external_id,
      name: identity.name,
      email: identity.email,
      login_method: identity.login_method,
      role: identity.role,
      created_at: now,
      updated_at: now,
      last_signed_in: now,
    };
    state.users.push(user.clone());
    Ok(user)
  }

  async fn create_session(&self, token: &str, user_id: i32, expires_at: DateTime<Utc>) -> AppResult<()> {
    self
      .state
      .lock()
      .sessions
      .insert(token.to_string(), Session { user_id, expires_at });
    Ok(())
  }

  async fn find_session_user(&self, token: &str) -> AppResult<Option<User>> {
    let state = self.state.lock();
    let user = state
      .sessions
      .get(token)
      .filter(|s| s.expires_at > Utc::now())
      .and_then(|s| state.users.iter().find(|u| u.id == s.user_id))
      .cloned();
    Ok(user)
  }

  async fn delete_session(&self, token: &str) -> AppResult<()> {
    self.state.lock().sessions.remove(token);
    Ok(())
  }

  async fn insert_item(&self, item: NewItem) -> AppResult<Item> {
    let mut state = self.state.lock();
    let now = Utc::now();
    state.next_item_id += 1;
    let row = Item {
      id: state.next_item_id,
      name: item.name,
      description: item.description,
      price_cents: item.price_cents,
      quantity: item.quantity,
      shop: item.shop,
      image_url: item.image_url,
      total_pledged_cents: 0,
      is_locked: false,
      created_at: now,
      updated_at: now,
    };
    state.items.insert(row.id, row.clone());
    Ok(row)
  }

  async fn set_item_image(&self, item_id: i32, image_url: &str) -> AppResult<()> {
    if let Some(item) = self.state.lock().items.get_mut(&item_id) {
      item.image_url = Some(image_url.to_string());
      item.updated_at = Utc::now();
    }
    Ok(())
  }

  async fn rebuild_item_totals(&self) -> AppResult<usize> {
    let mut state = self.state.lock();
    let totals: Vec<(i32, i64)> = state.items.keys().map(|id| (*id, state.ledger_sum(*id))).collect();
    let mut drifted = 0;
    for (item_id, total) in totals {
      if let Some(item) = state.items.get_mut(&item_id) {
        let locked = total >= item.cap_cents();
        if item.total_pledged_cents != total || item.is_locked != locked {
          item.total_pledged_cents = total;
          item.is_locked = locked;
          item.updated_at = Utc::now();
          drifted += 1;
        }
      }
    }
    Ok(drifted)
  }
}
