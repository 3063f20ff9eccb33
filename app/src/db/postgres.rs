// src/db/postgres.rs

use crate::db::Repository;
use crate::errors::{AppError, Result as AppResult};
use crate::models::{CommittedPledge, Item, NewIdentity, NewItem, NewPledge, Pledge, PledgeRecord, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{event, instrument, Level};

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct PgRepository {
  pool: PgPool,
}

impl PgRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn migrate(&self) -> AppResult<()> {
    MIGRATOR
      .run(&self.pool)
      .await
      .map_err(|e| AppError::Internal(format!("Database migration failed: {}", e)))
  }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl Repository for PgRepository {
  async fn list_items(&self) -> AppResult<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY id ASC")
      .fetch_all(&self.pool)
      .await?;
    Ok(items)
  }

  async fn get_item(&self, item_id: i32) -> AppResult<Option<Item>> {
    let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
      .bind(item_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(item)
  }

  async fn pledged_total(&self, item_id: i32) -> AppResult<i64> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM pledges WHERE item_id = $1")
      .bind(item_id)
      .fetch_one(&self.pool)
      .await?;
    Ok(total)
  }

  #[instrument(name = "pg::commit_pledge", skip(self, pledge), fields(item_id = pledge.item_id, reference = %pledge.reference), err(Display))]
  async fn commit_pledge(&self, pledge: NewPledge) -> AppResult<CommittedPledge> {
    let mut tx = self.pool.begin().await?;

    // Row lock on the item serializes concurrent commits for it.
    let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
      .bind(pledge.item_id)
      .fetch_optional(&mut *tx)
      .await?
      .ok_or(AppError::NotFound)?;
    if item.is_locked {
      return Err(AppError::AlreadyFulfilled);
    }

    let current: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM pledges WHERE item_id = $1")
      .bind(pledge.item_id)
      .fetch_one(&mut *tx)
      .await?;
    let new_total = match current.checked_add(pledge.amount_cents) {
      Some(total) if total <= item.cap_cents() => total,
      _ => {
        return Err(AppError::ExceedsRemaining {
          remaining_cents: (item.cap_cents() - current).max(0),
        })
      }
    };

    let inserted = sqlx::query_as::<_, Pledge>(
      "INSERT INTO pledges (reference, item_id, full_name, email, cell_number, amount_cents, is_full, popi_consent) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) RETURNING *",
    )
    .bind(&pledge.reference)
    .bind(pledge.item_id)
    .bind(&pledge.full_name)
    .bind(&pledge.email)
    .bind(&pledge.cell_number)
    .bind(pledge.amount_cents)
    .bind(pledge.is_full)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
      if is_unique_violation(&e) {
        AppError::DuplicateReference(pledge.reference.clone())
      } else {
        AppError::Sqlx(e)
      }
    })?;

    let updated = sqlx::query_as::<_, Item>(
      "UPDATE items SET total_pledged_cents = $2, is_locked = ($2 >= price_cents * quantity), updated_at = NOW() \
       WHERE id = $1 AND $2 <= price_cents * quantity RETURNING *",
    )
    .bind(pledge.item_id)
    .bind(new_total)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::ExceedsRemaining {
      remaining_cents: (item.cap_cents() - current).max(0),
    })?;

    tx.commit().await?;
    event!(Level::INFO, pledge_id = inserted.id, new_total, locked = updated.is_locked, "Pledge committed.");
    Ok(CommittedPledge {
      pledge: inserted,
      item: updated,
    })
  }

  async fn list_pledges(&self) -> AppResult<Vec<PledgeRecord>> {
    let records = sqlx::query_as::<_, PledgeRecord>(
      "SELECT p.*, i.name AS item_name, \
         EXISTS (SELECT 1 FROM pledge_notifications n WHERE n.pledge_id = p.id AND n.sent) AS email_sent \
       FROM pledges p LEFT JOIN items i ON i.id = p.item_id \
       ORDER BY p.created_at ASC, p.id ASC",
    )
    .fetch_all(&self.pool)
    .await?;
    Ok(records)
  }

  async fn record_notification(&self, pledge_id: i32, sent: bool) -> AppResult<()> {
    sqlx::query("INSERT INTO pledge_notifications (pledge_id, sent) VALUES ($1, $2)")
      .bind(pledge_id)
      .bind(sent)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn upsert_user(&self, identity: NewIdentity) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
      "INSERT INTO users (external_id, name, email, login_method, role, last_signed_in) \
       VALUES ($1, $2, $3, $4, $5, NOW()) \
       ON CONFLICT (external_id) DO UPDATE SET \
         name = COALESCE(EXCLUDED.name, users.name), \
         email = COALESCE(EXCLUDED.email, users.email), \
         login_method = COALESCE(EXCLUDED.login_method, users.login_method), \
         role = EXCLUDED.role, \
         last_signed_in = NOW(), \
         updated_at = NOW() \
       RETURNING *",
    )
    .bind(&identity.external_id)
    .bind(&identity.name)
    .bind(&identity.email)
    .bind(&identity.login_method)
    .bind(identity.role)
    .fetch_one(&self.pool)
    .await?;
    Ok(user)
  }

  async fn create_session(&self, token: &str, user_id: i32, expires_at: DateTime<Utc>) -> AppResult<()> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
      .bind(token)
      .bind(user_id)
      .bind(expires_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn find_session_user(&self, token: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
      "SELECT u.* FROM sessions s JOIN users u ON u.id = s.user_id WHERE s.token = $1 AND s.expires_at > NOW()",
    )
    .bind(token)
    .fetch_optional(&self.pool)
    .await?;
    Ok(user)
  }

  async fn delete_session(&self, token: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
      .bind(token)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn insert_item(&self, item: NewItem) -> AppResult<Item> {
    let inserted = sqlx::query_as::<_, Item>(
      "INSERT INTO items (name, description, price_cents, quantity, shop, image_url) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(&item.name)
    .bind(&item.description)
    .bind(item.price_cents)
    .bind(item.quantity)
    .bind(&item.shop)
    .bind(&item.image_url)
    .fetch_one(&self.pool)
    .await?;
    Ok(inserted)
  }

  async fn set_item_image(&self, item_id: i32, image_url: &str) -> AppResult<()> {
    sqlx::query("UPDATE items SET image_url = $2, updated_at = NOW() WHERE id = $1")
      .bind(item_id)
      .bind(image_url)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  #[instrument(name = "pg::rebuild_item_totals", skip(self), err(Display))]
  async fn rebuild_item_totals(&self) -> AppResult<usize> {
    let result = sqlx::query(
      "WITH totals AS ( \
         SELECT i.id, COALESCE(SUM(p.amount_cents), 0)::BIGINT AS total \
         FROM items i LEFT JOIN pledges p ON p.item_id = i.id GROUP BY i.id \
       ) \
       UPDATE items SET \
         total_pledged_cents = totals.total, \
         is_locked = (totals.total >= items.price_cents * items.quantity), \
         updated_at = NOW() \
       FROM totals \
       WHERE items.id = totals.id \
         AND (items.total_pledged_cents <> totals.total \
           OR items.is_locked <> (totals.total >= items.price_cents * items.quantity))",
    )
    .execute(&self.pool)
    .await?;
    Ok(result.rows_affected() as usize)
  }
}
