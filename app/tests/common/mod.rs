// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use pledge_server::config::{AppConfig, RemittanceDetails};
use pledge_server::db::{MemoryRepository, Repository};
use pledge_server::errors::{AppError, Result as AppResult};
use pledge_server::models::{
  CommittedPledge, Item, NewIdentity, NewItem, NewPledge, PledgeRecord, PledgeRequest, Role, User,
};
use pledge_server::money::AmountInput;
use pledge_server::services::auth_service;
use pledge_server::services::mailer::{Mailer, OutgoingEmail};
use pledge_server::services::notifier::NotificationDispatcher;
use pledge_server::state::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

pub const ADMIN_USERNAME: &str = "treasurer";
pub const ADMIN_PASSWORD: &str = "s3cret-offering";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

// Hashing is slow; one hash serves every test.
static ADMIN_HASH: Lazy<String> =
  Lazy::new(|| auth_service::hash_password(ADMIN_PASSWORD).expect("admin hash"));

pub fn test_config() -> AppConfig {
  let vars: HashMap<&str, String> = HashMap::from([
    ("ADMIN_USERNAME", ADMIN_USERNAME.to_string()),
    ("ADMIN_PASSWORD_HASH", ADMIN_HASH.clone()),
  ]);
  AppConfig::from_lookup(move |name| vars.get(name).cloned()).expect("test config")
}

// --- Mailers ---

#[derive(Default)]
pub struct RecordingMailer {
  pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
  async fn send(&self, email: &OutgoingEmail) -> anyhow::Result<()> {
    self.sent.lock().push(email.clone());
    Ok(())
  }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
  async fn send(&self, _email: &OutgoingEmail) -> anyhow::Result<()> {
    anyhow::bail!("relay refused connection")
  }
}

pub struct SlowMailer(pub Duration);

#[async_trait]
impl Mailer for SlowMailer {
  async fn send(&self, _email: &OutgoingEmail) -> anyhow::Result<()> {
    tokio::time::sleep(self.0).await;
    Ok(())
  }
}

pub fn notifier_with(mailer: Arc<dyn Mailer>) -> NotificationDispatcher {
  NotificationDispatcher::new(Some(mailer), Duration::from_millis(200), RemittanceDetails::default())
}

// --- Repository that collides on references ---

/// Delegates to a `MemoryRepository`, but the first `collisions` commits fail
/// as if the generated reference were already taken.
pub struct FlakyRepository {
  pub inner: Arc<MemoryRepository>,
  collisions: AtomicUsize,
  pub commit_attempts: AtomicUsize,
}

impl FlakyRepository {
  pub fn new(inner: Arc<MemoryRepository>, collisions: usize) -> Self {
    Self {
      inner,
      collisions: AtomicUsize::new(collisions),
      commit_attempts: AtomicUsize::new(0),
    }
  }
}

#[async_trait]
impl Repository for FlakyRepository {
  async fn list_items(&self) -> AppResult<Vec<Item>> {
    self.inner.list_items().await
  }
  async fn get_item(&self, item_id: i32) -> AppResult<Option<Item>> {
    self.inner.get_item(item_id).await
  }
  async fn pledged_total(&self, item_id: i32) -> AppResult<i64> {
    self.inner.pledged_total(item_id).await
  }
  async fn commit_pledge(&self, pledge: NewPledge) -> AppResult<CommittedPledge> {
    self.commit_attempts.fetch_add(1, Ordering::SeqCst);
    let left = self.collisions.load(Ordering::SeqCst);
    if left > 0 {
      self.collisions.store(left - 1, Ordering::SeqCst);
      return Err(AppError::DuplicateReference(pledge.reference));
    }
    self.inner.commit_pledge(pledge).await
  }
  async fn list_pledges(&self) -> AppResult<Vec<PledgeRecord>> {
    self.inner.list_pledges().await
  }
  async fn record_notification(&self, pledge_id: i32, sent: bool) -> AppResult<()> {
    self.inner.record_notification(pledge_id, sent).await
  }
  async fn upsert_user(&self, identity: NewIdentity) -> AppResult<User> {
    self.inner.upsert_user(identity).await
  }
  async fn create_session(&self, token: &str, user_id: i32, expires_at: DateTime<Utc>) -> AppResult<()> {
    self.inner.create_session(token, user_id, expires_at).await
  }
  async fn find_session_user(&self, token: &str) -> AppResult<Option<User>> {
    self.inner.find_session_user(token).await
  }
  async fn delete_session(&self, token: &str) -> AppResult<()> {
    self.inner.delete_session(token).await
  }
  async fn insert_item(&self, item: NewItem) -> AppResult<Item> {
    self.inner.insert_item(item).await
  }
  async fn set_item_image(&self, item_id: i32, image_url: &str) -> AppResult<()> {
    self.inner.set_item_image(item_id, image_url).await
  }
  async fn rebuild_item_totals(&self) -> AppResult<usize> {
    self.inner.rebuild_item_totals().await
  }
}

// --- State builders ---

pub struct TestApp {
  pub state: AppState,
  pub memory: Arc<MemoryRepository>,
  /// Price 500.00, quantity 2: a cap of 1000.00.
  pub item_id: i32,
}

pub async fn seed_chairs(repo: &MemoryRepository) -> Item {
  repo
    .insert_item(NewItem {
      name: "Stackable chairs".to_string(),
      description: Some("For the fellowship hall".to_string()),
      price_cents: 50_000,
      quantity: 2,
      shop: Some("Makro".to_string()),
      image_url: None,
    })
    .await
    .expect("seed item")
}

pub async fn build_app(notifier: NotificationDispatcher) -> TestApp {
  setup_tracing();
  let memory = Arc::new(MemoryRepository::new());
  let item = seed_chairs(&memory).await;
  let state = AppState::new(Arc::new(test_config()), memory.clone(), notifier);
  TestApp {
    state,
    memory,
    item_id: item.id,
  }
}

pub async fn build_app_without_mail() -> TestApp {
  build_app(NotificationDispatcher::disabled(RemittanceDetails::default())).await
}

pub fn pledge_request(item_id: i32, amount: impl Into<AmountInput>) -> PledgeRequest {
  PledgeRequest {
    item_id,
    full_name: "Thandi Mokoena".to_string(),
    email: "thandi@example.org".to_string(),
    cell_number: "0821234567".to_string(),
    amount: amount.into(),
    is_full: false,
    popi_consent: true,
  }
}

/// A plain member account with a live session; returns the session token.
pub async fn member_session(repo: &dyn Repository) -> String {
  let user = repo
    .upsert_user(NewIdentity {
      external_id: "local:member".to_string(),
      name: Some("member".to_string()),
      email: None,
      login_method: Some("password".to_string()),
      role: Role::User,
    })
    .await
    .expect("member user");
  let token = auth_service::new_session_token();
  repo
    .create_session(&token, user.id, Utc::now() + chrono::Duration::hours(1))
    .await
    .expect("member session");
  token
}
