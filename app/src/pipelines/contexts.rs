// src/pipelines/contexts.rs

//! Data carried through each flow. Handlers receive these wrapped in
//! `pledge_flow::ContextData`.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{CommittedPledge, Item, PledgeRequest, User};
use crate::state::AppState;
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct PledgeCtxData {
  pub app_state: AppState,
  pub request: PledgeRequest,
  pub item: Option<Item>,
  pub amount_cents: Option<i64>,
  pub committed: Option<CommittedPledge>,
  pub email_sent: bool,
}

impl PledgeCtxData {
  pub fn new(app_state: AppState, request: PledgeRequest) -> Self {
    Self {
      app_state,
      request,
      item: None,
      amount_cents: None,
      committed: None,
      email_sent: false,
    }
  }
}

#[derive(Clone)]
pub struct AdminLoginCtxData {
  pub app_state: AppState,
  pub username: String,
  pub password: String,
  pub user: Option<User>,
  pub session_token: Option<String>,
  pub session_expires_at: Option<DateTime<Utc>>,
}

impl AdminLoginCtxData {
  pub fn new(app_state: AppState, username: String, password: String) -> Self {
    Self {
      app_state,
      username,
      password,
      user: None,
      session_token: None,
      session_expires_at: None,
    }
  }
}

/// A value an earlier step should have filled in. Missing means the flow is
/// wired wrong, not that the request was bad.
pub fn filled<T>(value: Option<T>, what: &str) -> AppResult<T> {
  value.ok_or_else(|| AppError::Internal(format!("{} missing from flow context", what)))
}
