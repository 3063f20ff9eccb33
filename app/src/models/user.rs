// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[sqlx(type_name = "user_role_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: i32,
  pub external_id: String,
  pub name: Option<String>,
  pub email: Option<String>,
  pub login_method: Option<String>,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub last_signed_in: DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}

/// Identity presented at login. Inserted the first time, refreshed afterwards.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub external_id: String,
  pub name: Option<String>,
  pub email: Option<String>,
  pub login_method: Option<String>,
  pub role: Role,
}
