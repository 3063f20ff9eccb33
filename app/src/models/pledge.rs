// src/models/pledge.rs

use crate::money::AmountInput;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// One row of the pledge ledger. Never updated once written.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Pledge {
  pub id: i32,
  pub reference: String,
  pub item_id: i32,
  pub full_name: String,
  pub email: String,
  pub cell_number: String,
  pub amount_cents: i64,
  pub is_full: bool,
  pub popi_consent: bool,
  pub created_at: DateTime<Utc>,
}

/// What the commit step writes. The store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewPledge {
  pub reference: String,
  pub item_id: i32,
  pub full_name: String,
  pub email: String,
  pub cell_number: String,
  pub amount_cents: i64,
  pub is_full: bool,
}

/// A ledger row as admins see it: joined with its item's name and with
/// `email_sent` derived from the notification log.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PledgeRecord {
  #[serde(flatten)]
  #[sqlx(flatten)]
  pub pledge: Pledge,
  pub item_name: Option<String>,
  pub email_sent: bool,
}

/// Result of a successful commit: the new ledger row and the item after its
/// aggregate was updated.
#[derive(Debug, Clone)]
pub struct CommittedPledge {
  pub pledge: Pledge,
  pub item: crate::models::Item,
}

/// A pledge submission as posted by the public form.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PledgeRequest {
  pub item_id: i32,
  #[validate(length(min = 2, message = "Please enter your full name."))]
  pub full_name: String,
  #[validate(email(message = "Please enter a valid email address."))]
  pub email: String,
  #[validate(length(min = 10, message = "Please enter a valid cell number."))]
  pub cell_number: String,
  pub amount: AmountInput,
  #[serde(default)]
  pub is_full: bool,
  #[serde(default)]
  pub popi_consent: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeReceipt {
  pub success: bool,
  pub message: String,
  pub pledge_reference: String,
  pub item_name: String,
  /// Rand amount after rounding, serialized as a JSON number.
  #[serde(with = "rust_decimal::serde::float")]
  pub amount: Decimal,
  pub email_sent: bool,
}
