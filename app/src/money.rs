// src/money.rs

//! Rand amounts. Everything stored or compared is an `i64` count of cents;
//! decimals only exist at the edges (request bodies, seed files, display).

use crate::errors::AppError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// An amount as submitted by a client: either a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
  Number(serde_json::Number),
  Text(String),
}

impl AmountInput {
  /// Parses the exact decimal text of the amount. JSON numbers are read from
  /// their shortest textual form, so `10.005` stays `10.005`.
  pub fn to_decimal(&self) -> Option<Decimal> {
    let text = match self {
      AmountInput::Number(n) => n.to_string(),
      AmountInput::Text(s) => s.trim().to_string(),
    };
    Decimal::from_str(&text)
      .or_else(|_| Decimal::from_scientific(&text))
      .ok()
  }

  /// Cents, rounded half to even at two places. Zero, negative and
  /// unparsable input are all `InvalidAmount`.
  pub fn to_minor_units(&self) -> Result<i64, AppError> {
    let amount = self.to_decimal().ok_or(AppError::InvalidAmount)?;
    to_minor_units(amount)
  }
}

impl From<&str> for AmountInput {
  fn from(s: &str) -> Self {
    AmountInput::Text(s.to_string())
  }
}

impl From<i64> for AmountInput {
  fn from(n: i64) -> Self {
    AmountInput::Number(n.into())
  }
}

/// Cents back to a two-place decimal.
pub fn to_major_units(cents: i64) -> Decimal {
  Decimal::new(cents, 2)
}

pub fn to_minor_units(amount: Decimal) -> Result<i64, AppError> {
  let cents = amount
    .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
    .checked_mul(Decimal::ONE_HUNDRED)
    .and_then(|c| c.to_i64());
  match cents {
    Some(c) if c > 0 => Ok(c),
    _ => Err(AppError::InvalidAmount),
  }
}

/// `R1,234.50`
pub fn format_rand(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  let whole = (abs / 100).to_string();
  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (i, ch) in whole.chars().enumerate() {
    if i > 0 && (whole.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }
  format!("{}R{}.{:02}", sign, grouped, abs % 100)
}

/// `1234.50`, used where a plain number is expected (CSV).
pub fn format_plain(cents: i64) -> String {
  let sign = if cents < 0 { "-" } else { "" };
  let abs = cents.unsigned_abs();
  format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cents(input: &str) -> Result<i64, AppError> {
    AmountInput::from(input).to_minor_units()
  }

  #[test]
  fn rounds_half_to_even() {
    assert_eq!(cents("10.005").unwrap(), 1000);
    assert_eq!(cents("10.015").unwrap(), 1002);
    assert_eq!(cents("10.025").unwrap(), 1002);
    assert_eq!(cents("600").unwrap(), 60_000);
    assert!(matches!(cents("0.004"), Err(AppError::InvalidAmount)));
  }

  #[test]
  fn rejects_non_positive_and_garbage() {
    assert!(matches!(cents("0"), Err(AppError::InvalidAmount)));
    assert!(matches!(cents("-5"), Err(AppError::InvalidAmount)));
    assert!(matches!(cents("ten"), Err(AppError::InvalidAmount)));
    assert!(matches!(cents(""), Err(AppError::InvalidAmount)));
    assert!(matches!(cents("79228162514264337593543950335"), Err(AppError::InvalidAmount)));
    assert!(matches!(cents("92233720368547758.08"), Err(AppError::InvalidAmount)));
  }

  #[test]
  fn json_numbers_keep_their_decimal_text() {
    let input: AmountInput = serde_json::from_str("10.005").unwrap();
    assert_eq!(input.to_minor_units().unwrap(), 1000);
    let input: AmountInput = serde_json::from_str("\"400.00\"").unwrap();
    assert_eq!(input.to_minor_units().unwrap(), 40_000);
    let input: AmountInput = serde_json::from_str("250").unwrap();
    assert_eq!(input.to_minor_units().unwrap(), 25_000);
  }

  #[test]
  fn formats_rand_with_thousands_separators() {
    assert_eq!(format_rand(123_450), "R1,234.50");
    assert_eq!(format_rand(40_000), "R400.00");
    assert_eq!(format_rand(5), "R0.05");
    assert_eq!(format_rand(100_000_000), "R1,000,000.00");
    assert_eq!(format_plain(123_450), "1234.50");
    assert_eq!(to_major_units(123_450).to_string(), "1234.50");
  }
}
