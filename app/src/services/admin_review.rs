// src/services/admin_review.rs

//! Admin-side views over the ledger: search, summary numbers and CSV export.

use crate::models::{Item, PledgeRecord};
use crate::money::{format_plain, format_rand};
use chrono::NaiveDate;
use serde::Serialize;

/// Case-insensitive match on name, email and item name; the cell number is
/// matched as typed. A blank query keeps everything.
pub fn search<'a>(records: &'a [PledgeRecord], query: &str) -> Vec<&'a PledgeRecord> {
  let query = query.trim();
  if query.is_empty() {
    return records.iter().collect();
  }
  let needle = query.to_lowercase();
  records
    .iter()
    .filter(|r| {
      r.pledge.full_name.to_lowercase().contains(&needle)
        || r.pledge.email.to_lowercase().contains(&needle)
        || r.pledge.cell_number.contains(query)
        || r
          .item_name
          .as_deref()
          .is_some_and(|name| name.to_lowercase().contains(&needle))
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PledgeStats {
  pub total_pledged_cents: i64,
  pub total_pledged_display: String,
  pub pledge_count: usize,
  pub item_count: usize,
  pub fully_funded_items: usize,
}

pub fn stats(items: &[Item], records: &[PledgeRecord]) -> PledgeStats {
  let total: i64 = records.iter().map(|r| r.pledge.amount_cents).sum();
  PledgeStats {
    total_pledged_cents: total,
    total_pledged_display: format_rand(total),
    pledge_count: records.len(),
    item_count: items.len(),
    fully_funded_items: items.iter().filter(|i| i.is_locked).count(),
  }
}

pub const CSV_HEADERS: [&str; 7] = ["Date", "Full Name", "Email", "Cell Number", "Item", "Amount", "Type"];

fn csv_cell(raw: &str) -> String {
  format!("\"{}\"", raw.replace('"', "\"\""))
}

pub fn export_csv(records: &[&PledgeRecord]) -> String {
  let mut out = CSV_HEADERS.join(",");
  out.push('\n');
  for r in records {
    let row = [
      r.pledge.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
      r.pledge.full_name.clone(),
      r.pledge.email.clone(),
      r.pledge.cell_number.clone(),
      r.item_name.clone().unwrap_or_else(|| "Unknown Item".to_string()),
      format_plain(r.pledge.amount_cents),
      if r.pledge.is_full { "Full" } else { "Partial" }.to_string(),
    ];
    let cells: Vec<String> = row.iter().map(|c| csv_cell(c)).collect();
    out.push_str(&cells.join(","));
    out.push('\n');
  }
  out
}

pub fn csv_filename(day: NaiveDate) -> String {
  format!("pledges-{}.csv", day.format("%Y-%m-%d"))
}
