//! Serde types matching the remote tables, plus the naming adapter.
//!
//! Storage rows use lowercase column names (`vouchernumber`, `dateofservice`).
//! Nothing outside this module sees those names: rows are converted to and
//! from domain types here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{AppState, ListKind, Voucher, INITIAL_VOUCHER_NUMBER};

/// Columns can come back as explicit `null`; treat that like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Voucher table
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVoucher {
  #[serde(default, deserialize_with = "null_as_default")]
  pub id: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub vouchernumber: u32,
  #[serde(default, deserialize_with = "null_as_default")]
  pub to: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub servicetype: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub dateofservice: String,
  #[serde(default)]
  pub visittime: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tournumber: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub numberoftravelers: u32,
  #[serde(default, deserialize_with = "null_as_default")]
  pub servicedescription: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub guidename: String,
  #[serde(default)]
  pub createdat: Option<DateTime<Utc>>,
}

impl From<&Voucher> for StoredVoucher {
  fn from(v: &Voucher) -> Self {
    StoredVoucher {
      id: v.id,
      vouchernumber: v.voucher_number,
      to: v.to.clone(),
      servicetype: v.service_type.clone(),
      dateofservice: v.date_of_service.clone(),
      visittime: v.visit_time.clone(),
      tournumber: v.tour_number.clone(),
      numberoftravelers: v.number_of_travelers,
      servicedescription: v.service_description.clone(),
      guidename: v.guide_name.clone(),
      createdat: Some(v.created_at),
    }
  }
}

impl From<StoredVoucher> for Voucher {
  fn from(row: StoredVoucher) -> Self {
    Voucher {
      id: row.id,
      voucher_number: row.vouchernumber,
      to: row.to,
      service_type: row.servicetype,
      date_of_service: row.dateofservice,
      visit_time: row.visittime.filter(|t| !t.is_empty()),
      tour_number: row.tournumber,
      number_of_travelers: row.numberoftravelers,
      service_description: row.servicedescription,
      guide_name: row.guidename,
      created_at: row.createdat.unwrap_or_else(Utc::now),
    }
  }
}

// ============================================================================
// Named list table
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
  #[serde(rename = "type")]
  pub kind: String,
  pub name: String,
}

impl ListRow {
  pub fn new(kind: ListKind, name: &str) -> Self {
    Self {
      kind: kind.tag().to_string(),
      name: name.to_string(),
    }
  }
}

// ============================================================================
// Config table
// ============================================================================

/// Key of the config row holding the voucher counter
pub const NEXT_VOUCHER_NUMBER_KEY: &str = "next_voucher_number";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigRow {
  pub key: String,
  #[serde(default)]
  pub value: Value,
}

impl ConfigRow {
  /// Counter value; the column may hold a number or a numeric string
  pub fn as_counter(&self) -> Option<u32> {
    match &self.value {
      Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }
}

// ============================================================================
// Conversions to domain types
// ============================================================================

/// Assemble application state from the three remote fetches.
///
/// List rows are partitioned by category; unknown categories are skipped.
/// The counter never ends up at or below an issued voucher number.
pub fn assemble_state(
  vouchers: Vec<StoredVoucher>,
  rows: Vec<ListRow>,
  next_voucher_number: Option<u32>,
) -> AppState {
  let vouchers: Vec<Voucher> = vouchers.into_iter().map(Voucher::from).collect();

  let mut services = Vec::new();
  let mut suppliers = Vec::new();
  let mut guides = Vec::new();
  for row in rows {
    match ListKind::from_tag(&row.kind) {
      Some(ListKind::Service) => services.push(row.name),
      Some(ListKind::Supplier) => suppliers.push(row.name),
      Some(ListKind::Guide) => guides.push(row.name),
      None => {}
    }
  }
  for list in [&mut services, &mut suppliers, &mut guides] {
    list.sort();
    list.dedup();
  }

  let floor = vouchers
    .iter()
    .map(|v| v.voucher_number + 1)
    .max()
    .unwrap_or(INITIAL_VOUCHER_NUMBER);
  let next_voucher_number = next_voucher_number
    .unwrap_or(INITIAL_VOUCHER_NUMBER)
    .max(floor);

  AppState {
    vouchers,
    services,
    suppliers,
    guides,
    next_voucher_number,
  }
}
