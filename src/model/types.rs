use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First voucher number handed out on a fresh install
pub const INITIAL_VOUCHER_NUMBER: u32 = 8000;

pub const DEFAULT_SERVICES: &[&str] = &[
  "Airport Transfer",
  "City Tour",
  "Culinary Tour",
  "Hiking Guide",
  "Museum Visit",
  "Night Tour",
  "Private Chauffeur",
];

pub const DEFAULT_SUPPLIERS: &[&str] = &[
  "Guide Association",
  "Hotel Hilton",
  "Restaurant David",
  "Transport Group A",
];

pub const DEFAULT_GUIDES: &[&str] = &[];

/// A single work order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
  /// Client-generated millisecond timestamp, never changes
  pub id: i64,
  pub voucher_number: u32,
  /// Supplier or site the voucher is addressed to
  pub to: String,
  pub service_type: String,
  /// ISO date (YYYY-MM-DD)
  pub date_of_service: String,
  /// Time of day (HH:MM)
  #[serde(default)]
  pub visit_time: Option<String>,
  #[serde(default)]
  pub tour_number: String,
  pub number_of_travelers: u32,
  #[serde(default)]
  pub service_description: String,
  #[serde(default)]
  pub guide_name: String,
  pub created_at: DateTime<Utc>,
}

/// Everything the application persists as one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredState")]
pub struct AppState {
  pub vouchers: Vec<Voucher>,
  pub services: Vec<String>,
  pub suppliers: Vec<String>,
  pub guides: Vec<String>,
  pub next_voucher_number: u32,
}

impl Default for AppState {
  fn default() -> Self {
    Self {
      vouchers: Vec::new(),
      services: owned_sorted(DEFAULT_SERVICES),
      suppliers: owned_sorted(DEFAULT_SUPPLIERS),
      guides: owned_sorted(DEFAULT_GUIDES),
      next_voucher_number: INITIAL_VOUCHER_NUMBER,
    }
  }
}

/// Cached record as older app versions may have written it: any field can
/// be missing or null.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredState {
  #[serde(default)]
  vouchers: Option<Vec<Voucher>>,
  #[serde(default)]
  services: Option<Vec<String>>,
  #[serde(default)]
  suppliers: Option<Vec<String>>,
  #[serde(default)]
  guides: Option<Vec<String>>,
  #[serde(default)]
  next_voucher_number: Option<u32>,
}

impl From<StoredState> for AppState {
  fn from(stored: StoredState) -> Self {
    let seeded = AppState::default();
    Self {
      vouchers: stored.vouchers.unwrap_or_default(),
      services: stored.services.unwrap_or(seeded.services),
      suppliers: stored.suppliers.unwrap_or(seeded.suppliers),
      // An empty guide list means none were ever configured
      guides: stored
        .guides
        .filter(|g| !g.is_empty())
        .unwrap_or(seeded.guides),
      next_voucher_number: stored
        .next_voucher_number
        .filter(|n| *n > 0)
        .unwrap_or(seeded.next_voucher_number),
    }
  }
}

fn owned_sorted(items: &[&str]) -> Vec<String> {
  let mut v: Vec<String> = items.iter().map(|s| s.to_string()).collect();
  v.sort();
  v
}

impl AppState {
  pub fn find(&self, id: i64) -> Option<&Voucher> {
    self.vouchers.iter().find(|v| v.id == id)
  }

  pub fn find_by_number(&self, number: u32) -> Option<&Voucher> {
    self.vouchers.iter().find(|v| v.voucher_number == number)
  }

  pub fn list(&self, kind: ListKind) -> &[String] {
    match kind {
      ListKind::Service => &self.services,
      ListKind::Supplier => &self.suppliers,
      ListKind::Guide => &self.guides,
    }
  }

  pub(crate) fn list_mut(&mut self, kind: ListKind) -> &mut Vec<String> {
    match kind {
      ListKind::Service => &mut self.services,
      ListKind::Supplier => &mut self.suppliers,
      ListKind::Guide => &mut self.guides,
    }
  }

  /// Next free voucher id: the current time in milliseconds, bumped past any
  /// existing id so two vouchers created within one millisecond stay distinct.
  pub fn next_id(&self, now: DateTime<Utc>) -> i64 {
    let max_existing = self.vouchers.iter().map(|v| v.id).max().unwrap_or(0);
    now.timestamp_millis().max(max_existing + 1)
  }
}

/// Which reference list an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
  Service,
  Supplier,
  Guide,
}

impl ListKind {
  pub const ALL: [ListKind; 3] = [ListKind::Service, ListKind::Supplier, ListKind::Guide];

  /// Category tag used by the remote list table
  pub fn tag(&self) -> &'static str {
    match self {
      ListKind::Service => "service",
      ListKind::Supplier => "supplier",
      ListKind::Guide => "guide",
    }
  }

  pub fn from_tag(tag: &str) -> Option<Self> {
    match tag {
      "service" => Some(ListKind::Service),
      "supplier" => Some(ListKind::Supplier),
      "guide" => Some(ListKind::Guide),
      _ => None,
    }
  }

  pub fn title(&self) -> &'static str {
    match self {
      ListKind::Service => "Services",
      ListKind::Supplier => "Suppliers",
      ListKind::Guide => "Guides",
    }
  }
}

impl fmt::Display for ListKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.tag())
  }
}

impl FromStr for ListKind {
  type Err = String;

  /// Accepts singular or plural, case-insensitive
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let lower = s.trim().to_lowercase();
    let singular = lower.strip_suffix('s').unwrap_or(&lower);
    Self::from_tag(singular)
      .ok_or_else(|| format!("unknown list '{}', use services, suppliers or guides", s))
  }
}

/// Edit applied to one reference list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction {
  Add,
  Delete,
  /// Replace the entry called `from` with the new name
  Rename { from: String },
}

/// Screen the user was last looking at
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
  #[default]
  Dashboard,
  Create,
  Edit,
  Preview,
  Manage,
}

/// Lightweight record that lets a restart resume where the user left off
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
  #[serde(default)]
  pub last_view: ViewMode,
  #[serde(default)]
  pub last_active_voucher_id: Option<i64>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  #[test]
  fn test_default_state_is_seeded() {
    let state = AppState::default();
    assert!(state.vouchers.is_empty());
    assert_eq!(state.next_voucher_number, 8000);
    assert_eq!(state.services.len(), DEFAULT_SERVICES.len());
    assert_eq!(state.suppliers[0], "Guide Association");
    assert!(state.services.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn test_list_kind_parsing() {
    assert_eq!("services".parse::<ListKind>().unwrap(), ListKind::Service);
    assert_eq!("Supplier".parse::<ListKind>().unwrap(), ListKind::Supplier);
    assert_eq!("guides".parse::<ListKind>().unwrap(), ListKind::Guide);
    assert!("hotels".parse::<ListKind>().is_err());
  }

  #[test]
  fn test_next_id_is_unique_within_a_millisecond() {
    let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
    let mut state = AppState::default();
    assert_eq!(state.next_id(now), 1_700_000_000_000);

    state.vouchers.push(crate::model::tests_support::voucher(1_700_000_000_000, 8000));
    assert_eq!(state.next_id(now), 1_700_000_000_001);
  }

  #[test]
  fn test_older_record_fills_missing_fields() {
    let raw = r#"{
      "vouchers": [{
        "id": 1700000000000, "voucherNumber": 8003, "to": "Hotel Hilton",
        "serviceType": "City Tour", "dateOfService": "2024-03-15",
        "numberOfTravelers": 2, "createdAt": "2023-11-14T22:13:20.000Z"
      }],
      "services": ["City Tour"],
      "suppliers": null,
      "nextVoucherNumber": 8004
    }"#;
    let state: AppState = serde_json::from_str(raw).unwrap();

    assert_eq!(state.vouchers.len(), 1);
    assert_eq!(state.vouchers[0].voucher_number, 8003);
    assert_eq!(state.vouchers[0].tour_number, "");
    assert_eq!(state.services, vec!["City Tour"]);
    assert_eq!(state.suppliers, AppState::default().suppliers);
    assert!(state.guides.is_empty());
    assert_eq!(state.next_voucher_number, 8004);

    let empty: AppState = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, AppState::default());
  }

  #[test]
  fn test_session_state_camel_case() {
    let session = SessionState {
      last_view: ViewMode::Preview,
      last_active_voucher_id: Some(42),
    };
    let json = serde_json::to_string(&session).unwrap();
    assert_eq!(json, r#"{"lastView":"preview","lastActiveVoucherId":42}"#);
  }
}
