use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

use super::types::{AppState, ListKind, Voucher};

/// Voucher fields as entered by the user, before identity is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherDraft {
  pub to: String,
  pub service_type: String,
  pub date_of_service: String,
  pub visit_time: Option<String>,
  pub tour_number: String,
  pub number_of_travelers: u32,
  pub service_description: String,
  pub guide_name: String,
}

impl Default for VoucherDraft {
  fn default() -> Self {
    Self {
      to: String::new(),
      service_type: String::new(),
      date_of_service: String::new(),
      visit_time: None,
      tour_number: String::new(),
      number_of_travelers: 1,
      service_description: String::new(),
      guide_name: String::new(),
    }
  }
}

/// Whether a draft introduces values the reference lists don't know yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Novelty {
  pub is_new_service: bool,
  pub is_new_supplier: bool,
}

/// Validation failure on a draft; nothing has been written when this is returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftError {
  MissingSupplier,
  MissingService,
  InvalidDate(String),
  InvalidTime(String),
  NoTravelers,
}

impl fmt::Display for DraftError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DraftError::MissingSupplier => write!(f, "Please select or enter a supplier (TO)"),
      DraftError::MissingService => write!(f, "Please select or enter a service type"),
      DraftError::InvalidDate(d) => write!(f, "Invalid date of service '{}', expected YYYY-MM-DD", d),
      DraftError::InvalidTime(t) => write!(f, "Invalid visit time '{}', expected HH:MM", t),
      DraftError::NoTravelers => write!(f, "Number of travelers must be at least 1"),
    }
  }
}

impl std::error::Error for DraftError {}

impl VoucherDraft {
  /// Build a draft pre-filled from an existing voucher (edit form)
  pub fn from_voucher(v: &Voucher) -> Self {
    Self {
      to: v.to.clone(),
      service_type: v.service_type.clone(),
      date_of_service: v.date_of_service.clone(),
      visit_time: v.visit_time.clone(),
      tour_number: v.tour_number.clone(),
      number_of_travelers: v.number_of_travelers,
      service_description: v.service_description.clone(),
      guide_name: v.guide_name.clone(),
    }
  }

  /// Trim free-text fields and check the required ones.
  pub fn validate(mut self) -> Result<Self, DraftError> {
    self.to = self.to.trim().to_string();
    self.service_type = self.service_type.trim().to_string();
    self.date_of_service = self.date_of_service.trim().to_string();
    self.tour_number = self.tour_number.trim().to_string();
    self.guide_name = self.guide_name.trim().to_string();
    self.visit_time = self
      .visit_time
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty());

    if self.to.is_empty() {
      return Err(DraftError::MissingSupplier);
    }
    if self.service_type.is_empty() {
      return Err(DraftError::MissingService);
    }
    if NaiveDate::parse_from_str(&self.date_of_service, "%Y-%m-%d").is_err() {
      return Err(DraftError::InvalidDate(self.date_of_service));
    }
    if let Some(time) = &self.visit_time {
      if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
        return Err(DraftError::InvalidTime(time.clone()));
      }
    }
    if self.number_of_travelers == 0 {
      return Err(DraftError::NoTravelers);
    }

    Ok(self)
  }

  pub fn novelty(&self, state: &AppState) -> Novelty {
    let unknown = |kind: ListKind, value: &str| !state.list(kind).iter().any(|s| s == value);
    Novelty {
      is_new_service: unknown(ListKind::Service, &self.service_type),
      is_new_supplier: unknown(ListKind::Supplier, &self.to),
    }
  }

  /// Turn the draft into a brand new voucher
  pub fn into_voucher(self, id: i64, voucher_number: u32, created_at: DateTime<Utc>) -> Voucher {
    Voucher {
      id,
      voucher_number,
      to: self.to,
      service_type: self.service_type,
      date_of_service: self.date_of_service,
      visit_time: self.visit_time,
      tour_number: self.tour_number,
      number_of_travelers: self.number_of_travelers,
      service_description: self.service_description,
      guide_name: self.guide_name,
      created_at,
    }
  }

  /// Replace every editable field of `existing`, keeping identity, number
  /// and creation time.
  pub fn apply_to(self, existing: &Voucher) -> Voucher {
    self.into_voucher(existing.id, existing.voucher_number, existing.created_at)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::tests_support::voucher;

  fn draft() -> VoucherDraft {
    VoucherDraft {
      to: "  Hotel Hilton ".to_string(),
      service_type: "City Tour".to_string(),
      date_of_service: "2024-05-01".to_string(),
      ..Default::default()
    }
  }

  #[test]
  fn test_validate_trims() {
    let d = draft().validate().unwrap();
    assert_eq!(d.to, "Hotel Hilton");
    assert_eq!(d.number_of_travelers, 1);
  }

  #[test]
  fn test_validate_rejects_blank_supplier() {
    let d = VoucherDraft {
      to: "   ".to_string(),
      ..draft()
    };
    assert_eq!(d.validate(), Err(DraftError::MissingSupplier));
  }

  #[test]
  fn test_validate_rejects_missing_service() {
    let d = VoucherDraft {
      service_type: String::new(),
      ..draft()
    };
    assert_eq!(d.validate(), Err(DraftError::MissingService));
  }

  #[test]
  fn test_validate_rejects_bad_date_and_time() {
    let d = VoucherDraft {
      date_of_service: "01/05/2024".to_string(),
      ..draft()
    };
    assert!(matches!(d.validate(), Err(DraftError::InvalidDate(_))));

    let d = VoucherDraft {
      visit_time: Some("9am".to_string()),
      ..draft()
    };
    assert!(matches!(d.validate(), Err(DraftError::InvalidTime(_))));

    let d = VoucherDraft {
      visit_time: Some("  ".to_string()),
      ..draft()
    };
    assert_eq!(d.validate().unwrap().visit_time, None);
  }

  #[test]
  fn test_novelty() {
    let state = AppState::default();
    let d = VoucherDraft {
      to: "New Hotel".to_string(),
      ..draft()
    }
    .validate()
    .unwrap();
    assert_eq!(
      d.novelty(&state),
      Novelty {
        is_new_service: false,
        is_new_supplier: true
      }
    );
  }

  #[test]
  fn test_apply_to_preserves_identity() {
    let existing = voucher(1_700_000_000_000, 8003);
    let edited = draft().validate().unwrap().apply_to(&existing);
    assert_eq!(edited.id, existing.id);
    assert_eq!(edited.voucher_number, 8003);
    assert_eq!(edited.created_at, existing.created_at);
    assert_eq!(edited.to, "Hotel Hilton");
  }
}
