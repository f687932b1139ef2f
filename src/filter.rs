//! Dashboard filtering and sorting of the voucher collection.

use chrono::NaiveDate;
use std::cmp::Ordering;

use crate::model::Voucher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
  VoucherNumber,
  #[default]
  DateOfService,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

/// Filters applied to the voucher list; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct VoucherFilter {
  /// Inclusive lower bound on the date of service
  pub from: Option<NaiveDate>,
  /// Inclusive upper bound on the date of service
  pub to: Option<NaiveDate>,
  /// Exact service type
  pub service: Option<String>,
  /// Case-insensitive substring of the guide name
  pub guide: Option<String>,
  pub sort_by: SortField,
  pub order: SortOrder,
}

impl VoucherFilter {
  pub fn matches(&self, v: &Voucher) -> bool {
    let date = parse_date(&v.date_of_service);
    if let Some(from) = self.from {
      if !date.is_some_and(|d| d >= from) {
        return false;
      }
    }
    if let Some(to) = self.to {
      if !date.is_some_and(|d| d <= to) {
        return false;
      }
    }
    if let Some(service) = self.service.as_deref().filter(|s| !s.is_empty()) {
      if v.service_type != service {
        return false;
      }
    }
    if let Some(guide) = self.guide.as_deref().filter(|g| !g.is_empty()) {
      if !v.guide_name.to_lowercase().contains(&guide.to_lowercase()) {
        return false;
      }
    }
    true
  }

  /// Matching vouchers in the requested order
  pub fn apply<'a>(&self, vouchers: impl IntoIterator<Item = &'a Voucher>) -> Vec<&'a Voucher> {
    let mut result: Vec<&Voucher> = vouchers.into_iter().filter(|v| self.matches(v)).collect();

    result.sort_by(|a, b| {
      let ordering = match self.sort_by {
        SortField::VoucherNumber => a.voucher_number.cmp(&b.voucher_number),
        SortField::DateOfService => compare_dates(&a.date_of_service, &b.date_of_service),
      };
      match self.order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
      }
    });
    result
  }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Unparseable dates sort before every real date
fn compare_dates(a: &str, b: &str) -> Ordering {
  parse_date(a).cmp(&parse_date(b))
}

/// Distinct service types in use, sorted
pub fn unique_services(vouchers: &[Voucher]) -> Vec<String> {
  let mut services: Vec<String> = vouchers.iter().map(|v| v.service_type.clone()).collect();
  services.sort();
  services.dedup();
  services
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::tests_support::voucher;

  fn sample() -> Vec<Voucher> {
    let mut a = voucher(1, 8000);
    a.date_of_service = "2024-01-10".to_string();
    a.guide_name = "Dana Levi".to_string();

    let mut b = voucher(2, 8001);
    b.date_of_service = "2024-03-01".to_string();
    b.service_type = "Night Tour".to_string();
    b.guide_name = "Avi".to_string();

    let mut c = voucher(3, 8002);
    c.date_of_service = "2024-02-15".to_string();
    c.guide_name = "dana cohen".to_string();

    vec![a, b, c]
  }

  fn numbers(vs: &[&Voucher]) -> Vec<u32> {
    vs.iter().map(|v| v.voucher_number).collect()
  }

  #[test]
  fn test_default_sorts_by_date_desc() {
    let vs = sample();
    let result = VoucherFilter::default().apply(&vs);
    assert_eq!(numbers(&result), vec![8001, 8002, 8000]);
  }

  #[test]
  fn test_sort_by_number_asc() {
    let vs = sample();
    let filter = VoucherFilter {
      sort_by: SortField::VoucherNumber,
      order: SortOrder::Asc,
      ..Default::default()
    };
    assert_eq!(numbers(&filter.apply(&vs)), vec![8000, 8001, 8002]);
  }

  #[test]
  fn test_date_range_is_inclusive() {
    let vs = sample();
    let filter = VoucherFilter {
      from: NaiveDate::from_ymd_opt(2024, 1, 10),
      to: NaiveDate::from_ymd_opt(2024, 2, 15),
      ..Default::default()
    };
    assert_eq!(numbers(&filter.apply(&vs)), vec![8002, 8000]);
  }

  #[test]
  fn test_service_exact_and_guide_substring() {
    let vs = sample();
    let filter = VoucherFilter {
      service: Some("City Tour".to_string()),
      guide: Some("DANA".to_string()),
      ..Default::default()
    };
    assert_eq!(numbers(&filter.apply(&vs)), vec![8002, 8000]);

    let filter = VoucherFilter {
      service: Some("City".to_string()),
      ..Default::default()
    };
    assert!(filter.apply(&vs).is_empty());
  }

  #[test]
  fn test_unique_services() {
    assert_eq!(unique_services(&sample()), vec!["City Tour", "Night Tour"]);
  }
}
