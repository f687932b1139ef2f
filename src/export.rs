//! CSV export of the voucher list.

use chrono::{NaiveDate, SecondsFormat};
use color_eyre::{eyre::eyre, Result};

use crate::model::Voucher;

/// Byte order mark so spreadsheet apps detect UTF-8 (Hebrew names)
const BOM: &str = "\u{FEFF}";

const HEADERS: [&str; 8] = [
  "Voucher Number",
  "To",
  "Service Type",
  "Date of Service",
  "Tour Number",
  "Travelers",
  "Guide Name",
  "Created At",
];

/// Encode vouchers as CSV in the given order. `None` when there is nothing
/// to export.
pub fn to_csv<'a>(vouchers: impl IntoIterator<Item = &'a Voucher>) -> Result<Option<String>> {
  let mut writer = csv::WriterBuilder::new()
    .terminator(csv::Terminator::Any(b'\n'))
    .from_writer(Vec::new());

  writer
    .write_record(HEADERS)
    .map_err(|e| eyre!("Failed to write CSV header: {}", e))?;

  let mut rows = 0usize;
  for v in vouchers {
    writer
      .write_record([
        v.voucher_number.to_string(),
        v.to.clone(),
        v.service_type.clone(),
        v.date_of_service.clone(),
        v.tour_number.clone(),
        v.number_of_travelers.to_string(),
        v.guide_name.clone(),
        v.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
      ])
      .map_err(|e| eyre!("Failed to write CSV row for #{}: {}", v.voucher_number, e))?;
    rows += 1;
  }

  if rows == 0 {
    return Ok(None);
  }

  let bytes = writer
    .into_inner()
    .map_err(|e| eyre!("Failed to finish CSV: {}", e))?;
  let body = String::from_utf8(bytes).map_err(|e| eyre!("CSV is not valid UTF-8: {}", e))?;
  Ok(Some(format!("{}{}", BOM, body)))
}

/// Default file name for an export made on `date`
pub fn default_file_name(date: NaiveDate) -> String {
  format!("vouchers_export_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::tests_support::voucher;

  #[test]
  fn test_quotes_and_bom() {
    let plain = voucher(1_700_000_000_000, 8000);
    let mut tricky = voucher(1_700_000_000_001, 8001);
    tricky.to = "Hotel \"Royal\", Haifa".to_string();

    let csv = to_csv([&plain, &tricky]).unwrap().unwrap();
    assert!(csv.starts_with('\u{FEFF}'));

    let lines: Vec<&str> = csv.trim_start_matches('\u{FEFF}').lines().collect();
    assert_eq!(
      lines[0],
      "Voucher Number,To,Service Type,Date of Service,Tour Number,Travelers,Guide Name,Created At"
    );
    assert_eq!(
      lines[1],
      "8000,Hotel Hilton,City Tour,2024-03-15,T-100,4,Dana,2023-11-14T22:13:20.000Z"
    );
    assert!(lines[2].starts_with("8001,\"Hotel \"\"Royal\"\", Haifa\",City Tour,"));
    assert_eq!(lines.len(), 3);
  }

  #[test]
  fn test_newline_is_quoted() {
    let mut v = voucher(1, 8000);
    v.guide_name = "Dana\nLevi".to_string();
    let csv = to_csv([&v]).unwrap().unwrap();
    assert!(csv.contains(",\"Dana\nLevi\","));
  }

  #[test]
  fn test_empty_export() {
    let none: Vec<Voucher> = Vec::new();
    assert_eq!(to_csv(&none).unwrap(), None);
  }

  #[test]
  fn test_default_file_name() {
    let date = NaiveDate::from_ymd_opt(2024, 7, 3).unwrap();
    assert_eq!(default_file_name(date), "vouchers_export_2024-07-03.csv");
  }
}
