//! Terminal tables for the dashboard and the list manager.

use comfy_table::{Attribute, Cell, Color, Table};

use crate::model::{AppState, ListKind, Voucher};

const ACTIVE: Color = Color::Rgb { r: 29, g: 78, b: 216 };

pub fn voucher_table(vouchers: &[&Voucher], active: Option<i64>) -> Table {
  let mut table = Table::new();
  table.set_header(vec![
    Cell::new("#"),
    Cell::new("Date"),
    Cell::new("Time"),
    Cell::new("To"),
    Cell::new("Service"),
    Cell::new("Tour"),
    Cell::new("Pax"),
    Cell::new("Guide"),
  ]);

  for v in vouchers {
    let number = Cell::new(v.voucher_number).add_attribute(Attribute::Bold);
    let number = if active == Some(v.id) {
      number.fg(ACTIVE)
    } else {
      number
    };

    table.add_row(vec![
      number,
      Cell::new(&v.date_of_service),
      Cell::new(v.visit_time.as_deref().unwrap_or("-")),
      Cell::new(&v.to),
      Cell::new(&v.service_type),
      Cell::new(&v.tour_number),
      Cell::new(v.number_of_travelers),
      Cell::new(&v.guide_name),
    ]);
  }
  table
}

/// One column per requested list
pub fn lists_table(state: &AppState, kinds: &[ListKind]) -> Table {
  let mut table = Table::new();
  table.set_header(
    kinds
      .iter()
      .map(|k| Cell::new(format!("{} ({})", k.title(), state.list(*k).len())))
      .collect::<Vec<_>>(),
  );

  let depth = kinds.iter().map(|k| state.list(*k).len()).max().unwrap_or(0);
  for i in 0..depth {
    table.add_row(
      kinds
        .iter()
        .map(|k| Cell::new(state.list(*k).get(i).map(String::as_str).unwrap_or("")))
        .collect::<Vec<_>>(),
    );
  }
  table
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::tests_support::voucher;

  #[test]
  fn test_voucher_table_rows() {
    let a = voucher(1, 8000);
    let mut b = voucher(2, 8001);
    b.visit_time = None;

    let table = voucher_table(&[&b, &a], None);
    let rendered = table.to_string();
    assert_eq!(table.row_iter().count(), 2);
    assert!(rendered.contains("8001"));
    assert!(rendered.contains("Hotel Hilton"));
    assert!(rendered.find("8001") < rendered.find("8000"));
  }

  #[test]
  fn test_lists_table_pads_short_columns() {
    let state = AppState::default();
    let table = lists_table(&state, &ListKind::ALL);
    assert_eq!(table.row_iter().count(), state.services.len());
    assert!(table.to_string().contains("Guides (0)"));
  }
}
