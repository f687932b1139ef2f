//! State transitions shared by the local cache writer and the in-memory state.
//!
//! Both sides of a write-through must end up with the same state, so every
//! mutation is expressed as a [`Change`] and applied through [`AppState::apply`].

use super::types::{AppState, ListAction, ListKind, Voucher};

/// A single mutation of the application state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
  /// Replace the voucher with the same id, or prepend it
  UpsertVoucher(Voucher),
  DeleteVoucher(i64),
  List {
    kind: ListKind,
    name: String,
    action: ListAction,
  },
  /// Overwrite the voucher counter
  NextVoucherNumber(u32),
}

impl AppState {
  pub fn apply(&mut self, change: &Change) {
    match change {
      Change::UpsertVoucher(voucher) => upsert_voucher(&mut self.vouchers, voucher),
      Change::DeleteVoucher(id) => self.vouchers.retain(|v| v.id != *id),
      Change::List { kind, name, action } => {
        apply_list_action(self.list_mut(*kind), name, action);
      }
      Change::NextVoucherNumber(value) => self.next_voucher_number = *value,
    }
  }

  /// Apply a change to a copy of the state
  pub fn with(&self, change: &Change) -> Self {
    let mut next = self.clone();
    next.apply(change);
    next
  }
}

fn upsert_voucher(vouchers: &mut Vec<Voucher>, voucher: &Voucher) {
  match vouchers.iter_mut().find(|v| v.id == voucher.id) {
    Some(existing) => *existing = voucher.clone(),
    None => vouchers.insert(0, voucher.clone()),
  }
}

/// Apply a list edit, keeping the list sorted and free of duplicates.
/// Returns whether the list changed.
pub fn apply_list_action(list: &mut Vec<String>, name: &str, action: &ListAction) -> bool {
  let changed = match action {
    ListAction::Add => {
      if list.iter().any(|item| item == name) {
        false
      } else {
        list.push(name.to_string());
        true
      }
    }
    ListAction::Delete => {
      let before = list.len();
      list.retain(|item| item != name);
      list.len() != before
    }
    ListAction::Rename { from } => match list.iter_mut().find(|item| item.as_str() == from) {
      Some(item) if item.as_str() != name => {
        *item = name.to_string();
        true
      }
      _ => false,
    },
  };

  if changed {
    list.sort();
    list.dedup();
  }
  changed
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::tests_support::voucher;

  fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_add_is_idempotent() {
    let mut list = names(&["Alpha", "Charlie"]);
    assert!(apply_list_action(&mut list, "Bravo", &ListAction::Add));
    assert_eq!(list, names(&["Alpha", "Bravo", "Charlie"]));

    let snapshot = list.clone();
    assert!(!apply_list_action(&mut list, "Bravo", &ListAction::Add));
    assert_eq!(list, snapshot);
  }

  #[test]
  fn test_add_is_case_sensitive() {
    let mut list = names(&["bravo"]);
    assert!(apply_list_action(&mut list, "Bravo", &ListAction::Add));
    assert_eq!(list, names(&["Bravo", "bravo"]));
  }

  #[test]
  fn test_delete_exact_match_only() {
    let mut list = names(&["City Tour", "City Tours"]);
    assert!(apply_list_action(&mut list, "City Tour", &ListAction::Delete));
    assert_eq!(list, names(&["City Tours"]));
    assert!(!apply_list_action(&mut list, "city tours", &ListAction::Delete));
  }

  #[test]
  fn test_rename_resorts() {
    let mut list = names(&["Alpha", "Bravo", "Charlie"]);
    let action = ListAction::Rename {
      from: "Alpha".to_string(),
    };
    assert!(apply_list_action(&mut list, "Delta", &action));
    assert_eq!(list, names(&["Bravo", "Charlie", "Delta"]));
  }

  #[test]
  fn test_rename_missing_is_noop() {
    let mut list = names(&["Alpha"]);
    let action = ListAction::Rename {
      from: "Zulu".to_string(),
    };
    assert!(!apply_list_action(&mut list, "Yankee", &action));
    assert_eq!(list, names(&["Alpha"]));
  }

  #[test]
  fn test_rename_onto_existing_name_keeps_one() {
    let mut list = names(&["Alpha", "Bravo"]);
    let action = ListAction::Rename {
      from: "Alpha".to_string(),
    };
    assert!(apply_list_action(&mut list, "Bravo", &action));
    assert_eq!(list, names(&["Bravo"]));
  }

  #[test]
  fn test_upsert_prepends_new_and_replaces_existing() {
    let mut state = AppState::default();
    state.apply(&Change::UpsertVoucher(voucher(1, 8000)));
    state.apply(&Change::UpsertVoucher(voucher(2, 8001)));
    assert_eq!(state.vouchers[0].id, 2);

    let mut edited = voucher(1, 8000);
    edited.to = "Edited".to_string();
    state.apply(&Change::UpsertVoucher(edited));
    assert_eq!(state.vouchers.len(), 2);
    assert_eq!(state.vouchers[1].to, "Edited");
  }

  #[test]
  fn test_delete_leaves_counter_alone() {
    let mut state = AppState::default();
    state.apply(&Change::UpsertVoucher(voucher(1_700_000_000_000, 8000)));
    state.apply(&Change::NextVoucherNumber(8001));
    state.apply(&Change::DeleteVoucher(1_700_000_000_000));
    assert!(state.vouchers.is_empty());
    assert_eq!(state.next_voucher_number, 8001);
  }
}
