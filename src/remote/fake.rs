//! Scripted in-memory remote store for tests.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use std::sync::{Arc, Mutex};

use crate::model::ListKind;

use super::api_types::{ListRow, StoredVoucher};
use super::client::RemoteStore;

#[derive(Debug, Default, Clone)]
pub struct FakeTables {
  pub vouchers: Vec<StoredVoucher>,
  pub lists: Vec<ListRow>,
  pub counter: Option<u32>,
}

/// Remote double with per-operation failure switches and a call log
#[derive(Default)]
pub struct FakeRemote {
  pub tables: Mutex<FakeTables>,
  pub calls: Arc<Mutex<Vec<String>>>,
  pub fail_vouchers: bool,
  pub fail_lists: bool,
  pub fail_counter: bool,
  pub fail_writes: bool,
}

impl FakeRemote {
  pub fn with_tables(tables: FakeTables) -> Self {
    Self {
      tables: Mutex::new(tables),
      ..Default::default()
    }
  }

  /// Every fetch and write fails
  pub fn offline() -> Self {
    Self {
      fail_vouchers: true,
      fail_lists: true,
      fail_counter: true,
      fail_writes: true,
      ..Default::default()
    }
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Shared handle on the call log, for doubles that interleave their own entries
  pub fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
    self.calls.clone()
  }

  pub fn tables(&self) -> FakeTables {
    self.tables.lock().unwrap().clone()
  }

  fn record(&self, call: String) {
    self.calls.lock().unwrap().push(call);
  }

  fn write<F: FnOnce(&mut FakeTables)>(&self, call: String, f: F) -> Result<()> {
    self.record(call);
    if self.fail_writes {
      return Err(eyre!("connection refused"));
    }
    let mut tables = self.tables.lock().unwrap();
    f(&mut *tables);
    Ok(())
  }
}

#[async_trait]
impl RemoteStore for FakeRemote {
  async fn fetch_vouchers(&self) -> Result<Vec<StoredVoucher>> {
    self.record("fetch_vouchers".to_string());
    if self.fail_vouchers {
      return Err(eyre!("HTTP 500"));
    }
    let mut rows = self.tables.lock().unwrap().vouchers.clone();
    rows.sort_by(|a, b| b.vouchernumber.cmp(&a.vouchernumber));
    Ok(rows)
  }

  async fn fetch_list_rows(&self) -> Result<Vec<ListRow>> {
    self.record("fetch_list_rows".to_string());
    if self.fail_lists {
      return Err(eyre!("HTTP 500"));
    }
    Ok(self.tables.lock().unwrap().lists.clone())
  }

  async fn fetch_next_voucher_number(&self) -> Result<Option<u32>> {
    self.record("fetch_next_voucher_number".to_string());
    if self.fail_counter {
      return Err(eyre!("HTTP 500"));
    }
    Ok(self.tables.lock().unwrap().counter)
  }

  async fn upsert_voucher(&self, voucher: &StoredVoucher) -> Result<()> {
    self.write(format!("upsert_voucher:{}", voucher.id), |t| {
      t.vouchers.retain(|v| v.id != voucher.id);
      t.vouchers.push(voucher.clone());
    })
  }

  async fn delete_voucher(&self, id: i64) -> Result<()> {
    self.write(format!("delete_voucher:{}", id), |t| {
      t.vouchers.retain(|v| v.id != id)
    })
  }

  async fn insert_list_item(&self, kind: ListKind, name: &str) -> Result<()> {
    self.write(format!("insert_list_item:{}:{}", kind, name), |t| {
      let row = ListRow::new(kind, name);
      if !t.lists.contains(&row) {
        t.lists.push(row);
      }
    })
  }

  async fn delete_list_item(&self, kind: ListKind, name: &str) -> Result<()> {
    self.write(format!("delete_list_item:{}:{}", kind, name), |t| {
      t.lists.retain(|r| r != &ListRow::new(kind, name))
    })
  }

  async fn rename_list_item(&self, kind: ListKind, old_name: &str, new_name: &str) -> Result<()> {
    self.write(
      format!("rename_list_item:{}:{}:{}", kind, old_name, new_name),
      |t| {
        for row in t.lists.iter_mut() {
          if row.kind == kind.tag() && row.name == old_name {
            row.name = new_name.to_string();
          }
        }
      },
    )
  }

  async fn set_next_voucher_number(&self, value: u32) -> Result<()> {
    self.write(format!("set_next_voucher_number:{}", value), |t| {
      t.counter = Some(value)
    })
  }
}
