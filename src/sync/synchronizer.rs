//! State loader and write-through synchronizer.
//!
//! Loading tries the remote store, then the local cache, then seeded
//! defaults; the first source that answers completely wins and nothing is
//! merged across sources. Every mutation goes to the remote first (failures
//! are logged and dropped) and then to the local cache, which always happens.

use color_eyre::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::cache::{LocalCache, SESSION_KEY, STATE_KEY};
use crate::model::{AppState, Change, ListAction, ListKind, SessionState, ViewMode, Voucher};
use crate::remote::{assemble_state, RemoteStore, StoredVoucher};

/// Where a loaded state came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
  /// All remote fetches succeeded
  Remote,
  /// Remote absent or failed, served from the local cache
  Local,
  /// Nothing stored anywhere, seeded defaults
  Defaults,
}

impl StateSource {
  pub fn describe(&self) -> &'static str {
    match self {
      StateSource::Remote => "remote store",
      StateSource::Local => "local cache (offline)",
      StateSource::Defaults => "defaults (nothing stored yet)",
    }
  }
}

/// Result of [`Synchronizer::load_state`]
#[derive(Debug, Clone)]
pub struct Loaded {
  pub state: AppState,
  pub source: StateSource,
}

/// Synchronizes application state between the remote store and the local cache.
pub struct Synchronizer<C: LocalCache> {
  remote: Option<Arc<dyn RemoteStore>>,
  cache: Arc<C>,
}

impl<C: LocalCache> Synchronizer<C> {
  /// `remote` is `None` when no credentials are configured; every remote
  /// step is then skipped exactly as if it had failed.
  pub fn new(remote: Option<Arc<dyn RemoteStore>>, cache: Arc<C>) -> Self {
    if remote.is_none() {
      info!("Remote store not configured, running in local cache mode");
    }
    Self { remote, cache }
  }

  pub fn has_remote(&self) -> bool {
    self.remote.is_some()
  }

  /// Load the authoritative state. Never fails: defaults at worst.
  pub async fn load_state(&self) -> Loaded {
    if let Some(state) = self.load_remote().await {
      info!(
        vouchers = state.vouchers.len(),
        next = state.next_voucher_number,
        "Loaded state from remote store"
      );
      self.write_state(&state);
      return Loaded {
        state,
        source: StateSource::Remote,
      };
    }

    match self.cache.get_record::<AppState>(STATE_KEY) {
      Ok(Some(state)) => {
        info!(vouchers = state.vouchers.len(), "Loaded state from local cache");
        return Loaded {
          state,
          source: StateSource::Local,
        };
      }
      Ok(None) => {}
      Err(e) => warn!("Ignoring unreadable local state: {}", e),
    }

    info!("No stored state, starting from defaults");
    Loaded {
      state: AppState::default(),
      source: StateSource::Defaults,
    }
  }

  /// All three fetches or nothing
  async fn load_remote(&self) -> Option<AppState> {
    let remote = self.remote.as_ref()?;

    let (vouchers, rows, counter) = futures::join!(
      remote.fetch_vouchers(),
      remote.fetch_list_rows(),
      remote.fetch_next_voucher_number(),
    );

    match (vouchers, rows, counter) {
      (Ok(vouchers), Ok(rows), Ok(counter)) => Some(assemble_state(vouchers, rows, counter)),
      (vouchers, rows, counter) => {
        let errors = [vouchers.err(), rows.err(), counter.err()];
        for e in errors.iter().flatten() {
          warn!("Remote load failed: {}", e);
        }
        None
      }
    }
  }

  /// Upsert a voucher: replaced if the id exists, prepended otherwise.
  pub async fn save_voucher(&self, voucher: &Voucher, current: &AppState) {
    if let Some(remote) = &self.remote {
      let row = StoredVoucher::from(voucher);
      log_remote_failure("save voucher", remote.upsert_voucher(&row).await);
    }
    self.persist(&Change::UpsertVoucher(voucher.clone()), current);
  }

  pub async fn delete_voucher(&self, id: i64, current: &AppState) {
    if let Some(remote) = &self.remote {
      log_remote_failure("delete voucher", remote.delete_voucher(id).await);
    }
    self.persist(&Change::DeleteVoucher(id), current);
  }

  /// Add, delete or rename one entry of a reference list.
  pub async fn update_list_item(
    &self,
    kind: ListKind,
    name: &str,
    action: &ListAction,
    current: &AppState,
  ) {
    if let Some(remote) = &self.remote {
      let result = match action {
        ListAction::Add => remote.insert_list_item(kind, name).await,
        ListAction::Delete => remote.delete_list_item(kind, name).await,
        ListAction::Rename { from } => remote.rename_list_item(kind, from, name).await,
      };
      log_remote_failure("update list", result);
    }
    self.persist(
      &Change::List {
        kind,
        name: name.to_string(),
        action: action.clone(),
      },
      current,
    );
  }

  pub async fn update_next_voucher_number(&self, value: u32, current: &AppState) {
    if let Some(remote) = &self.remote {
      log_remote_failure(
        "update voucher counter",
        remote.set_next_voucher_number(value).await,
      );
    }
    self.persist(&Change::NextVoucherNumber(value), current);
  }

  /// Remember the active screen and voucher. Local only.
  pub fn save_session_state(&self, view: ViewMode, active_id: Option<i64>) {
    let session = SessionState {
      last_view: view,
      last_active_voucher_id: active_id,
    };
    if let Err(e) = self.cache.put_record(SESSION_KEY, &session) {
      warn!("Failed to save session: {}", e);
    }
  }

  /// Last saved session; a malformed record counts as absent.
  pub fn load_session_state(&self) -> Option<SessionState> {
    match self.cache.get_record(SESSION_KEY) {
      Ok(session) => session,
      Err(e) => {
        warn!("Dropping unreadable session: {}", e);
        if let Err(e) = self.cache.remove(SESSION_KEY) {
          warn!("Failed to clear session: {}", e);
        }
        None
      }
    }
  }

  /// Read-modify-write of the cached state record.
  ///
  /// The cached record is the base when it is readable, so several
  /// write-throughs issued against the same `current` snapshot accumulate
  /// instead of overwriting each other.
  fn persist(&self, change: &Change, current: &AppState) {
    let base = match self.cache.get_record::<AppState>(STATE_KEY) {
      Ok(Some(cached)) => cached,
      Ok(None) => current.clone(),
      Err(e) => {
        warn!("Rebuilding unreadable local state: {}", e);
        current.clone()
      }
    };
    self.write_state(&base.with(change));
  }

  fn write_state(&self, state: &AppState) {
    if let Err(e) = self.cache.put_record(STATE_KEY, state) {
      warn!("Failed to write local state: {}", e);
    }
  }
}

fn log_remote_failure(what: &str, result: Result<()>) {
  if let Err(e) = result {
    warn!("Remote {} failed, kept locally: {}", what, e);
  }
}
