use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use tracing::info;

use crate::cache::LocalCache;
use crate::model::{
  AppState, Change, ListAction, ListKind, SessionState, ViewMode, Voucher, VoucherDraft,
};
use crate::sync::{StateSource, Synchronizer};

/// Main application state.
///
/// Owns the in-memory copy of the state. Every intent first writes through
/// the synchronizer and then applies the same [`Change`] here, so the
/// in-memory copy and the cache go through one update pathway.
pub struct App<C: LocalCache> {
  sync: Synchronizer<C>,
  state: AppState,
  source: StateSource,
  session: SessionState,
}

impl<C: LocalCache> App<C> {
  /// Load state and the last session
  pub async fn start(sync: Synchronizer<C>) -> Self {
    let loaded = sync.load_state().await;
    let session = sync.load_session_state().unwrap_or_default();

    Self {
      sync,
      state: loaded.state,
      source: loaded.source,
      session,
    }
  }

  pub fn state(&self) -> &AppState {
    &self.state
  }

  pub fn source(&self) -> StateSource {
    self.source
  }

  pub fn session(&self) -> &SessionState {
    &self.session
  }

  pub fn has_remote(&self) -> bool {
    self.sync.has_remote()
  }

  /// Voucher referenced by the session, if it still exists
  pub fn active_voucher(&self) -> Option<&Voucher> {
    self
      .session
      .last_active_voucher_id
      .and_then(|id| self.state.find(id))
  }

  pub fn voucher_by_number(&self, number: u32) -> Result<&Voucher> {
    self
      .state
      .find_by_number(number)
      .ok_or_else(|| eyre!("Voucher #{} not found", number))
  }

  /// Reload from the sources, e.g. after the remote came back
  pub async fn reload(&mut self) -> StateSource {
    let loaded = self.sync.load_state().await;
    self.state = loaded.state;
    self.source = loaded.source;
    self.source
  }

  /// Submit a voucher form. `editing` is the id of the voucher being edited.
  ///
  /// Validation happens before anything is written. New supplier or
  /// service values are added to their lists along with the voucher.
  pub async fn submit(&mut self, draft: VoucherDraft, editing: Option<i64>) -> Result<Voucher> {
    let draft = draft.validate()?;
    let novelty = draft.novelty(&self.state);

    let existing = match editing {
      Some(id) => Some(
        self
          .state
          .find(id)
          .cloned()
          .ok_or_else(|| eyre!("Voucher {} not found", id))?,
      ),
      None => None,
    };

    let voucher = match &existing {
      Some(existing) => draft.apply_to(existing),
      None => {
        let now = Utc::now();
        let id = self.state.next_id(now);
        draft.into_voucher(id, self.state.next_voucher_number, now)
      }
    };

    self.sync.save_voucher(&voucher, &self.state).await;
    self.state.apply(&Change::UpsertVoucher(voucher.clone()));

    if novelty.is_new_service {
      self
        .list_action(ListKind::Service, &voucher.service_type, ListAction::Add)
        .await?;
    }
    if novelty.is_new_supplier {
      self
        .list_action(ListKind::Supplier, &voucher.to, ListAction::Add)
        .await?;
    }
    if existing.is_none() {
      self.advance_counter().await;
    }

    info!(
      number = voucher.voucher_number,
      edited = existing.is_some(),
      "Voucher saved"
    );
    self.set_view(ViewMode::Preview, Some(voucher.id));
    Ok(voucher)
  }

  /// Copy a voucher under a fresh identity and the next voucher number
  pub async fn duplicate(&mut self, id: i64) -> Result<Voucher> {
    let source = self
      .state
      .find(id)
      .cloned()
      .ok_or_else(|| eyre!("Voucher {} not found", id))?;

    let now = Utc::now();
    let copy = Voucher {
      id: self.state.next_id(now),
      voucher_number: self.state.next_voucher_number,
      created_at: now,
      ..source
    };

    self.sync.save_voucher(&copy, &self.state).await;
    self.state.apply(&Change::UpsertVoucher(copy.clone()));
    self.advance_counter().await;

    info!(
      from = source.voucher_number,
      number = copy.voucher_number,
      "Voucher duplicated"
    );
    self.set_view(ViewMode::Edit, Some(copy.id));
    Ok(copy)
  }

  pub async fn delete(&mut self, id: i64) -> Result<Voucher> {
    let removed = self
      .state
      .find(id)
      .cloned()
      .ok_or_else(|| eyre!("Voucher {} not found", id))?;

    self.sync.delete_voucher(id, &self.state).await;
    self.state.apply(&Change::DeleteVoucher(id));

    info!(number = removed.voucher_number, "Voucher deleted");
    if self.session.last_active_voucher_id == Some(id) {
      self.set_view(ViewMode::Dashboard, None);
    }
    Ok(removed)
  }

  /// Add, delete or rename a reference list entry.
  /// Returns whether the list changed.
  pub async fn list_action(&mut self, kind: ListKind, name: &str, action: ListAction) -> Result<bool> {
    let name = name.trim();
    if name.is_empty() {
      return Err(eyre!("List entry name cannot be empty"));
    }

    let before = self.state.list(kind).to_vec();
    self
      .sync
      .update_list_item(kind, name, &action, &self.state)
      .await;
    self.state.apply(&Change::List {
      kind,
      name: name.to_string(),
      action,
    });
    Ok(self.state.list(kind) != before.as_slice())
  }

  /// Consume one voucher number
  async fn advance_counter(&mut self) {
    let next = self.state.next_voucher_number + 1;
    self
      .sync
      .update_next_voucher_number(next, &self.state)
      .await;
    self.state.apply(&Change::NextVoucherNumber(next));
  }

  /// Record the active screen so the next start resumes there
  pub fn set_view(&mut self, view: ViewMode, active: Option<i64>) {
    self.session = SessionState {
      last_view: view,
      last_active_voucher_id: active,
    };
    self.sync.save_session_state(view, active);
  }
}
