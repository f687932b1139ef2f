//! Domain types for vouchers and reference lists.

mod draft;
mod state;
mod types;

#[cfg(test)]
pub use draft::DraftError;
pub use draft::VoucherDraft;
pub use state::Change;
pub use types::{
  AppState, ListAction, ListKind, SessionState, ViewMode, Voucher, INITIAL_VOUCHER_NUMBER,
};
