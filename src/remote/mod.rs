//! Remote store client and the storage-side row types.

mod api_types;
mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use api_types::{assemble_state, StoredVoucher};
#[cfg(test)]
pub use api_types::ListRow;
pub use client::{RemoteStore, SupabaseClient};
