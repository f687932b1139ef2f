//! Local cache: durable key-value persistence on the device.
//!
//! Holds two independent records:
//! - the full application state, used as offline fallback
//! - the session record, so a restart resumes where the user left off

mod storage;

pub use storage::{LocalCache, SqliteCache, SESSION_KEY, STATE_KEY};
