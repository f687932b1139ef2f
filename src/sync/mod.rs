//! Offline-first state loading and write-through persistence.

mod synchronizer;

pub use synchronizer::{StateSource, Synchronizer};
