//! Wire types for browser storage-state snapshots.
//!
//! A snapshot is the JSON document written by `pw-state save` and consumed by
//! `pw-state restore`. The format is compatible with Playwright's
//! `storageState` files, so snapshots can be exchanged with other tooling.

pub mod storage_state;

pub use storage_state::{Cookie, LocalStorageEntry, OriginState, StorageState};
