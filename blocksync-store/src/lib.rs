//! SQLite storage layer for blocksync.
//!
//! Holds the last-synced set of blocks plus the durable hash cache the sync
//! coordinator diffs against. Blocks are upserted keyed by `luid` with
//! full-row replacement; the hash cache is only ever replaced in full, so it
//! always mirrors the server's last-observed state.

mod block_store;
mod error;

pub use block_store::BlockStore;
pub use error::{StorageError, StorageResult};
