//! Hash-diff synchronization between the local store and the block service.
//!
//! One pass diffs the durable hash cache against the server's current
//! fingerprints and fetches only blocks whose hash changed. When nothing
//! changed the pass costs a single round trip. The store is a pure cache of
//! server truth: a stale block is replaced wholesale, never merged.

use crate::api_client::ApiClient;
use crate::error::ClientResult;
use blocksync_store::BlockStore;
use blocksync_types::{Block, SyncSummary};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Runs sync passes against one local store.
pub struct SyncCoordinator {
    api: Arc<ApiClient>,
    store: BlockStore,
    /// Serializes overlapping passes. Two triggers firing together (manual
    /// refresh plus background refresh) would otherwise race their
    /// read-modify-write of the hash cache.
    pass_lock: Arc<Mutex<()>>,
}

impl SyncCoordinator {
    pub fn new(api: Arc<ApiClient>, store: BlockStore) -> Self {
        Self {
            api,
            store,
            pass_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn store(&self) -> &BlockStore {
        &self.store
    }

    /// Performs one sync pass and returns the full post-sync block
    /// collection plus a summary of what the pass did.
    ///
    /// A pass is atomic with respect to the store: any network or decode
    /// failure aborts it with blocks and hash cache untouched, and the
    /// caller may simply retry the whole call.
    pub async fn synchronize(&self) -> ClientResult<(Vec<Block>, SyncSummary)> {
        let _pass = self.pass_lock.lock().await;

        let stored = self.store.load_hashes()?;
        let is_initial_sync = stored.is_empty();

        let server: HashMap<String, String> = self
            .api
            .get_block_hashes()
            .await?
            .into_iter()
            .map(|h| (h.luid, h.hash))
            .collect();

        let stale = stale_luids(&stored, &server);

        let summary = SyncSummary {
            total_count: server.len(),
            updated_count: stale.len(),
            is_initial_sync,
        };

        if stale.is_empty() {
            debug!(total = server.len(), "all hashes match, skipping payload fetch");
            return Ok((self.store.get_all_blocks()?, summary));
        }

        // When every known block is stale (true first sync, or a server-side
        // cache bust) a plain fetch-all beats shipping the full luid list.
        let fetched = if stale.len() == server.len() {
            info!(count = stale.len(), "fetching all blocks");
            self.api.get_all_blocks().await?
        } else {
            info!(
                stale = stale.len(),
                total = server.len(),
                "fetching stale blocks"
            );
            self.api.get_blocks_by_luids(&stale).await?
        };

        // Persist the full server hash map, not just the stale subset, so
        // the cache mirrors the server's last-observed state.
        self.store.apply_sync(&fetched, &server)?;

        Ok((self.store.get_all_blocks()?, summary))
    }
}

/// Luids the server knows but we have no (or a different) hash for.
/// Luids only we know are left alone — absence from the server's list does
/// not imply deletion.
fn stale_luids(
    stored: &HashMap<String, String>,
    server: &HashMap<String, String>,
) -> Vec<String> {
    server
        .iter()
        .filter(|(luid, hash)| stored.get(*luid) != Some(*hash))
        .map(|(luid, _)| luid.clone())
        .collect()
}
