//! Block store — last-synced blocks plus the durable hash cache.

use crate::error::StorageResult;
use blocksync_types::{Block, BlockEntity};
use chrono::DateTime;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS blocks (
    luid                TEXT PRIMARY KEY,
    slug                TEXT NOT NULL,
    kind                TEXT NOT NULL,
    pinned              INTEGER NOT NULL DEFAULT 0,
    created_timestamp   INTEGER,
    last_edited         INTEGER,
    entities            TEXT,
    text                TEXT
);

CREATE TABLE IF NOT EXISTS block_hashes (
    luid                TEXT PRIMARY KEY,
    hash                TEXT NOT NULL
);
"#;

/// Local store for synced blocks, backed by SQLite.
///
/// Upserts are keyed by `luid` and replace the full row, so optional fields
/// absent in a re-fetched block are cleared rather than merged.
#[derive(Clone)]
pub struct BlockStore {
    conn: Arc<Mutex<Connection>>,
}

impl BlockStore {
    /// Opens or creates a block store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory block store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Upserts a batch of blocks in one transaction.
    pub fn save_blocks(&self, blocks: &[Block]) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for block in blocks {
            upsert_block(&tx, block)?;
        }
        tx.commit()?;
        debug!(count = blocks.len(), "saved blocks");
        Ok(())
    }

    /// Returns all stored blocks, most recently edited first.
    pub fn get_all_blocks(&self) -> StorageResult<Vec<Block>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT luid, slug, kind, pinned, created_timestamp, last_edited, entities, text
             FROM blocks ORDER BY last_edited DESC, luid ASC",
        )?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);
        rows.into_iter().map(row_into_block).collect()
    }

    /// Returns a single block by `luid`, or `None` if absent.
    pub fn get_block(&self, luid: &str) -> StorageResult<Option<Block>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT luid, slug, kind, pinned, created_timestamp, last_edited, entities, text
             FROM blocks WHERE luid = ?1",
            params![luid],
            read_row,
        );
        match result {
            Ok(raw) => {
                drop(conn);
                Ok(Some(row_into_block(raw)?))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the durable hash cache. Empty on first run.
    pub fn load_hashes(&self) -> StorageResult<HashMap<String, String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT luid, hash FROM block_hashes")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        rows.collect::<Result<HashMap<_, _>, _>>().map_err(Into::into)
    }

    /// Replaces the durable hash cache in full.
    pub fn replace_hashes(&self, hashes: &HashMap<String, String>) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        replace_hashes_tx(&tx, hashes)?;
        tx.commit()?;
        Ok(())
    }

    /// Applies the result of one sync pass atomically: upserts the fetched
    /// blocks and replaces the hash cache in a single transaction, so a
    /// failure leaves both exactly as they were.
    pub fn apply_sync(
        &self,
        blocks: &[Block],
        hashes: &HashMap<String, String>,
    ) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for block in blocks {
            upsert_block(&tx, block)?;
        }
        replace_hashes_tx(&tx, hashes)?;
        tx.commit()?;
        debug!(
            blocks = blocks.len(),
            hashes = hashes.len(),
            "applied sync pass"
        );
        Ok(())
    }
}

fn upsert_block(conn: &Connection, block: &Block) -> StorageResult<()> {
    let entities_json = block
        .entities
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT OR REPLACE INTO blocks
         (luid, slug, kind, pinned, created_timestamp, last_edited, entities, text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            block.luid,
            block.slug,
            block.kind,
            block.pinned,
            block.created_timestamp.map(|dt| dt.timestamp_millis()),
            block.last_edited.map(|dt| dt.timestamp_millis()),
            entities_json,
            block.text,
        ],
    )?;
    Ok(())
}

fn replace_hashes_tx(conn: &Connection, hashes: &HashMap<String, String>) -> StorageResult<()> {
    conn.execute("DELETE FROM block_hashes", [])?;
    let mut stmt = conn.prepare("INSERT INTO block_hashes (luid, hash) VALUES (?1, ?2)")?;
    for (luid, hash) in hashes {
        stmt.execute(params![luid, hash])?;
    }
    Ok(())
}

/// Raw row as stored; entity JSON is decoded outside the rusqlite closure.
struct RawBlockRow {
    luid: String,
    slug: String,
    kind: String,
    pinned: bool,
    created_timestamp: Option<i64>,
    last_edited: Option<i64>,
    entities: Option<String>,
    text: Option<String>,
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawBlockRow> {
    Ok(RawBlockRow {
        luid: row.get(0)?,
        slug: row.get(1)?,
        kind: row.get(2)?,
        pinned: row.get(3)?,
        created_timestamp: row.get(4)?,
        last_edited: row.get(5)?,
        entities: row.get(6)?,
        text: row.get(7)?,
    })
}

fn row_into_block(raw: RawBlockRow) -> StorageResult<Block> {
    let entities: Option<Vec<BlockEntity>> = raw
        .entities
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    Ok(Block {
        luid: raw.luid,
        slug: raw.slug,
        kind: raw.kind,
        pinned: raw.pinned,
        created_timestamp: raw
            .created_timestamp
            .and_then(DateTime::from_timestamp_millis),
        last_edited: raw.last_edited.and_then(DateTime::from_timestamp_millis),
        entities,
        text: raw.text,
    })
}
