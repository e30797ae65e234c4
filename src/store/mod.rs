use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use backoff::Backoff;
use entry::Batch;
use error::StoreError;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::Connection;
use tracing::{debug, trace, warn};

pub mod backoff;
pub mod entry;
pub mod error;

const INIT_SQL: &str = "BEGIN EXCLUSIVE;
    CREATE TABLE IF NOT EXISTS stacks (
        stack TEXT PRIMARY KEY,
        entry TEXT NOT NULL
    );";

const APPEND_SQL: &str = "INSERT INTO stacks (stack, entry) VALUES (?1, ?2)
    ON CONFLICT(stack) DO UPDATE SET entry = entry || excluded.entry";

/// How long to keep retrying an open while another process holds the store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LockWait {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// None waits forever
    pub max_wait_ms: Option<u64>,
}

impl Default for LockWait {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 5,
            max_backoff_ms: 500,
            max_wait_ms: None,
        }
    }
}

/// Path to an on-disk stack store plus the policy for opening it
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    wait: LockWait,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>, wait: LockWait) -> Self {
        Self {
            path: path.into(),
            wait,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the store for exclusive use, creating it if absent.
    /// Retries with backoff while another holder has it locked. Any other
    /// failure is returned as [`StoreError::Open`].
    pub async fn open(&self) -> Result<StoreHandle, StoreError> {
        let started = Instant::now();
        let max_wait = self.wait.max_wait_ms.map(Duration::from_millis);
        let mut backoff = Backoff::new(
            Duration::from_millis(self.wait.initial_backoff_ms),
            Duration::from_millis(self.wait.max_backoff_ms),
        );
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match try_open(&self.path).await {
                Ok(conn) => {
                    if attempts > 1 {
                        debug!(attempts, "acquired store after contention");
                    }
                    return Ok(StoreHandle { conn });
                }
                Err(e) if is_busy(&e) => trace!(attempts, "store busy: {e}"),
                Err(e) => {
                    return Err(StoreError::Open {
                        path: self.path.clone(),
                        source: e,
                    });
                }
            }

            let waited = started.elapsed();
            let mut delay = backoff.next_delay();
            if let Some(max) = max_wait {
                if waited >= max {
                    return Err(StoreError::LockTimeout {
                        path: self.path.clone(),
                        waited,
                    });
                }
                delay = delay.min(max - waited);
            }

            tokio::time::sleep(delay).await;
        }
    }
}

async fn try_open(path: &Path) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;
    conn.call(|conn| {
        // busy must come back to us immediately, not via sqlite's handler
        conn.busy_timeout(Duration::ZERO)?;
        Ok(conn.execute_batch(INIT_SQL)?)
    })
    .await?;
    Ok(conn)
}

fn is_busy(err: &tokio_rusqlite::Error) -> bool {
    matches!(
        err,
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::DatabaseBusy
    )
}

/// Exclusive, open store. Everything merged through the handle is
/// committed by [`StoreHandle::close`]; dropping the handle without
/// closing it rolls the batch back and releases the lock.
pub struct StoreHandle {
    conn: Connection,
}

impl StoreHandle {
    /// Appends every observation of the batch to its stack's entry, in
    /// sample order. Returns the number of tokens written.
    pub async fn merge_batch(&self, batch: Batch) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(APPEND_SQL)?;
                for (stack, token) in batch.tokens() {
                    stmt.execute((stack, token))?;
                }
                Ok(batch.len())
            })
            .await?)
    }

    /// returns the encoded history of a stack, if it was ever observed
    pub async fn entry(&self, stack: &str) -> Result<Option<String>, StoreError> {
        let stack = stack.to_string();
        Ok(self
            .conn
            .call(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT entry FROM stacks WHERE stack = ?1",
                        [stack],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .await?)
    }

    pub async fn num_stacks(&self) -> Result<usize, StoreError> {
        Ok(self
            .conn
            .call(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM stacks", [], |row| {
                    row.get::<_, i64>(0)
                })?)
            })
            .await? as usize)
    }

    /// Commits and releases the store. Only a failed commit is an error:
    /// once it lands the batch is saved and the lock is free, so a failure
    /// to close the connection afterwards is just logged.
    pub async fn close(self) -> Result<(), StoreError> {
        self.conn
            .call(|conn| Ok(conn.execute_batch("COMMIT")?))
            .await?;
        if let Err(e) = self.conn.close().await {
            warn!("store committed but its connection did not close: {e}");
        }
        Ok(())
    }
}
