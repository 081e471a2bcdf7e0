//! Service layer owning the database, the write gate and the revision trail.
//!
//! `CapService` wraps `CapDb` (raw database access) and `TrailWriter` (JSONL
//! persistence). Repo read methods are implemented as `impl CapService`
//! blocks in `repos/`; mutations of entries go through [`WriteTxn`].

use std::path::PathBuf;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::CapDb;
use crate::error::DatabaseError;
use crate::retry::{RetryConfig, with_retry};
use crate::trail::writer::TrailWriter;
use crate::txn::WriteTxn;

/// Storage handle shared by every request.
///
/// All statements run on one libSQL connection. The gate keeps readers out
/// while a write transaction is open and keeps write transactions from
/// interleaving, so an entry is never observed half-written.
pub struct CapService {
    db: CapDb,
    trail: TrailWriter,
    gate: RwLock<()>,
    retry: RetryConfig,
}

impl CapService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    /// * `trail_dir` - Directory for JSONL trail files. Pass `None` to disable
    ///   trail writing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the trail
    /// directory cannot be created.
    pub async fn new_local(
        db_path: &str,
        trail_dir: Option<PathBuf>,
    ) -> Result<Self, DatabaseError> {
        let db = CapDb::open_local(db_path).await?;
        let trail = match trail_dir {
            Some(dir) => TrailWriter::new(dir)?,
            None => TrailWriter::disabled(),
        };
        tracing::info!(path = db_path, trail = trail.is_enabled(), "database opened");
        Ok(Self::from_db(db, trail))
    }

    /// Create from an existing `CapDb`.
    #[must_use]
    pub fn from_db(db: CapDb, trail: TrailWriter) -> Self {
        Self {
            db,
            trail,
            gate: RwLock::new(()),
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy used for write contention.
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &CapDb {
        &self.db
    }

    #[must_use]
    pub const fn trail(&self) -> &TrailWriter {
        &self.trail
    }

    #[must_use]
    pub const fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    pub(crate) async fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    pub(crate) async fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }

    /// Take the exclusive gate and open a `BEGIN IMMEDIATE` transaction.
    ///
    /// The transaction must be finished with [`WriteTxn::commit`],
    /// [`WriteTxn::rollback`] or [`WriteTxn::finish`].
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction cannot start once the
    /// retry budget for lock contention is spent.
    pub async fn begin_write(&self) -> Result<WriteTxn<'_>, DatabaseError> {
        let guard = self.write_gate().await;
        let conn = self.db.conn();
        let tx = with_retry(&self.retry, DatabaseError::is_busy, || async move {
            conn.transaction_with_behavior(libsql::TransactionBehavior::Immediate)
                .await
                .map_err(DatabaseError::from)
        })
        .await?;
        Ok(WriteTxn::new(guard, tx, &self.trail, &self.retry))
    }
}
