//! # Unit of Work
//!
//! The atomic boundary every stock-moving operation runs inside.
//!
//! ## Locking Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checkout A                         Checkout B                          │
//! │      │                                  │                               │
//! │  BEGIN IMMEDIATE  ◄── write lock        │                               │
//! │      │                              BEGIN IMMEDIATE ... waits           │
//! │  SELECT quantity (5)                    │  (up to busy_timeout)         │
//! │  UPDATE quantity = 2                    │                               │
//! │  COMMIT ──────────── lock released ─────┤                               │
//! │                                     SELECT quantity (2)                 │
//! │                                     InsufficientStock → ROLLBACK        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `BEGIN IMMEDIATE` takes SQLite's write lock when the unit opens, so a
//! quantity read inside the unit cannot change before the unit ends. This
//! is what `SELECT ... FOR UPDATE` gives on a server database.
//!
//! Dropping a unit without calling [`UnitOfWork::commit`] rolls it back.
//! That covers early `?` returns and a request future dropped on client
//! disconnect.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};

/// An open write transaction.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}

impl UnitOfWork {
    /// Opens a unit, waiting for the write lock.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool.begin_with("BEGIN IMMEDIATE").await.map_err(|e| match DbError::from(e) {
            DbError::Busy => DbError::Busy,
            DbError::PoolExhausted => DbError::PoolExhausted,
            other => DbError::TransactionFailed(other.to_string()),
        })?;
        debug!("Unit of work opened");
        Ok(UnitOfWork { tx })
    }

    /// The connection to run statements on.
    #[inline]
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    /// Commits every write made through this unit.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work committed");
        Ok(())
    }

    /// Discards every write made through this unit.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}
