//! Shared connection handle and transaction scoping.
//!
//! # Responsibility
//! - Let request threads share one migrated connection.
//! - Run each unit of work inside exactly one transaction.
//!
//! # Invariants
//! - A unit of work commits only when its closure returns `Ok`.
//! - Dropping an uncommitted transaction rolls it back.
//! - A poisoned lock is recovered; the panicking unit of work was rolled
//!   back while unwinding.

use super::DbResult;
use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};

/// Clonable handle to the process-wide store connection.
#[derive(Clone)]
pub struct SharedDb {
    conn: Arc<Mutex<Connection>>,
}

impl SharedDb {
    /// Wraps a connection returned by `open_db*`.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `work` inside an IMMEDIATE transaction.
    ///
    /// The write lock is taken at `BEGIN`, so concurrent writers serialize
    /// instead of failing on lock upgrade.
    pub fn write<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        self.run(TransactionBehavior::Immediate, work)
    }

    /// Runs `work` inside a deferred transaction for a consistent snapshot.
    pub fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        self.run(TransactionBehavior::Deferred, work)
    }

    /// Executes the no-op liveness query.
    pub fn ping(&self) -> DbResult<()> {
        let conn = self.lock();
        conn.query_row("SELECT 1;", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn run<T, E, F>(&self, behavior: TransactionBehavior, work: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(behavior)?;
        let value = work(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("event=db_lock module=db status=recovered reason=poisoned");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SharedDb;
    use crate::db::open_db_in_memory;

    fn count_entities(db: &SharedDb) -> i64 {
        db.read(|tx| {
            tx.query_row("SELECT COUNT(*) FROM entities;", [], |row| row.get(0))
        })
        .unwrap()
    }

    #[test]
    fn failed_unit_of_work_rolls_back() {
        let db = SharedDb::new(open_db_in_memory().unwrap());

        let result: Result<(), rusqlite::Error> = db.write(|tx| {
            tx.execute(
                "INSERT INTO entities (id, title, owner_id, created_at, updated_at)
                 VALUES ('a', 'first', 'owner', 1, 1);",
                [],
            )?;
            tx.execute("INSERT INTO missing_table VALUES (1);", [])?;
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(count_entities(&db), 0);
    }

    #[test]
    fn successful_unit_of_work_commits() {
        let db = SharedDb::new(open_db_in_memory().unwrap());
        db.write(|tx| {
            tx.execute(
                "INSERT INTO entities (id, title, owner_id, created_at, updated_at)
                 VALUES ('a', 'first', 'owner', 1, 1);",
                [],
            )
            .map(|_| ())
        })
        .unwrap();

        assert_eq!(count_entities(&db), 1);
        db.ping().unwrap();
    }
}
