//! Operation history ledger.
//!
//! Every operation sloth performs is appended to a SQLite table, which is
//! what decides whether the package index is due for a refresh.

use crate::error::Result;
use crate::types::Operation;
use chrono::{DateTime, TimeDelta, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use serde::Serialize;
use std::path::Path;

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Row id, increasing with insertion order
    pub id: i64,
    /// What was done
    pub operation: Operation,
    /// When it was done, at second resolution
    pub timestamp: DateTime<Utc>,
    /// Arguments joined with spaces, possibly empty
    pub args: String,
}

impl Record {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let op: String = row.get(1)?;
        let operation = op
            .parse::<Operation>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
        let secs: i64 = row.get(2)?;
        let timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(2, secs))?;

        Ok(Self {
            id: row.get(0)?,
            operation,
            timestamp,
            args: row.get(3)?,
        })
    }
}

/// Append-only store of executed operations.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Open or create the ledger at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the parent directory cannot be created and
    /// `Error::Storage` if the database cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn)
    }

    /// Ledger that lives only as long as the value.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS operation (
                id INTEGER PRIMARY KEY,
                op TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                args TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_op_op ON operation (op);
            CREATE INDEX IF NOT EXISTS idx_op_time ON operation (timestamp);
            CREATE INDEX IF NOT EXISTS idx_op_op_time ON operation (op, timestamp);
            ",
        )?;
        Ok(Self { conn })
    }

    /// Record `op` as performed now. Returns the new row id.
    pub fn record(&self, op: Operation, args: &str) -> Result<i64> {
        self.record_at(op, args, Utc::now())
    }

    /// Record `op` as performed at `timestamp`.
    pub fn record_at(&self, op: Operation, args: &str, timestamp: DateTime<Utc>) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO operation (op, timestamp, args) VALUES (?1, ?2, ?3)",
            params![op.as_str(), timestamp.timestamp(), args],
        )?;
        let id = self.conn.last_insert_rowid();
        log::debug!("Recorded {op} #{id}");
        Ok(id)
    }

    /// Latest record for `op`, if there is one.
    pub fn most_recent(&self, op: Operation) -> Result<Option<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, op, timestamp, args FROM operation
             WHERE op = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT 1",
        )?;
        let mut rows = stmt.query(params![op.as_str()])?;

        match rows.next()? {
            Some(row) => Ok(Some(Record::from_row(row)?)),
            None => Ok(None),
        }
    }

    /// Up to `limit` records, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, op, timestamp, args FROM operation
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )?;
        let records = stmt.query_map(params![sql_limit(limit)], Record::from_row)?;
        records.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Up to `limit` records of `op`, newest first.
    pub fn recent_for(&self, op: Operation, limit: usize) -> Result<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, op, timestamp, args FROM operation
             WHERE op = ?1
             ORDER BY timestamp DESC, id DESC
             LIMIT ?2",
        )?;
        let records = stmt.query_map(params![op.as_str(), sql_limit(limit)], Record::from_row)?;
        records.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Whether the package index should be refreshed at `now`.
///
/// True when no refresh was ever recorded or the last one is older than
/// `interval`. A refresh exactly `interval` old is still fresh.
pub fn is_refresh_due(ledger: &Ledger, interval: TimeDelta, now: DateTime<Utc>) -> Result<bool> {
    Ok(ledger
        .most_recent(Operation::Refresh)?
        .is_none_or(|last| now - last.timestamp > interval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_empty_ledger() {
        let ledger = Ledger::open_in_memory().unwrap();
        assert!(ledger.most_recent(Operation::Refresh).unwrap().is_none());
        assert!(ledger.recent(10).unwrap().is_empty());
        assert!(is_refresh_due(&ledger, TimeDelta::seconds(86400), at(1_700_000_000)).unwrap());
    }

    #[test]
    fn test_most_recent_returns_inserted_time() {
        let ledger = Ledger::open_in_memory().unwrap();
        let t = at(1_700_000_000);
        let id = ledger.record_at(Operation::Refresh, "", t).unwrap();

        let last = ledger.most_recent(Operation::Refresh).unwrap().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.timestamp, t);
        assert_eq!(last.operation, Operation::Refresh);
        assert!(ledger.most_recent(Operation::Install).unwrap().is_none());
    }

    #[test]
    fn test_staleness_boundary() {
        let ledger = Ledger::open_in_memory().unwrap();
        let t = at(1_700_000_000);
        let interval = TimeDelta::seconds(3600);
        ledger.record_at(Operation::Refresh, "", t).unwrap();

        assert!(!is_refresh_due(&ledger, interval, t + TimeDelta::seconds(10)).unwrap());
        assert!(!is_refresh_due(&ledger, interval, t + interval).unwrap());
        assert!(is_refresh_due(&ledger, interval, t + interval + TimeDelta::seconds(1)).unwrap());
    }

    #[test]
    fn test_other_operations_do_not_count_as_refresh() {
        let ledger = Ledger::open_in_memory().unwrap();
        let t = at(1_700_000_000);
        ledger.record_at(Operation::Install, "vim", t).unwrap();
        assert!(is_refresh_due(&ledger, TimeDelta::seconds(3600), t).unwrap());
    }

    #[test]
    fn test_recent_newest_first() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger.record_at(Operation::Refresh, "", at(100)).unwrap();
        ledger.record_at(Operation::Install, "vim git", at(200)).unwrap();
        ledger.record_at(Operation::Delete, "nano", at(300)).unwrap();
        ledger.record_at(Operation::Install, "emacs", at(400)).unwrap();

        let all = ledger.recent(10).unwrap();
        let ops: Vec<_> = all.iter().map(|r| r.operation).collect();
        assert_eq!(
            ops,
            vec![
                Operation::Install,
                Operation::Delete,
                Operation::Install,
                Operation::Refresh
            ]
        );
        assert_eq!(ledger.recent(2).unwrap().len(), 2);

        let installs = ledger.recent_for(Operation::Install, 10).unwrap();
        assert_eq!(installs.len(), 2);
        assert_eq!(installs[0].args, "emacs");
        assert_eq!(installs[1].args, "vim git");
    }

    #[test]
    fn test_every_operation_can_be_recorded() {
        let ledger = Ledger::open_in_memory().unwrap();
        for op in Operation::ALL {
            ledger.record(op, "a b c").unwrap();
        }
        assert_eq!(ledger.recent(100).unwrap().len(), Operation::ALL.len());
    }

    #[test]
    fn test_persists_across_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("sloth.db");

        {
            let ledger = Ledger::open(&path).unwrap();
            ledger.record_at(Operation::Upgrade, "", at(500)).unwrap();
        }

        let ledger = Ledger::open(&path).unwrap();
        let last = ledger.most_recent(Operation::Upgrade).unwrap().unwrap();
        assert_eq!(last.timestamp, at(500));
    }
}
