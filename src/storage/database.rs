// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded database bootstrap backed by redb (pure Rust, ACID).
//!
//! Each service owns one database file. Every write goes through a single
//! redb write transaction: dropping the transaction without committing
//! aborts it, so an early `?` return never leaves partial rows behind.

use std::{path::Path, sync::Arc};

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};

/// Monotonic id sequences: sequence name → last issued id.
const SEQUENCES: TableDefinition<&str, i64> = TableDefinition::new("sequences");

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not found: {0}")]
    NotFound(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Open (or create) the database file, creating parent directories first.
pub fn open_database(path: &Path) -> StorageResult<Arc<Database>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::create(path)?;

    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(SEQUENCES)?;
    }
    write_txn.commit()?;

    Ok(Arc::new(db))
}

/// Allocate the next id of `sequence` inside the caller's write transaction.
///
/// Ids start at 1. The increment only becomes visible if the caller commits.
pub fn next_id(write_txn: &WriteTransaction, sequence: &str) -> StorageResult<i64> {
    let mut table = write_txn.open_table(SEQUENCES)?;
    let current = table.get(sequence)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deeper/store.redb");
        open_database(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn sequence_advances_only_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_database(&dir.path().join("seq.redb")).unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "things").unwrap(), 1);
        assert_eq!(next_id(&txn, "things").unwrap(), 2);
        txn.commit().unwrap();

        let aborted = db.begin_write().unwrap();
        assert_eq!(next_id(&aborted, "things").unwrap(), 3);
        drop(aborted);

        let txn = db.begin_write().unwrap();
        assert_eq!(next_id(&txn, "things").unwrap(), 3);
        assert_eq!(next_id(&txn, "others").unwrap(), 1);
        txn.commit().unwrap();
    }
}
