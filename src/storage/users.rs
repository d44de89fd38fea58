// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential storage.
//!
//! ## Table Layout
//!
//! - `users`: user_id → serialized [`CredentialRecord`]
//! - `user_emails`: email → user_id (uniqueness index)

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};

use super::database::{next_id, StorageError, StorageResult};

const USERS: TableDefinition<i64, &[u8]> = TableDefinition::new("users");
const USER_EMAILS: TableDefinition<&str, i64> = TableDefinition::new("user_emails");
const USER_SEQUENCE: &str = "users";

/// A user to be created. The password is already hashed.
#[derive(Clone)]
pub struct NewCredential {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Backing store for user credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a user and return its id.
    ///
    /// Fails with [`StorageError::AlreadyExists`] when the email is taken.
    async fn insert_user(&self, user: NewCredential) -> StorageResult<i64>;

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<CredentialRecord>>;
}

pub struct RedbCredentialStore {
    db: Arc<Database>,
}

impl RedbCredentialStore {
    pub fn open(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USER_EMAILS)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl CredentialStore for RedbCredentialStore {
    async fn insert_user(&self, user: NewCredential) -> StorageResult<i64> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut emails = write_txn.open_table(USER_EMAILS)?;
            if emails.get(user.email.as_str())?.is_some() {
                return Err(StorageError::AlreadyExists(user.email));
            }

            let id = next_id(&write_txn, USER_SEQUENCE)?;
            let record = CredentialRecord {
                id,
                name: user.name,
                email: user.email,
                password_hash: user.password_hash,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&record)?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(id, json.as_slice())?;
            emails.insert(record.email.as_str(), id)?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<CredentialRecord>> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS)?;
        let Some(id) = emails.get(email)?.map(|v| v.value()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Err(StorageError::NotFound(format!("user {id} for indexed email"))),
        }
    }
}
