// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment record storage.
//!
//! ## Table Layout
//!
//! - `payments`: payment_id → serialized [`PaymentRecord`]
//! - `user_payments`: (user_id, payment_id) → () for per-user listing
//!
//! Ids are allocated from a sequence, so scanning a user's index range in
//! reverse yields newest-first order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, TableDefinition};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::database::{next_id, StorageResult};

const PAYMENTS: TableDefinition<i64, &[u8]> = TableDefinition::new("payments");
const USER_PAYMENTS: TableDefinition<(i64, i64), ()> = TableDefinition::new("user_payments");
const PAYMENT_SEQUENCE: &str = "payments";

/// Payment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Created => "created",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// A payment whose processor order already exists.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub user_id: i64,
    pub amount: f64,
    pub currency: String,
    pub from_account: String,
    pub to_account: String,
    pub razorpay_order_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub currency: String,
    pub from_account: String,
    pub to_account: String,
    pub razorpay_order_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Persist a payment in `created` status inside one write transaction.
    async fn insert_payment(&self, payment: NewPayment) -> StorageResult<PaymentRecord>;

    /// All payments of `user_id`, newest first.
    async fn list_for_user(&self, user_id: i64) -> StorageResult<Vec<PaymentRecord>>;
}

pub struct RedbPaymentStore {
    db: Arc<Database>,
}

impl RedbPaymentStore {
    pub fn open(db: Arc<Database>) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PAYMENTS)?;
            let _ = write_txn.open_table(USER_PAYMENTS)?;
        }
        write_txn.commit()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl PaymentStore for RedbPaymentStore {
    async fn insert_payment(&self, payment: NewPayment) -> StorageResult<PaymentRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let id = next_id(&write_txn, PAYMENT_SEQUENCE)?;
            let record = PaymentRecord {
                id,
                user_id: payment.user_id,
                amount: payment.amount,
                currency: payment.currency,
                from_account: payment.from_account,
                to_account: payment.to_account,
                razorpay_order_id: payment.razorpay_order_id,
                status: PaymentStatus::Created,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&record)?;

            let mut payments = write_txn.open_table(PAYMENTS)?;
            payments.insert(id, json.as_slice())?;

            let mut index = write_txn.open_table(USER_PAYMENTS)?;
            index.insert((record.user_id, id), ())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    async fn list_for_user(&self, user_id: i64) -> StorageResult<Vec<PaymentRecord>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(USER_PAYMENTS)?;
        let payments = read_txn.open_table(PAYMENTS)?;

        let mut results = Vec::new();
        for entry in index.range((user_id, i64::MIN)..=(user_id, i64::MAX))?.rev() {
            let (key, _) = entry?;
            let (_, payment_id) = key.value();
            if let Some(value) = payments.get(payment_id)? {
                results.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::database::open_database;

    fn temp_store() -> (RedbPaymentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = open_database(&dir.path().join("payments.redb")).unwrap();
        (RedbPaymentStore::open(db).unwrap(), dir)
    }

    fn payment(user_id: i64, order: &str) -> NewPayment {
        NewPayment {
            user_id,
            amount: 125.5,
            currency: "INR".into(),
            from_account: "acc-from".into(),
            to_account: "acc-to".into(),
            razorpay_order_id: order.into(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_created_status() {
        let (store, _dir) = temp_store();
        let record = store.insert_payment(payment(7, "order_A")).await.unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.status, PaymentStatus::Created);
        assert_eq!(record.razorpay_order_id, "order_A");
    }

    #[tokio::test]
    async fn list_is_per_user_and_newest_first() {
        let (store, _dir) = temp_store();
        store.insert_payment(payment(7, "order_1")).await.unwrap();
        store.insert_payment(payment(8, "order_2")).await.unwrap();
        store.insert_payment(payment(7, "order_3")).await.unwrap();

        let mine = store.list_for_user(7).await.unwrap();
        let orders: Vec<&str> = mine.iter().map(|p| p.razorpay_order_id.as_str()).collect();
        assert_eq!(orders, vec!["order_3", "order_1"]);

        assert!(store.list_for_user(99).await.unwrap().is_empty());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Refunded).unwrap(),
            r#""refunded""#
        );
        assert_eq!(PaymentStatus::Created.as_str(), "created");
    }
}
