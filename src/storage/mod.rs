// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence ports and their embedded redb implementations.
//!
//! Handlers only see the [`CredentialStore`] and [`PaymentStore`] traits;
//! tests swap in failing or in-memory implementations where needed.
//!
//! ## Database Files
//!
//! ```text
//! data/
//!   auth.redb       # users, user_emails, sequences
//!   payments.redb   # payments, user_payments, sequences
//! ```

pub mod database;
pub mod payments;
pub mod users;

pub use database::{open_database, StorageError, StorageResult};
pub use payments::{NewPayment, PaymentRecord, PaymentStatus, PaymentStore, RedbPaymentStore};
pub use users::{CredentialRecord, CredentialStore, NewCredential, RedbCredentialStore};
