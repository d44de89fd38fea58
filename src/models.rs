// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies for the authentication and payment services.
//! All types derive `ToSchema` for the OpenAPI documents.
//!
//! Request fields default to empty values when absent so that validation,
//! not deserialization, decides which message the caller gets back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::storage::{PaymentRecord, PaymentStatus};

// =============================================================================
// Authentication
// =============================================================================

/// Body of `POST /api/v1/register`.
#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/v1/login`.
#[derive(Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Message envelope used by every authentication service response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            token: None,
        }
    }

    pub fn with_token(message: impl Into<String>, token: String) -> Self {
        Self {
            message: message.into(),
            token: Some(token),
        }
    }
}

/// Identity of the bearer of the presented token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user_id: i64,
    pub email: String,
}

// =============================================================================
// Payments
// =============================================================================

/// Body of `POST /api/v1/pay`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct CreatePaymentRequest {
    /// Amount in major units (e.g. rupees)
    pub amount: f64,
    pub from_account: String,
    pub to_account: String,
    /// ISO 4217 code, defaults to `INR`
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i64,
    pub razorpay_order_id: String,
    pub status: PaymentStatus,
    pub amount: f64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentRecord> for PaymentResponse {
    fn from(record: PaymentRecord) -> Self {
        Self {
            id: record.id,
            razorpay_order_id: record.razorpay_order_id,
            status: record.status,
            amount: record.amount,
            currency: record.currency,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
    pub total: usize,
}

// =============================================================================
// Errors
// =============================================================================

/// JSON error envelope (documentation only; see [`crate::error::ApiError`]).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error class, e.g. `validation_error`
    pub error: String,
    pub message: String,
}
