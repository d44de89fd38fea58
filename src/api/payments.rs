// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Payment creation and listing.
//!
//! Creating a payment is one unit of work: the processor order is created
//! first, then the record is written in a single redb write transaction.
//! If the processor call fails no transaction is opened, and if the write
//! fails the transaction is dropped uncommitted, so a partial record can
//! never be observed.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::{error, info, warn};

use crate::{
    auth::Auth,
    error::ApiError,
    models::{CreatePaymentRequest, ErrorResponse, PaymentListResponse, PaymentResponse},
    providers::OrderRequest,
    state::PaymentState,
    storage::NewPayment,
};

pub const DEFAULT_CURRENCY: &str = "INR";

/// A request that passed validation, with the amount in minor units.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayment {
    pub amount: f64,
    pub amount_minor: u64,
    pub currency: String,
    pub from_account: String,
    pub to_account: String,
}

pub fn validate_payment(request: &CreatePaymentRequest) -> Result<ValidatedPayment, ApiError> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(ApiError::bad_request("Amount must be positive"));
    }

    let minor = (request.amount * 100.0).round();
    if minor < 1.0 {
        return Err(ApiError::bad_request("Amount must be positive"));
    }
    if minor > u64::MAX as f64 {
        return Err(ApiError::bad_request("Amount is too large"));
    }

    let from_account = request.from_account.trim();
    let to_account = request.to_account.trim();
    if from_account.is_empty() || to_account.is_empty() {
        return Err(ApiError::bad_request(
            "Both from_account and to_account must be specified",
        ));
    }

    let currency = match request.currency.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_CURRENCY.to_string(),
        Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
            code.to_ascii_uppercase()
        }
        Some(_) => {
            return Err(ApiError::bad_request(
                "Currency must be a three-letter ISO 4217 code",
            ))
        }
    };

    Ok(ValidatedPayment {
        amount: request.amount,
        amount_minor: minor as u64,
        currency,
        from_account: from_account.to_string(),
        to_account: to_account.to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/pay",
    request_body = CreatePaymentRequest,
    tag = "Payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Order created and payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 500, description = "Processor or storage failure", body = ErrorResponse)
    )
)]
pub async fn create_payment(
    State(state): State<PaymentState>,
    Auth(user): Auth,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected payment request body");
        ApiError::bad_request("Failed to parse request body")
    })?;
    let payment = validate_payment(&request)?;

    let order = OrderRequest {
        amount: payment.amount_minor,
        currency: payment.currency.clone(),
        receipt: format!("order_{}_{}", user.user_id, Utc::now().timestamp()),
        notes: BTreeMap::from([
            ("from_account".to_string(), payment.from_account.clone()),
            ("to_account".to_string(), payment.to_account.clone()),
        ]),
    };

    let created = state.processor.create_order(&order).await.map_err(|e| {
        error!(error = %e, user_id = user.user_id, "payment order creation failed");
        ApiError::service_unavailable("Could not create payment order")
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
    })?;

    let record = state
        .payments
        .insert_payment(NewPayment {
            user_id: user.user_id,
            amount: payment.amount,
            currency: payment.currency,
            from_account: payment.from_account,
            to_account: payment.to_account,
            razorpay_order_id: created.id,
        })
        .await
        .map_err(|e| {
            error!(error = %e, user_id = user.user_id, "payment record write failed");
            ApiError::internal("Could not save payment record")
        })?;

    info!(
        payment_id = record.id,
        user_id = user.user_id,
        order_id = %record.razorpay_order_id,
        status = record.status.as_str(),
        "payment created"
    );
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "Payments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's payments, newest first", body = PaymentListResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse)
    )
)]
pub async fn list_payments(
    State(state): State<PaymentState>,
    Auth(user): Auth,
) -> Result<Json<PaymentListResponse>, ApiError> {
    let records = state.payments.list_for_user(user.user_id).await.map_err(|e| {
        error!(error = %e, user_id = user.user_id, "payment listing failed");
        ApiError::internal("Could not load payments")
    })?;

    let payments: Vec<PaymentResponse> = records.into_iter().map(Into::into).collect();
    Ok(Json(PaymentListResponse {
        total: payments.len(),
        payments,
    }))
}
