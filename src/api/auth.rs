// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Register, login and identity lookup.
//!
//! Every response of this service, success or failure, is an
//! [`AuthResponse`] `{"message": ...}` envelope (plus `token` on success),
//! except `GET /api/v1/me` which returns the caller identity.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, warn};

use crate::{
    auth::{middleware::authenticate_headers, AuthError},
    error::ApiError,
    models::{AuthResponse, LoginRequest, MeResponse, RegisterRequest},
    password::{hash_password, verify_password},
    state::AuthState,
    storage::{NewCredential, StorageError},
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Failure response of the authentication service (`{"message": ...}`).
#[derive(Debug)]
pub struct AuthApiError {
    pub status: StatusCode,
    pub message: String,
}

impl AuthApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<AuthError> for AuthApiError {
    fn from(err: AuthError) -> Self {
        if let AuthError::Internal(detail) = &err {
            error!(error = %detail, "token verification unavailable");
        }
        Self::new(err.status_code(), err.to_string())
    }
}

/// Keeps the status of a shared [`ApiError`]; the body stays `{message}`.
impl From<ApiError> for AuthApiError {
    fn from(err: ApiError) -> Self {
        Self::new(err.status, err.message)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        (self.status, Json(AuthResponse::message(self.message))).into_response()
    }
}

fn invalid_json(rejection: JsonRejection) -> AuthApiError {
    warn!(error = %rejection.body_text(), "rejected auth request body");
    AuthApiError::new(StatusCode::BAD_REQUEST, "Invalid JSON format")
}

/// Run Argon2 off the async workers.
async fn blocking<T, F>(work: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, "password task failed");
            None
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "User created", body = AuthResponse),
        (status = 400, description = "Missing fields or invalid JSON", body = AuthResponse),
        (status = 409, description = "Email already registered", body = AuthResponse),
        (status = 500, description = "Hashing, storage or token failure", body = AuthResponse)
    )
)]
pub async fn register(
    State(state): State<AuthState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthApiError> {
    let Json(request) = payload.map_err(invalid_json)?;

    let name = request.name.trim().to_string();
    let email = request.email.trim().to_string();
    let password = request.password.trim().to_string();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthApiError::new(
            StatusCode::BAD_REQUEST,
            "Name, email, and password are required",
        ));
    }

    let password_hash = match blocking(move || hash_password(&password)).await {
        Some(Ok(hash)) => hash,
        Some(Err(e)) => {
            error!(error = %e, "password hashing failed");
            return Err(AuthApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing password",
            ));
        }
        None => {
            return Err(AuthApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing password",
            ))
        }
    };

    let user_id = state
        .credentials
        .insert_user(NewCredential {
            name,
            email: email.clone(),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StorageError::AlreadyExists(_) => {
                AuthApiError::from(ApiError::conflict("Email already registered"))
            }
            other => {
                error!(error = %other, "failed to store new user");
                AuthApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Could not create user")
            }
        })?;

    let token = state.codec.issue(&email, user_id).map_err(|e| {
        error!(error = %e, user_id, "token generation failed");
        AuthApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Token generation failed")
    })?;

    info!(user_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::with_token("User registered successfully", token)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Credentials accepted", body = AuthResponse),
        (status = 400, description = "Missing fields or invalid JSON", body = AuthResponse),
        (status = 401, description = "Invalid email or password", body = AuthResponse),
        (status = 500, description = "Storage or token failure", body = AuthResponse)
    )
)]
pub async fn login(
    State(state): State<AuthState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthApiError> {
    let Json(request) = payload.map_err(invalid_json)?;

    let email = request.email.trim().to_string();
    let password = request.password.trim().to_string();

    if email.is_empty() || password.is_empty() {
        return Err(AuthApiError::new(
            StatusCode::BAD_REQUEST,
            "Email and password are required",
        ));
    }

    let record = state
        .credentials
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!(error = %e, "credential lookup failed");
            AuthApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Could not verify credentials")
        })?
        .ok_or_else(|| AuthApiError::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS))?;

    let stored_hash = record.password_hash.clone();
    let matches = match blocking(move || verify_password(&password, &stored_hash)).await {
        Some(Ok(matches)) => matches,
        Some(Err(e)) => {
            error!(error = %e, user_id = record.id, "stored password hash unusable");
            false
        }
        None => false,
    };

    if !matches {
        return Err(AuthApiError::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    let token = state.codec.issue(&record.email, record.id).map_err(|e| {
        error!(error = %e, user_id = record.id, "token generation failed");
        AuthApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Token generation failed")
    })?;

    info!(user_id = record.id, "user logged in");
    Ok(Json(AuthResponse::with_token("Login successful", token)))
}

#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "Auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Identity carried by the token", body = MeResponse),
        (status = 401, description = "Missing, malformed, invalid or expired token", body = AuthResponse)
    )
)]
pub async fn me(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, AuthApiError> {
    let user = authenticate_headers(&headers, &state.codec)?;
    Ok(Json(MeResponse {
        user_id: user.user_id,
        email: user.email,
    }))
}
