// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Every service is configured from environment variables at startup. In
//! development a `.env` file is read first (see [`load_dotenv`]); inside
//! Docker only the variables passed to the container are used.
//!
//! ## Environment Variables
//!
//! | Variable | Used by | Description | Default |
//! |----------|---------|-------------|---------|
//! | `HOST` | all | Bind address | `0.0.0.0` |
//! | `PORT` | all | Bind port | gateway `8080`, auth `8083`, payment `8084` |
//! | `AUTH_SERVICE_URL` | gateway | Auth backend base URL | `http://localhost:8083` |
//! | `PAYMENT_SERVICE_URL` | gateway | Payment backend base URL | `http://localhost:8084` |
//! | `CORS_ALLOWED_ORIGINS` | all | Comma separated allow-list | `http://localhost:3000` |
//! | `JWT_SECRET` | auth, payment | HMAC signing secret | dev fallback outside Docker |
//! | `DATABASE_URL` | auth, payment | redb file (`redb://` prefix optional) | `data/<service>.redb` |
//! | `RAZORPAY_KEY` / `RAZORPAY_SECRET` | payment | Processor credentials | Required |
//! | `RAZORPAY_API_BASE_URL` | payment | Processor API root | `https://api.razorpay.com` |
//! | `RUNNING_IN_DOCKER` | all | `true` disables `.env` loading and the dev secret | unset |
//! | `LOG_FORMAT` | all | `json` or `pretty` | `pretty` |
//! | `RUST_LOG` | all | Log level filter | `info,tower_http=debug` |
//!
//! Config structs are built through `from_lookup` so tests can supply
//! variables without touching the process environment.

use std::{net::SocketAddr, path::PathBuf};

use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const AUTH_SERVICE_URL_ENV: &str = "AUTH_SERVICE_URL";
pub const PAYMENT_SERVICE_URL_ENV: &str = "PAYMENT_SERVICE_URL";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const RAZORPAY_KEY_ENV: &str = "RAZORPAY_KEY";
pub const RAZORPAY_SECRET_ENV: &str = "RAZORPAY_SECRET";
pub const RAZORPAY_KEY_ID_ENV: &str = "RAZORPAY_KEY_ID";
pub const RAZORPAY_KEY_SECRET_ENV: &str = "RAZORPAY_KEY_SECRET";
pub const RAZORPAY_API_BASE_URL_ENV: &str = "RAZORPAY_API_BASE_URL";
pub const RUNNING_IN_DOCKER_ENV: &str = "RUNNING_IN_DOCKER";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_GATEWAY_PORT: u16 = 8080;
pub const DEFAULT_AUTH_PORT: u16 = 8083;
pub const DEFAULT_PAYMENT_PORT: u16 = 8084;
pub const DEFAULT_AUTH_SERVICE_URL: &str = "http://localhost:8083";
pub const DEFAULT_PAYMENT_SERVICE_URL: &str = "http://localhost:8084";
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_AUTH_DATABASE: &str = "data/auth.redb";
pub const DEFAULT_PAYMENT_DATABASE: &str = "data/payments.redb";
pub const DEFAULT_RAZORPAY_API_BASE_URL: &str = "https://api.razorpay.com";

/// Signing secret used when `JWT_SECRET` is unset outside Docker.
///
/// Never valid in production: every service logs a warning when it falls
/// back to this value, and Docker deployments refuse to start without a
/// real secret.
pub const DEV_JWT_SECRET: &str = "dev-secret-please-change-me";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// What happened when looking for a `.env` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DotenvOutcome {
    /// `RUNNING_IN_DOCKER=true`: only container variables are used.
    SkippedInDocker,
    Loaded(PathBuf),
    NotFound,
}

impl DotenvOutcome {
    /// Report the outcome once tracing is up.
    pub fn log(&self) {
        match self {
            DotenvOutcome::SkippedInDocker => {
                tracing::info!("running in Docker, using container environment only")
            }
            DotenvOutcome::Loaded(path) => {
                tracing::info!(path = %path.display(), "loaded environment from .env file")
            }
            DotenvOutcome::NotFound => {
                tracing::debug!("no .env file found, using process environment")
            }
        }
    }
}

/// Pre-seed the environment from `../.env` or `./.env` in development.
///
/// Variables already present in the environment are never overridden.
/// Runs before tracing is initialised, so the outcome is returned for the
/// caller to log.
pub fn load_dotenv() -> DotenvOutcome {
    load_dotenv_with(&|name| std::env::var(name).ok())
}

fn load_dotenv_with<F>(lookup: &F) -> DotenvOutcome
where
    F: Fn(&str) -> Option<String>,
{
    if is_running_in_docker(lookup) {
        return DotenvOutcome::SkippedInDocker;
    }

    if let Ok(path) = dotenvy::from_filename("../.env") {
        return DotenvOutcome::Loaded(path);
    }

    match dotenvy::dotenv() {
        Ok(path) => DotenvOutcome::Loaded(path),
        Err(_) => DotenvOutcome::NotFound,
    }
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub auth_service_url: Url,
    pub payment_service_url: Url,
    pub allowed_origins: Vec<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: bind_addr(&lookup, DEFAULT_GATEWAY_PORT)?,
            auth_service_url: service_url(&lookup, AUTH_SERVICE_URL_ENV, DEFAULT_AUTH_SERVICE_URL)?,
            payment_service_url: service_url(
                &lookup,
                PAYMENT_SERVICE_URL_ENV,
                DEFAULT_PAYMENT_SERVICE_URL,
            )?,
            allowed_origins: allowed_origins(&lookup),
        })
    }
}

/// Authentication service configuration.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: JwtSecret,
    pub database_path: PathBuf,
    pub allowed_origins: Vec<String>,
}

impl AuthServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: bind_addr(&lookup, DEFAULT_AUTH_PORT)?,
            jwt_secret: JwtSecret::resolve(&lookup)?,
            database_path: database_path(&lookup, DEFAULT_AUTH_DATABASE),
            allowed_origins: allowed_origins(&lookup),
        })
    }
}

/// Payment service configuration.
#[derive(Debug, Clone)]
pub struct PaymentServiceConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: JwtSecret,
    pub database_path: PathBuf,
    pub allowed_origins: Vec<String>,
    pub razorpay: RazorpayCredentials,
}

impl PaymentServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bind_addr: bind_addr(&lookup, DEFAULT_PAYMENT_PORT)?,
            jwt_secret: JwtSecret::resolve(&lookup)?,
            database_path: database_path(&lookup, DEFAULT_PAYMENT_DATABASE),
            allowed_origins: allowed_origins(&lookup),
            razorpay: RazorpayCredentials::resolve(&lookup)?,
        })
    }
}

/// HMAC secret plus where it came from.
#[derive(Clone)]
pub struct JwtSecret {
    value: String,
    is_dev_fallback: bool,
}

impl JwtSecret {
    /// Resolve `JWT_SECRET`, falling back to [`DEV_JWT_SECRET`] outside Docker.
    pub fn resolve<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = non_empty(lookup, JWT_SECRET_ENV) {
            return Ok(Self {
                value,
                is_dev_fallback: false,
            });
        }

        if is_running_in_docker(lookup) {
            return Err(ConfigError::Missing(JWT_SECRET_ENV));
        }

        Ok(Self {
            value: DEV_JWT_SECRET.to_string(),
            is_dev_fallback: true,
        })
    }

    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Emit the startup warning for the development fallback secret.
    pub fn warn_if_dev_fallback(&self, service: &str) {
        if self.is_dev_fallback {
            tracing::warn!(
                service,
                "JWT_SECRET is not set; using the development secret. Configure JWT_SECRET before deploying"
            );
        }
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSecret")
            .field("value", &"<redacted>")
            .field("is_dev_fallback", &self.is_dev_fallback)
            .finish()
    }
}

/// Payment processor API credentials.
#[derive(Clone)]
pub struct RazorpayCredentials {
    pub key_id: String,
    pub key_secret: String,
    pub api_base_url: String,
}

impl RazorpayCredentials {
    pub fn resolve<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_id = non_empty(lookup, RAZORPAY_KEY_ENV)
            .or_else(|| non_empty(lookup, RAZORPAY_KEY_ID_ENV))
            .ok_or(ConfigError::Missing(RAZORPAY_KEY_ENV))?;
        let key_secret = non_empty(lookup, RAZORPAY_SECRET_ENV)
            .or_else(|| non_empty(lookup, RAZORPAY_KEY_SECRET_ENV))
            .ok_or(ConfigError::Missing(RAZORPAY_SECRET_ENV))?;
        let api_base_url = non_empty(lookup, RAZORPAY_API_BASE_URL_ENV)
            .unwrap_or_else(|| DEFAULT_RAZORPAY_API_BASE_URL.to_string());

        Ok(Self {
            key_id,
            key_secret,
            api_base_url,
        })
    }
}

impl std::fmt::Debug for RazorpayCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayCredentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

fn is_running_in_docker<F>(lookup: &F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(RUNNING_IN_DOCKER_ENV)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn bind_addr<F>(lookup: &F, default_port: u16) -> Result<SocketAddr, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let host = non_empty(lookup, HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match non_empty(lookup, PORT_ENV) {
        Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
            var: PORT_ENV,
            reason: e.to_string(),
        })?,
        None => default_port,
    };

    format!("{host}:{port}")
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: HOST_ENV,
            reason: e.to_string(),
        })
}

fn service_url<F>(lookup: &F, var: &'static str, default: &str) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup, var).unwrap_or_else(|| default.to_string());
    let url = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("expected an http(s) URL with a host, got {raw}"),
        });
    }

    Ok(url)
}

fn database_path<F>(lookup: &F, default: &str) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup, DATABASE_URL_ENV).unwrap_or_else(|| default.to_string());
    let path = raw.strip_prefix("redb://").unwrap_or(&raw);
    PathBuf::from(path)
}

fn allowed_origins<F>(lookup: &F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup, CORS_ALLOWED_ORIGINS_ENV)
        .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());

    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
