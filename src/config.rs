// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Everything is read from the environment once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Root directory for document files | unset: in-memory store |
//! | `JWT_SECRET` | Secret signing credentials and OAuth state | Required |
//! | `TOKEN_TTL_SECS` | Credential lifetime | `3600` |
//! | `GOOGLE_CLIENT_ID` | Google OAuth client id | unset: external login disabled |
//! | `GOOGLE_CLIENT_SECRET` | Google OAuth client secret | required with the client id |
//! | `GOOGLE_CALLBACK_URL` | Registered redirect URI | required with the client id |
//! | `AUTH_SUCCESS_REDIRECT` | Where a completed login lands | `/api-newworld-docs/` |
//! | `AUTH_FAILURE_REDIRECT` | Where a failed login lands | `/` |
//! | `RECONCILE_INTERVAL_SECS` | Link reconciliation period, `0` disables | `300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::token::DEFAULT_TOKEN_TTL_SECS;
use crate::auth::{GoogleConfig, RedirectTargets, SigningSecret};
use crate::relations::reconcile::DEFAULT_RECONCILE_INTERVAL;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const JWT_SECRET_ENV: &str = "JWT_SECRET";
pub const TOKEN_TTL_ENV: &str = "TOKEN_TTL_SECS";
pub const GOOGLE_CLIENT_ID_ENV: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET_ENV: &str = "GOOGLE_CLIENT_SECRET";
pub const GOOGLE_CALLBACK_URL_ENV: &str = "GOOGLE_CALLBACK_URL";
pub const AUTH_SUCCESS_REDIRECT_ENV: &str = "AUTH_SUCCESS_REDIRECT";
pub const AUTH_FAILURE_REDIRECT_ENV: &str = "AUTH_FAILURE_REDIRECT";
pub const RECONCILE_INTERVAL_ENV: &str = "RECONCILE_INTERVAL_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SUCCESS_REDIRECT: &str = "/api-newworld-docs/";
pub const DEFAULT_FAILURE_REDIRECT: &str = "/";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("{0} is set but the other Google OAuth variables are not")]
    PartialGoogle(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub data_dir: Option<PathBuf>,
    pub jwt_secret: SigningSecret,
    pub token_ttl_secs: i64,
    pub google: Option<GoogleConfig>,
    pub redirects: RedirectTargets,
    /// `None` disables the reconciler.
    pub reconcile_interval: Option<Duration>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host: IpAddr = parse_or(&var, HOST_ENV, DEFAULT_HOST.parse().ok())?;
        let port: u16 = parse_or(&var, PORT_ENV, Some(DEFAULT_PORT))?;

        let jwt_secret = var(JWT_SECRET_ENV)
            .map(SigningSecret::new)
            .ok_or(ConfigError::Missing(JWT_SECRET_ENV))?;

        let token_ttl_secs: i64 = parse_or(&var, TOKEN_TTL_ENV, Some(DEFAULT_TOKEN_TTL_SECS))?;
        if token_ttl_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: TOKEN_TTL_ENV,
                value: token_ttl_secs.to_string(),
            });
        }

        let reconcile_secs: u64 = parse_or(
            &var,
            RECONCILE_INTERVAL_ENV,
            Some(DEFAULT_RECONCILE_INTERVAL.as_secs()),
        )?;

        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            data_dir: var(DATA_DIR_ENV).map(PathBuf::from),
            jwt_secret,
            token_ttl_secs,
            google: google_config(&var)?,
            redirects: RedirectTargets {
                success: var(AUTH_SUCCESS_REDIRECT_ENV)
                    .unwrap_or_else(|| DEFAULT_SUCCESS_REDIRECT.to_string()),
                failure: var(AUTH_FAILURE_REDIRECT_ENV)
                    .unwrap_or_else(|| DEFAULT_FAILURE_REDIRECT.to_string()),
            },
            reconcile_interval: (reconcile_secs > 0).then(|| Duration::from_secs(reconcile_secs)),
            log_format,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Option<T>,
) -> Result<T, ConfigError> {
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}

/// All three Google variables or none of them.
fn google_config(
    var: &impl Fn(&str) -> Option<String>,
) -> Result<Option<GoogleConfig>, ConfigError> {
    let client_id = var(GOOGLE_CLIENT_ID_ENV);
    let client_secret = var(GOOGLE_CLIENT_SECRET_ENV);
    let callback_url = var(GOOGLE_CALLBACK_URL_ENV);

    match (client_id, client_secret, callback_url) {
        (None, None, None) => Ok(None),
        (Some(client_id), Some(client_secret), Some(callback_url)) => Ok(Some(GoogleConfig {
            client_id,
            client_secret,
            callback_url,
        })),
        (Some(_), _, _) => Err(ConfigError::PartialGoogle(GOOGLE_CLIENT_ID_ENV)),
        (None, Some(_), _) => Err(ConfigError::PartialGoogle(GOOGLE_CLIENT_SECRET_ENV)),
        (None, None, Some(_)) => Err(ConfigError::PartialGoogle(GOOGLE_CALLBACK_URL_ENV)),
    }
}
