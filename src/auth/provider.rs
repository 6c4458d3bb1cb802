// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! External identity providers.
//!
//! The bridge only needs two things from a provider: a consent URL to send
//! the browser to, and a way to turn the authorization code that comes back
//! into a verified subject. [`GoogleProvider`] implements the OAuth 2.0
//! authorization-code flow against Google's token and userinfo endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Scope requested from every provider.
pub const LOGIN_SCOPE: &str = "openid profile email";

/// HTTP timeout for provider calls.
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity asserted by a provider after a successful code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    pub provider: &'static str,
    /// Provider's stable subject id
    pub subject: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid provider URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Provider rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name, part of the local identity mapping.
    fn name(&self) -> &'static str;

    /// Consent URL carrying the given `state`.
    fn authorize_url(&self, state: &str) -> Result<Url, ProviderError>;

    /// Exchange an authorization code for the caller's identity.
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ProviderError>;
}

/// Google OAuth client settings.
#[derive(Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl std::fmt::Debug for GoogleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
}

pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<Url, ProviderError> {
        Ok(Url::parse_with_params(
            GOOGLE_AUTH_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.callback_url.as_str()),
                ("response_type", "code"),
                ("scope", LOGIN_SCOPE),
                ("state", state),
            ],
        )?)
    }

    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ProviderError> {
        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.config.callback_url.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Rejected(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }
        let token: GoogleTokenResponse = response.json().await?;

        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Rejected(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }
        let user: GoogleUserInfo = response.json().await?;

        Ok(ExternalIdentity {
            provider: self.name(),
            subject: user.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GoogleProvider {
        GoogleProvider::new(GoogleConfig {
            client_id: "client-123.apps.googleusercontent.com".into(),
            client_secret: "shh".into(),
            callback_url: "http://127.0.0.1:3000/auth/google/callback".into(),
        })
        .unwrap()
    }

    #[test]
    fn authorize_url_carries_scope_and_state() {
        let url = provider().authorize_url("nonce.123.sig").unwrap();
        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["scope"], "openid profile email");
        assert_eq!(params["state"], "nonce.123.sig");
        assert_eq!(params["response_type"], "code");
        assert_eq!(
            params["redirect_uri"],
            "http://127.0.0.1:3000/auth/google/callback"
        );
        assert!(!url.as_str().contains("shh"));
    }
}
