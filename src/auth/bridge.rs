// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity bridge: external login in, local bearer credential out.
//!
//! ## Flow
//!
//! 1. `GET /auth/google` → [`IdentityBridge::initiate`] signs a fresh `state`
//!    and returns the provider consent URL.
//! 2. The provider redirects back with `code` and `state`.
//! 3. [`IdentityBridge::complete`] checks the `state`, exchanges the code,
//!    maps the provider subject to a local identity and issues a credential.
//!
//! There is no server-side session. The `state` is `nonce.issued_at.mac`,
//! HMAC-SHA256 over the first two parts, and is accepted for ten minutes.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::form_urlencoded;
use uuid::Uuid;

use super::provider::{ExternalIdentity, IdentityProvider, ProviderError};
use super::token::{SigningSecret, TokenIssuer};
use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// How long a signed `state` stays valid.
pub const STATE_TTL_SECS: i64 = 600;

/// Namespace for mapping provider subjects to local identities.
const IDENTITY_NAMESPACE: Uuid = Uuid::from_u128(0x6e65_7777_6f72_6c64_8000_0000_0000_0001);

/// Domain-separation prefix so a state MAC is never a valid MAC elsewhere.
const STATE_CONTEXT: &[u8] = b"oauth-state:";

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("external login is not configured")]
    NotConfigured,
    #[error("provider denied the login: {0}")]
    Denied(String),
    #[error("missing authorization code")]
    MissingCode,
    #[error("invalid or expired state")]
    InvalidState,
    #[error("provider exchange failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("credential issuing failed: {0}")]
    Token(#[from] AuthError),
}

/// Query parameters of the provider callback.
#[derive(Debug, Default, Clone, serde::Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denies consent.
    pub error: Option<String>,
}

/// Signs and checks the stateless OAuth `state` parameter.
#[derive(Clone)]
struct StateSigner {
    secret: SigningSecret,
}

impl StateSigner {
    fn mac(&self) -> HmacSha256 {
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 accepts any key length"),
        };
        mac.update(STATE_CONTEXT);
        mac
    }

    fn sign(&self, issued_at: i64) -> String {
        let payload = format!("{}.{issued_at}", Uuid::new_v4().simple());
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let tag = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
        format!("{payload}.{tag}")
    }

    fn verify(&self, state: &str, now: i64) -> Result<(), BridgeError> {
        let (payload, tag) = state.rsplit_once('.').ok_or(BridgeError::InvalidState)?;
        let (_nonce, issued_at) = payload.split_once('.').ok_or(BridgeError::InvalidState)?;
        let issued_at: i64 = issued_at.parse().map_err(|_| BridgeError::InvalidState)?;
        let tag = Base64UrlUnpadded::decode_vec(tag).map_err(|_| BridgeError::InvalidState)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag).map_err(|_| BridgeError::InvalidState)?;

        if !(0..=STATE_TTL_SECS).contains(&(now - issued_at)) {
            return Err(BridgeError::InvalidState);
        }
        Ok(())
    }
}

/// Where the browser is sent after the callback.
#[derive(Debug, Clone)]
pub struct RedirectTargets {
    pub success: String,
    pub failure: String,
}

pub struct IdentityBridge {
    provider: Option<Arc<dyn IdentityProvider>>,
    issuer: TokenIssuer,
    state: StateSigner,
    targets: RedirectTargets,
}

impl IdentityBridge {
    pub fn new(
        provider: Option<Arc<dyn IdentityProvider>>,
        secret: &SigningSecret,
        token_ttl_secs: i64,
        targets: RedirectTargets,
    ) -> Self {
        Self {
            provider,
            issuer: TokenIssuer::new(secret, token_ttl_secs),
            state: StateSigner {
                secret: secret.clone(),
            },
            targets,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> Result<&Arc<dyn IdentityProvider>, BridgeError> {
        self.provider.as_ref().ok_or(BridgeError::NotConfigured)
    }

    /// Consent URL for a new login attempt.
    pub fn initiate(&self) -> Result<String, BridgeError> {
        let provider = self.provider()?;
        let state = self.state.sign(Utc::now().timestamp());
        Ok(provider.authorize_url(&state)?.into())
    }

    /// Finish a login and return the issued credential.
    pub async fn complete(&self, params: CallbackParams) -> Result<String, BridgeError> {
        let provider = self.provider()?;
        if let Some(error) = params.error {
            return Err(BridgeError::Denied(error));
        }
        let state = params.state.ok_or(BridgeError::InvalidState)?;
        self.state.verify(&state, Utc::now().timestamp())?;
        let code = params
            .code
            .filter(|code| !code.is_empty())
            .ok_or(BridgeError::MissingCode)?;

        let identity = provider.exchange(&code).await?;
        let user_id = local_identity(&identity);
        tracing::info!(provider = identity.provider, user_id = %user_id, "External login completed");

        Ok(self.issuer.issue(&user_id)?)
    }

    /// Success destination with the credential in the `token` query parameter.
    pub fn success_location(&self, token: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("token", token)
            .finish();
        let separator = if self.targets.success.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.targets.success)
    }

    pub fn failure_location(&self) -> &str {
        &self.targets.failure
    }
}

/// Deterministic local identity for a provider subject.
pub fn local_identity(identity: &ExternalIdentity) -> String {
    let name = format!("{}:{}", identity.provider, identity.subject);
    Uuid::new_v5(&IDENTITY_NAMESPACE, name.as_bytes()).to_string()
}
