// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer credential issuing and verification (HS256).
//!
//! The signing secret is loaded once at startup and handed to both halves
//! explicitly. Verification is pure: no clock skew allowance, no key
//! fetching, no cache.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{AuthError, AuthenticatedUser, CredentialClaims};

/// Default credential lifetime (one hour).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Shared HMAC secret for credentials and OAuth state.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// Mints credentials for a local identity.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &SigningSecret, ttl_secs: i64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Issue a credential for `subject`, valid from now for the configured TTL.
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a credential as if minted at `issued_at`.
    pub fn issue_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = CredentialClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }
}

/// Validates credentials against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a credential and extract the caller.
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let token_data = decode::<CredentialClaims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })?;

        Ok(AuthenticatedUser::from_claims(token_data.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SigningSecret {
        SigningSecret::new("test-secret-with-enough-bytes")
    }

    #[test]
    fn issued_token_verifies() {
        let issuer = TokenIssuer::new(&secret(), DEFAULT_TOKEN_TTL_SECS);
        let verifier = TokenVerifier::new(&secret());

        let token = issuer.issue("user_123").unwrap();
        let user = verifier.verify(&token).unwrap();
        assert_eq!(user.user_id, "user_123");
        assert_eq!(user.expires_at - user.issued_at, DEFAULT_TOKEN_TTL_SECS);
    }

    #[test]
    fn expired_token_rejected() {
        let issuer = TokenIssuer::new(&secret(), 60);
        let verifier = TokenVerifier::new(&secret());

        let token = issuer
            .issue_at("user_123", Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn token_from_other_secret_rejected() {
        let issuer = TokenIssuer::new(&SigningSecret::new("another-secret"), 60);
        let verifier = TokenVerifier::new(&secret());

        let token = issuer.issue("user_123").unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_rejected() {
        let verifier = TokenVerifier::new(&secret());
        assert!(matches!(
            verifier.verify("not.a.jwt"),
            Err(AuthError::MalformedToken)
        ));
        assert!(verifier.verify("").is_err());
    }

    #[test]
    fn secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", secret()), "SigningSecret(<redacted>)");
    }
}
