// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Identity is delegated to an external OAuth provider; the service issues
//! and verifies its own short-lived bearer credentials.
//!
//! ## Auth Flow
//!
//! 1. Browser hits `/auth/google` and is redirected to the provider
//! 2. Provider redirects back to `/auth/google/callback` with a code
//! 3. The [`IdentityBridge`]:
//!    - checks the signed `state`
//!    - exchanges the code for the provider subject
//!    - maps it to a local identity (UUIDv5 of `provider:subject`)
//!    - issues an HS256 credential and redirects with `?token=...`
//! 4. Clients send `Authorization: Bearer <token>` on every `/api` call
//!
//! ## Security
//!
//! - One shared secret, loaded once at startup, signs credentials and state
//! - Credentials expire after one hour by default; no clock skew leeway
//! - No refresh tokens, no roles

pub mod bridge;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod provider;
pub mod token;

pub use bridge::{CallbackParams, IdentityBridge, RedirectTargets};
pub use claims::{AuthenticatedUser, CredentialClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use middleware::{promote_query_token, require_auth};
pub use provider::{GoogleConfig, GoogleProvider, IdentityProvider};
pub use token::{SigningSecret, TokenIssuer, TokenVerifier};
