// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Two layers, applied in this order on the protected router:
//!
//! 1. [`promote_query_token`] copies a `token` query parameter into the
//!    `Authorization` header when the header is absent. Browsers landing on
//!    the docs page after login carry the credential this way.
//! 2. [`require_auth`] verifies the bearer credential and inserts the
//!    [`AuthenticatedUser`] into request extensions. Failures are answered
//!    here; the request never reaches a handler.
//!
//! ```rust,ignore
//! let protected = Router::new()
//!     .route("/characters", get(list))
//!     .route_layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
//!     .layer(axum::middleware::from_fn(promote_query_token));
//! ```

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use url::form_urlencoded;

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Query parameter carrying a credential.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Move a `token` query parameter into the `Authorization` header.
pub async fn promote_query_token(mut request: Request, next: Next) -> Response {
    if !request.headers().contains_key(AUTHORIZATION) {
        let token = request.uri().query().and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == TOKEN_QUERY_PARAM)
                .map(|(_, value)| value.into_owned())
        });

        if let Some(token) = token.filter(|token| !token.is_empty()) {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                request.headers_mut().insert(AUTHORIZATION, value);
            }
        }
    }
    next.run(request).await
}

/// Reject requests without a valid bearer credential.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(&state, request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error_code = e.error_code(), path = %request.uri().path(), "Rejected request");
            e.into_response()
        }
    }
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthenticatedUser, AuthError> {
    let auth_header = match headers.get(AUTHORIZATION) {
        Some(header) => header,
        None => return Err(AuthError::MissingToken),
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }

    state.verifier.verify(token)
}
