// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};

use crate::{auth::CallbackParams, state::AppState};

fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

#[utoipa::path(
    get,
    path = "/auth/google",
    tag = "Auth",
    responses((status = 302, description = "Redirect to the Google consent screen"))
)]
pub async fn google_login(State(state): State<AppState>) -> Response {
    match state.bridge.initiate() {
        Ok(url) => found(&url),
        Err(e) => {
            tracing::warn!(error = %e, "Could not start external login");
            found(state.bridge.failure_location())
        }
    }
}

#[utoipa::path(
    get,
    path = "/auth/google/callback",
    tag = "Auth",
    params(
        ("code" = Option<String>, Query, description = "Authorization code from the provider"),
        ("state" = Option<String>, Query, description = "Signed state issued by /auth/google"),
        ("error" = Option<String>, Query, description = "Provider error, e.g. access_denied")
    ),
    responses((
        status = 302,
        description = "Redirect to the success page with ?token=..., or to the failure page"
    ))
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.bridge.complete(params).await {
        Ok(token) => found(&state.bridge.success_location(&token)),
        Err(e) => {
            tracing::warn!(error = %e, "External login failed");
            found(state.bridge.failure_location())
        }
    }
}
