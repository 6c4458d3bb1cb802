// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::MessageResponse;
use crate::{
    access::AccessController,
    auth::Auth,
    error::ApiError,
    models::{Ability, AbilityDraft, AbilityPatch, AbilityView},
    state::AppState,
};

fn controller(state: &AppState) -> AccessController<'_, Ability> {
    AccessController::new(state.store.as_ref())
}

#[utoipa::path(
    get,
    path = "/api/abilities",
    tag = "Abilities",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Abilities owned by the caller", body = [AbilityView]),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn list_abilities(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Vec<AbilityView>>, ApiError> {
    Ok(Json(controller(&state).list(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/abilities/{id}",
    params(("id" = String, Path, description = "Ability id")),
    tag = "Abilities",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = AbilityView),
        (status = 400, description = "Invalid ability ID", body = MessageResponse),
        (status = 404, description = "Missing or owned by someone else", body = MessageResponse)
    )
)]
pub async fn get_ability(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> Result<Json<AbilityView>, ApiError> {
    Ok(Json(controller(&state).get(&user, &id).await?))
}

#[utoipa::path(
    post,
    path = "/api/abilities",
    request_body = AbilityDraft,
    tag = "Abilities",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created; owners is the caller", body = AbilityView),
        (status = 400, body = MessageResponse),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn create_ability(
    State(state): State<AppState>,
    Auth(user): Auth,
    payload: Result<Json<AbilityDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<AbilityView>), ApiError> {
    let Json(draft) = payload?;
    let view = controller(&state).create(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    put,
    path = "/api/abilities/{id}",
    params(("id" = String, Path, description = "Ability id")),
    request_body = AbilityPatch,
    tag = "Abilities",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = AbilityView),
        (status = 400, body = MessageResponse),
        (status = 403, body = MessageResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn update_ability(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    payload: Result<Json<AbilityPatch>, JsonRejection>,
) -> Result<Json<AbilityView>, ApiError> {
    AccessController::<Ability>::parse_id(&id)?;
    let Json(patch) = payload?;
    Ok(Json(controller(&state).update(&user, &id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/abilities/{id}",
    params(("id" = String, Path, description = "Ability id")),
    tag = "Abilities",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, body = MessageResponse),
        (status = 403, body = MessageResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn delete_ability(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    controller(&state).delete(&user, &id).await?;
    Ok(Json(MessageResponse::new("Ability deleted successfully")))
}
