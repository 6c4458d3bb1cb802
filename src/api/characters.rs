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
    models::{Character, CharacterDraft, CharacterPatch, CharacterView},
    state::AppState,
};

fn controller(state: &AppState) -> AccessController<'_, Character> {
    AccessController::new(state.store.as_ref())
}

#[utoipa::path(
    get,
    path = "/api/characters",
    tag = "Characters",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Characters owned by the caller", body = [CharacterView]),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn list_characters(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<Vec<CharacterView>>, ApiError> {
    Ok(Json(controller(&state).list(&user).await?))
}

#[utoipa::path(
    get,
    path = "/api/characters/{id}",
    params(("id" = String, Path, description = "Character id")),
    tag = "Characters",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = CharacterView),
        (status = 400, description = "Invalid character ID", body = MessageResponse),
        (status = 404, description = "Missing or owned by someone else", body = MessageResponse)
    )
)]
pub async fn get_character(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> Result<Json<CharacterView>, ApiError> {
    Ok(Json(controller(&state).get(&user, &id).await?))
}

#[utoipa::path(
    post,
    path = "/api/characters",
    request_body = CharacterDraft,
    tag = "Characters",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Created; owners is the caller", body = CharacterView),
        (status = 400, body = MessageResponse),
        (status = 401, body = MessageResponse)
    )
)]
pub async fn create_character(
    State(state): State<AppState>,
    Auth(user): Auth,
    payload: Result<Json<CharacterDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<CharacterView>), ApiError> {
    let Json(draft) = payload?;
    let view = controller(&state).create(&user, draft).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    put,
    path = "/api/characters/{id}",
    params(("id" = String, Path, description = "Character id")),
    request_body = CharacterPatch,
    tag = "Characters",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = CharacterView),
        (status = 400, body = MessageResponse),
        (status = 403, body = MessageResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn update_character(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
    payload: Result<Json<CharacterPatch>, JsonRejection>,
) -> Result<Json<CharacterView>, ApiError> {
    // A bad id is reported before a bad body.
    AccessController::<Character>::parse_id(&id)?;
    let Json(patch) = payload?;
    Ok(Json(controller(&state).update(&user, &id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/api/characters/{id}",
    params(("id" = String, Path, description = "Character id")),
    tag = "Characters",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, body = MessageResponse),
        (status = 400, body = MessageResponse),
        (status = 403, body = MessageResponse),
        (status = 404, body = MessageResponse)
    )
)]
pub async fn delete_character(
    State(state): State<AppState>,
    Auth(user): Auth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    controller(&state).delete(&user, &id).await?;
    Ok(Json(MessageResponse::new("Character deleted successfully")))
}
