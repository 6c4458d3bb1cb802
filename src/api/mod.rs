// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{middleware, routing::get, Router};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{promote_query_token, require_auth},
    models::{
        AbilityDraft, AbilityPatch, AbilitySummary, AbilityView, Appearance, CharacterDraft,
        CharacterPatch, CharacterSummary, CharacterView, CoreRank, Element, History,
        HistoryEvent, Personality, Relationships,
    },
    state::AppState,
};

pub mod abilities;
pub mod auth;
pub mod characters;
pub mod health;


/// Path of the Swagger UI.
pub const DOCS_PATH: &str = "/api-newworld-docs";

/// `{"message": "..."}` body used for confirmations and errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/characters",
            get(characters::list_characters).post(characters::create_character),
        )
        .route(
            "/characters/{id}",
            get(characters::get_character)
                .put(characters::update_character)
                .delete(characters::delete_character),
        )
        .route(
            "/abilities",
            get(abilities::list_abilities).post(abilities::create_ability),
        )
        .route(
            "/abilities/{id}",
            get(abilities::get_ability)
                .put(abilities::update_ability)
                .delete(abilities::delete_ability),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(middleware::from_fn(promote_query_token));

    Router::new()
        .nest("/api", api_routes)
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state)
        .merge(SwaggerUi::new(DOCS_PATH).url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "New World API",
        description = "Characters and abilities of the New World, scoped to the identities that own them."
    ),
    paths(
        auth::google_login,
        auth::google_callback,
        characters::list_characters,
        characters::get_character,
        characters::create_character,
        characters::update_character,
        characters::delete_character,
        abilities::list_abilities,
        abilities::get_ability,
        abilities::create_ability,
        abilities::update_ability,
        abilities::delete_ability,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            CharacterView,
            CharacterDraft,
            CharacterPatch,
            CharacterSummary,
            CoreRank,
            Appearance,
            Personality,
            History,
            HistoryEvent,
            Relationships,
            AbilityView,
            AbilityDraft,
            AbilityPatch,
            AbilitySummary,
            Element,
            MessageResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Auth", description = "External login and credential issuing"),
        (name = "Characters", description = "Characters owned by the caller"),
        (name = "Abilities", description = "Abilities owned by the caller"),
        (name = "Health", description = "Liveness and health probes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Credential from /auth/google, sent as Bearer <token>",
                        ))
                        .build(),
                ),
            )
        }
    }
}
