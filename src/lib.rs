// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! New World - Knowledge Base Service
//!
//! REST service for the characters and abilities of a fantasy world. Every
//! document belongs to the identities in its owner set; identity comes from
//! an external OAuth provider and is carried as a locally issued bearer
//! credential.
//!
//! ## Modules
//!
//! - `api` - HTTP routes and handlers (Axum), OpenAPI document
//! - `auth` - External login bridge, credential issuing and verification
//! - `access` - Ownership-scoped CRUD over characters and abilities
//! - `relations` - Character/ability link filtering, expansion, reconciliation
//! - `storage` - Document store backends (memory, JSON files)

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod relations;
pub mod state;
pub mod storage;
