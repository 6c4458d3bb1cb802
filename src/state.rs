// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{IdentityBridge, TokenVerifier};
use crate::storage::DocumentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<TokenVerifier>,
    pub bridge: Arc<IdentityBridge>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        verifier: TokenVerifier,
        bridge: IdentityBridge,
    ) -> Self {
        Self {
            store,
            verifier: Arc::new(verifier),
            bridge: Arc::new(bridge),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::{RedirectTargets, SigningSecret, TokenIssuer};
    use crate::storage::MemoryStore;

    pub(crate) const TEST_SECRET: &str = "state-test-secret";

    /// In-memory state plus an issuer minting credentials it accepts.
    pub(crate) fn test_state() -> (AppState, TokenIssuer) {
        let secret = SigningSecret::new(TEST_SECRET);
        let bridge = IdentityBridge::new(
            None,
            &secret,
            3600,
            RedirectTargets {
                success: "/api-newworld-docs/".into(),
                failure: "/".into(),
            },
        );
        let state = AppState::new(
            Arc::new(MemoryStore::new()),
            TokenVerifier::new(&secret),
            bridge,
        );
        (state, TokenIssuer::new(&secret, 3600))
    }
}
