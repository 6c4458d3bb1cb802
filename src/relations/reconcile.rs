// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relationship Reconciler
//!
//! Background task that prunes dangling ids from both relationship lists.
//! Deleting a character or ability does not cascade, so documents that
//! linked to it keep the id until this pass (or a later write) drops it.
//!
//! ## Strategy
//!
//! Every `interval` (default 300 s) the reconciler:
//! 1. Loads every character and every ability, regardless of owner.
//! 2. Checks each document's links against the counterpart collection.
//! 3. Rewrites only the link field of documents that had dangling ids, and
//!    only if that field still holds the list read in step 1.
//!
//! It never adds ids, so the two lists are not mirrored into each other.
//! A document whose links were rewritten by a user during the sweep is left
//! alone; the next sweep looks at it again.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::{Ability, Character, DocumentId, Resource};
use crate::storage::{DocumentStore, Repository, StoreResult, UpdateOutcome};

/// Default interval between reconciliation sweeps.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(300);

/// Background reconciler for the character/ability link lists.
pub struct Reconciler {
    store: Arc<dyn DocumentStore>,
    interval: Duration,
}

impl Reconciler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            interval: DEFAULT_RECONCILE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the reconciler loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(reconciler.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Relationship reconciler starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Relationship reconciler shutting down");
                    return;
                }
            }

            match self.sweep().await {
                Ok(0) => {}
                Ok(pruned) => info!(documents = pruned, "Reconciler: pruned dangling links"),
                Err(e) => warn!(error = %e, "Reconciler: sweep failed"),
            }
        }
    }

    /// One pass over both collections. Returns how many documents changed.
    pub async fn sweep(&self) -> StoreResult<usize> {
        let characters = prune::<Character>(self.store.as_ref()).await?;
        let abilities = prune::<Ability>(self.store.as_ref()).await?;
        Ok(characters + abilities)
    }
}

async fn prune<R: Resource>(store: &dyn DocumentStore) -> StoreResult<usize> {
    let repo = Repository::<R>::new(store);
    let documents = repo.list_all().await?;

    let referenced: Vec<DocumentId> = documents
        .iter()
        .flat_map(|document| document.links().iter().copied())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if referenced.is_empty() {
        return Ok(0);
    }
    let existing = store
        .existing_ids(R::COLLECTION.counterpart(), &referenced)
        .await?;

    let mut changed = 0;
    for document in &documents {
        let kept: Vec<DocumentId> = document
            .links()
            .iter()
            .copied()
            .filter(|id| existing.contains(id))
            .collect();
        if kept.len() == document.links().len() {
            continue;
        }
        match repo
            .replace_links(document.id(), document.links(), &kept)
            .await?
        {
            UpdateOutcome::Updated => changed += 1,
            UpdateOutcome::NotFound => {}
            UpdateOutcome::Conflict => {
                info!(
                    kind = R::KIND,
                    id = %document.id(),
                    "Reconciler: links changed during sweep, skipped"
                );
            }
        }
    }
    Ok(changed)
}
