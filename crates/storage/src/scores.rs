//! Degrading facade over a [`ScoreStore`].
//!
//! Reads that fail are logged and replaced with their fallback so a flaky
//! store shows up as "no data" for one cycle instead of aborting it. Writes
//! keep their `Result` so the caller can abort the affected item.

use std::collections::BTreeMap;

use stonks_primitives::{PostId, RankedShares, Score, Shares, Timestamp, UserId};
use tracing::{debug, info, warn};

use crate::{ScoreStore, StoreResult};

#[derive(Debug, Clone)]
pub struct Scores<S> {
    store: S,
}

impl<S: ScoreStore> Scores<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn record_post(&self, owner: &UserId, post: &PostId, score: Score) -> StoreResult<()> {
        self.store.record_post(owner, post, score)
    }

    pub fn record_posts(&self, owner: &UserId, posts: &BTreeMap<PostId, Score>) -> StoreResult<()> {
        self.store.record_posts(owner, posts)
    }

    /// Stored score, or `not_found` if the post is untracked or the store failed.
    pub fn post_score(&self, owner: &UserId, post: &PostId, not_found: Score) -> Score {
        match self.store.post_score(owner, post) {
            Ok(Some(score)) => score,
            Ok(None) => not_found,
            Err(e) => {
                debug!(%owner, %post, error = %e, "post score lookup failed");
                not_found
            }
        }
    }

    /// Tracked posts, empty if the store failed.
    pub fn tracked_posts(&self, owner: &UserId) -> BTreeMap<PostId, Score> {
        self.store.tracked_posts(owner).unwrap_or_else(|e| {
            warn!(%owner, error = %e, "failed to load tracked posts");
            BTreeMap::new()
        })
    }

    /// Whether the user has ever been observed. A failed read counts as unseen.
    pub fn is_tracked(&self, user: &UserId) -> bool {
        match self.store.first_seen(user) {
            Ok(seen) => seen.is_some(),
            Err(e) => {
                warn!(%user, error = %e, "failed to read first-seen record");
                false
            }
        }
    }

    /// Start tracking a user the first time they are observed: enqueue them
    /// and record the first-seen timestamp.
    ///
    /// Returns `true` if the user was new. The first-seen read is not
    /// degraded here, since treating a failed read as "unseen" would reset
    /// the user's queue position.
    pub fn user_seen(&self, user: &UserId, at: Timestamp) -> StoreResult<bool> {
        if self.store.first_seen(user)?.is_some() {
            return Ok(false);
        }
        info!(%user, at, "tracking new user");
        self.store.enqueue(user, at)?;
        self.store.mark_first_seen(user, at)?;
        Ok(true)
    }

    /// Move the user to the queue position of `at`.
    pub fn enqueue(&self, user: &UserId, at: Timestamp) -> StoreResult<()> {
        self.store.enqueue(user, at)
    }

    /// Queued users, oldest first. Empty if the store failed.
    pub fn queue(&self) -> Vec<UserId> {
        self.store.dequeue_all_ordered().unwrap_or_else(|e| {
            warn!(error = %e, "failed to read reconciliation queue");
            Vec::new()
        })
    }

    pub fn set_shares(&self, user: &UserId, display_name: &str, shares: Shares) -> StoreResult<()> {
        self.store.set_shares(user, display_name, shares)
    }

    /// Stored shares, or `not_found` if never reconciled or the store failed.
    pub fn shares(&self, user: &UserId, not_found: Shares) -> Shares {
        match self.store.shares(user) {
            Ok(Some(record)) => record.shares,
            Ok(None) => not_found,
            Err(e) => {
                debug!(%user, error = %e, "shares lookup failed");
                not_found
            }
        }
    }

    /// Display name stored with the user's shares. `None` if never
    /// reconciled or the store failed.
    pub fn display_name(&self, user: &UserId) -> Option<String> {
        match self.store.shares(user) {
            Ok(record) => record.map(|record| record.display_name),
            Err(e) => {
                debug!(%user, error = %e, "display name lookup failed");
                None
            }
        }
    }

    /// Ranked holders with at least `min_shares`. Empty if the store failed.
    pub fn ranked_shares(&self, min_shares: Shares) -> Vec<RankedShares> {
        self.store.ranked_shares(min_shares).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read shares ranking");
            Vec::new()
        })
    }
}
