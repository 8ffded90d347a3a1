//! Ordered score store.
//!
//! Four logical indices back the engine:
//! - tracked posts: `(owner, post) -> score`
//! - first seen: `user -> timestamp`, written once
//! - reconciliation queue: `user -> last processed`, iterated oldest first
//! - shares: `user -> (display name, shares)`
//!
//! [`ScoreStore`] is the raw contract and surfaces every failure as
//! [`StoreError`]. [`Scores`] wraps a store and degrades failed reads to
//! their documented fallbacks.

mod memory;
mod redb_store;
mod scores;

use std::collections::BTreeMap;

use auto_impl::auto_impl;
use stonks_primitives::{PostId, RankedShares, Score, ShareRecord, Shares, Timestamp, UserId};

pub use memory::MemoryScoreStore;
pub use redb_store::RedbScoreStore;
pub use scores::Scores;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error type.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or the operation failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A stored value could not be decoded.
    #[error("failed to decode a stored value: {0}")]
    Decode(String),
}

/// Ordered key-value store behind the reconciliation engine.
///
/// Implementations must be thread-safe. No operation is transactional
/// across calls; callers rely on writes being monotonic or idempotent.
#[auto_impl(&, Box, Arc)]
pub trait ScoreStore: Send + Sync {
    /// Upsert the stored score of a post.
    fn record_post(&self, owner: &UserId, post: &PostId, score: Score) -> StoreResult<()>;

    /// Upsert many posts of one owner in a single write.
    fn record_posts(&self, owner: &UserId, posts: &BTreeMap<PostId, Score>) -> StoreResult<()> {
        for (post, score) in posts {
            self.record_post(owner, post, *score)?;
        }
        Ok(())
    }

    /// Stored score of a post, `None` if it is not tracked.
    fn post_score(&self, owner: &UserId, post: &PostId) -> StoreResult<Option<Score>>;

    /// All tracked posts of an owner.
    fn tracked_posts(&self, owner: &UserId) -> StoreResult<BTreeMap<PostId, Score>>;

    /// When the user was first observed.
    fn first_seen(&self, user: &UserId) -> StoreResult<Option<Timestamp>>;

    /// Record the first observation of a user. A second call for the same
    /// user leaves the original timestamp in place.
    fn mark_first_seen(&self, user: &UserId, at: Timestamp) -> StoreResult<()>;

    /// Insert the user into the queue, or move them to the position of `at`.
    fn enqueue(&self, user: &UserId, at: Timestamp) -> StoreResult<()>;

    /// Queue timestamp of a user, `None` if not queued.
    fn queue_position(&self, user: &UserId) -> StoreResult<Option<Timestamp>>;

    /// Every queue entry, oldest timestamp first, ties by user id.
    fn queue_entries(&self) -> StoreResult<Vec<(UserId, Timestamp)>>;

    /// Queued users, oldest timestamp first. Does not remove anything.
    fn dequeue_all_ordered(&self) -> StoreResult<Vec<UserId>> {
        Ok(self
            .queue_entries()?
            .into_iter()
            .map(|(user, _)| user)
            .collect())
    }

    fn set_shares(&self, user: &UserId, display_name: &str, shares: Shares) -> StoreResult<()>;

    /// Stored shares, `None` if the user was never reconciled.
    fn shares(&self, user: &UserId) -> StoreResult<Option<ShareRecord>>;

    /// Users holding at least `min_shares`, ordered by [`rank_order`].
    fn ranked_shares(&self, min_shares: Shares) -> StoreResult<Vec<RankedShares>>;
}

/// Sort rows for a ranked scan: shares descending, then earliest first-seen,
/// then user id. Rows without a first-seen record sort after those with one.
pub fn rank_order(rows: &mut [(RankedShares, Option<Timestamp>)]) {
    rows.sort_by(|(a, a_seen), (b, b_seen)| {
        b.shares
            .cmp(&a.shares)
            .then_with(|| a_seen.unwrap_or(Timestamp::MAX).cmp(&b_seen.unwrap_or(Timestamp::MAX)))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}
