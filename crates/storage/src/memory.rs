//! In-memory score store (does not persist across restarts).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use stonks_primitives::{PostId, RankedShares, Score, ShareRecord, Shares, Timestamp, UserId};

use crate::{ScoreStore, StoreError, StoreResult, rank_order};

#[derive(Debug, Default)]
struct Inner {
    posts: BTreeMap<(UserId, PostId), Score>,
    first_seen: HashMap<UserId, Timestamp>,
    queue_by_user: HashMap<UserId, Timestamp>,
    queue_order: BTreeSet<(Timestamp, UserId)>,
    shares: HashMap<UserId, ShareRecord>,
}

/// In-memory score store for tests and ephemeral runs.
///
/// [`set_unavailable`](Self::set_unavailable) makes every operation fail with
/// [`StoreError::Unavailable`] until cleared.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of post records held.
    pub fn post_count(&self) -> usize {
        self.inner.read().posts.len()
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

impl ScoreStore for MemoryScoreStore {
    fn record_post(&self, owner: &UserId, post: &PostId, score: Score) -> StoreResult<()> {
        self.check()?;
        self.inner
            .write()
            .posts
            .insert((owner.clone(), post.clone()), score);
        Ok(())
    }

    fn record_posts(&self, owner: &UserId, posts: &BTreeMap<PostId, Score>) -> StoreResult<()> {
        self.check()?;
        let mut inner = self.inner.write();
        for (post, score) in posts {
            inner.posts.insert((owner.clone(), post.clone()), *score);
        }
        Ok(())
    }

    fn post_score(&self, owner: &UserId, post: &PostId) -> StoreResult<Option<Score>> {
        self.check()?;
        Ok(self
            .inner
            .read()
            .posts
            .get(&(owner.clone(), post.clone()))
            .copied())
    }

    fn tracked_posts(&self, owner: &UserId) -> StoreResult<BTreeMap<PostId, Score>> {
        self.check()?;
        let inner = self.inner.read();
        Ok(inner
            .posts
            .range((owner.clone(), PostId::new(""))..)
            .take_while(|((o, _), _)| o == owner)
            .map(|((_, post), score)| (post.clone(), *score))
            .collect())
    }

    fn first_seen(&self, user: &UserId) -> StoreResult<Option<Timestamp>> {
        self.check()?;
        Ok(self.inner.read().first_seen.get(user).copied())
    }

    fn mark_first_seen(&self, user: &UserId, at: Timestamp) -> StoreResult<()> {
        self.check()?;
        self.inner
            .write()
            .first_seen
            .entry(user.clone())
            .or_insert(at);
        Ok(())
    }

    fn enqueue(&self, user: &UserId, at: Timestamp) -> StoreResult<()> {
        self.check()?;
        let mut inner = self.inner.write();
        if let Some(old) = inner.queue_by_user.insert(user.clone(), at) {
            inner.queue_order.remove(&(old, user.clone()));
        }
        inner.queue_order.insert((at, user.clone()));
        Ok(())
    }

    fn queue_position(&self, user: &UserId) -> StoreResult<Option<Timestamp>> {
        self.check()?;
        Ok(self.inner.read().queue_by_user.get(user).copied())
    }

    fn queue_entries(&self) -> StoreResult<Vec<(UserId, Timestamp)>> {
        self.check()?;
        Ok(self
            .inner
            .read()
            .queue_order
            .iter()
            .map(|(at, user)| (user.clone(), *at))
            .collect())
    }

    fn set_shares(&self, user: &UserId, display_name: &str, shares: Shares) -> StoreResult<()> {
        self.check()?;
        self.inner.write().shares.insert(
            user.clone(),
            ShareRecord {
                display_name: display_name.to_owned(),
                shares,
            },
        );
        Ok(())
    }

    fn shares(&self, user: &UserId) -> StoreResult<Option<ShareRecord>> {
        self.check()?;
        Ok(self.inner.read().shares.get(user).cloned())
    }

    fn ranked_shares(&self, min_shares: Shares) -> StoreResult<Vec<RankedShares>> {
        self.check()?;
        let inner = self.inner.read();
        let mut rows: Vec<_> = inner
            .shares
            .iter()
            .filter(|(_, record)| record.shares >= min_shares)
            .map(|(user, record)| {
                (
                    RankedShares {
                        user_id: user.clone(),
                        display_name: record.display_name.clone(),
                        shares: record.shares,
                    },
                    inner.first_seen.get(user).copied(),
                )
            })
            .collect();
        drop(inner);

        rank_order(&mut rows);
        Ok(rows.into_iter().map(|(row, _)| row).collect())
    }
}
