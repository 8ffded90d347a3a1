//! Score reconciliation.
//!
//! Every tracked post of a user is re-read from the platform. Live posts keep
//! the larger of their stored and current score, removed posts drop to zero
//! and posts the platform could not be asked about are left alone for this
//! cycle. The updated scores are written back in one batch and the sum is
//! converted into shares.

use std::collections::BTreeMap;

use stonks_api::{PlatformClient, PostStatus};
use stonks_primitives::{Clock, PostId, Score, Shares, UserId};
use stonks_storage::ScoreStore;
use tracing::{debug, warn};

use crate::{CycleError, Engine};

/// Result of reconciling one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Shares now stored for the user.
    pub shares: Shares,
    /// Sum of the reconciled post scores.
    pub total_score: Score,
    /// Scores written back, by post.
    pub posts: BTreeMap<PostId, Score>,
    /// Posts found removed or deleted.
    pub removed: usize,
    /// Posts whose lookup failed and were skipped.
    pub unreachable: usize,
}

/// Shares earned by a cumulative score: `floor(total * factor)`, never negative.
///
/// The product is raised by 4 ULPs before flooring. Decimal factors such as
/// `0.01` are not exact in binary, so `2900 * 0.01` evaluates just below 29.
/// The same nudge rounds a product within 4 ULPs under an integer up to it.
pub fn compute_shares(total: Score, factor: f64) -> Shares {
    if total <= 0 || !factor.is_finite() || factor <= 0.0 {
        return 0;
    }
    let raw = total as f64 * factor;
    let nudged = raw + raw * f64::EPSILON * 4.0;
    nudged.floor() as Shares
}

/// Reconciled score for a tracked post given the platform's answer.
///
/// `None` means the post is gone from the platform.
pub(crate) fn reconciled_score(stored: Score, current: Option<&PostStatus>) -> Score {
    match current {
        Some(post) if !post.is_removed() => stored.max(post.score),
        _ => 0,
    }
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore,
    P: PlatformClient,
    C: Clock,
{
    /// Recompute and persist the user's shares.
    ///
    /// A user with no tracked posts gets zero shares and nothing is written.
    /// Fails only if a write fails.
    pub async fn reconcile(
        &self,
        user: &UserId,
        display_name: &str,
        shares_factor: f64,
    ) -> Result<Reconciliation, CycleError> {
        self.metrics.reconcile_total.increment(1);

        let tracked = self.scores.tracked_posts(user);
        if tracked.is_empty() {
            debug!(%user, "no tracked posts");
            return Ok(Reconciliation::default());
        }

        let mut reconciliation = Reconciliation::default();
        for (post, stored) in tracked {
            let current = match self.platform.get_post(&post).await {
                Ok(current) => current,
                Err(e) => {
                    warn!(%user, %post, error = %e, "post lookup failed, skipping for this cycle");
                    reconciliation.unreachable += 1;
                    continue;
                }
            };

            let score = reconciled_score(stored, current.as_ref());
            if current.as_ref().is_none_or(|post| post.is_removed()) {
                debug!(%user, %post, "tracked post removed");
                reconciliation.removed += 1;
            }

            reconciliation.total_score = reconciliation.total_score.saturating_add(score);
            reconciliation.posts.insert(post, score);
        }

        self.metrics
            .removed_posts_total
            .increment(reconciliation.removed as u64);
        self.metrics
            .unreachable_posts_total
            .increment(reconciliation.unreachable as u64);

        if !reconciliation.posts.is_empty() {
            self.scores.record_posts(user, &reconciliation.posts)?;
        }

        reconciliation.shares = compute_shares(reconciliation.total_score, shares_factor);
        self.scores
            .set_shares(user, display_name, reconciliation.shares)?;

        debug!(
            %user,
            shares = reconciliation.shares,
            total = reconciliation.total_score,
            posts = reconciliation.posts.len(),
            "reconciled"
        );
        Ok(reconciliation)
    }
}
