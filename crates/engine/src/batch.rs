//! Reconciliation batches over the queue.

use stonks_api::PlatformClient;
use stonks_primitives::{Clock, UserId};
use stonks_storage::ScoreStore;
use tracing::{error, info, warn};

use crate::{CycleError, CycleOutcome, Engine, Settings};

/// Summary of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Users in the queue when the batch started.
    pub queued: usize,
    /// Users whose cycle completed.
    pub updated: usize,
    /// Users the platform no longer knows. Their shares were still
    /// reconciled.
    pub missing: usize,
    /// Users whose cycle failed, with the reason.
    pub failed: Vec<(UserId, CycleError)>,
    /// The community could not be resolved, so nobody was processed.
    pub aborted: bool,
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore,
    P: PlatformClient,
    C: Clock,
{
    /// Update every queued user, least recently updated first.
    ///
    /// Users are processed sequentially. A failing user is logged and the
    /// batch continues with the next one.
    pub async fn run_batch(&self, settings: &Settings) -> BatchReport {
        let mut report = BatchReport::default();

        let community = match self.platform.current_community().await {
            Ok(community) => community,
            Err(e) => {
                error!(error = %e, "failed to resolve community, skipping batch");
                report.aborted = true;
                return report;
            }
        };

        let queue = self.scores.queue();
        report.queued = queue.len();

        for user in queue {
            self.metrics.batch_users_total.increment(1);
            match self.update_user(settings, &user, &community).await {
                Ok(CycleOutcome::Updated { .. }) => report.updated += 1,
                Ok(CycleOutcome::UserMissing { .. }) => report.missing += 1,
                Err(e) => {
                    self.metrics.batch_failures_total.increment(1);
                    error!(%user, error = %e, "user update failed");
                    report.failed.push((user, e));
                }
            }
        }

        if report.failed.is_empty() {
            info!(
                queued = report.queued,
                updated = report.updated,
                missing = report.missing,
                "batch complete"
            );
        } else {
            warn!(
                queued = report.queued,
                updated = report.updated,
                missing = report.missing,
                failed = report.failed.len(),
                "batch complete with failures"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use stonks_storage::MemoryScoreStore;
    use stonks_test_utils::{ManualClock, MockPlatform};

    use super::*;

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let store = Arc::new(MemoryScoreStore::new());
        let platform = Arc::new(MockPlatform::new("c1"));
        let engine = Engine::new(store.clone(), platform.clone(), ManualClock::new(1_000));

        let mut users = Vec::new();
        for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
            let user = platform.add_user(name, name);
            let post = platform.add_post(format!("p{i}"), &user, 10);
            store.record_post(&user, &post, 0).unwrap();
            store.enqueue(&user, i as u64).unwrap();
            users.push(user);
        }
        platform.fail_badge(&users[1], true);

        let report = engine.run_batch(&Settings::default()).await;
        assert_eq!(report.queued, 3);
        assert_eq!(report.updated, 2);
        assert_matches!(report.failed.as_slice(), [(user, CycleError::Platform(_))] if *user == users[1]);

        // The failed user keeps its slot at the front of the queue.
        assert_eq!(store.dequeue_all_ordered().unwrap(), vec![
            users[1].clone(),
            users[0].clone(),
            users[2].clone(),
        ]);
    }

    #[tokio::test]
    async fn test_deleted_account_drops_off_leaderboard() {
        let store = Arc::new(MemoryScoreStore::new());
        let platform = Arc::new(MockPlatform::new("c1"));
        let engine = Engine::new(store.clone(), platform.clone(), ManualClock::new(1_000));
        let settings = Settings::default();

        let user = platform.add_user("u", "alice");
        let post = platform.add_post("p1", &user, 50);
        store.record_post(&user, &post, 0).unwrap();
        store.enqueue(&user, 1).unwrap();
        assert_eq!(engine.run_batch(&settings).await.updated, 1);
        assert_eq!(engine.leaderboard(1).len(), 1);

        platform.delete_user(&user);
        platform.forget_post(&post);
        for _ in 0..3 {
            let report = engine.run_batch(&settings).await;
            assert_eq!(report.missing, 1);
            assert!(report.failed.is_empty());
        }

        assert!(engine.leaderboard(1).is_empty());
        assert_eq!(store.post_score(&user, &post).unwrap(), Some(0));
        assert_eq!(store.queue_position(&user).unwrap(), Some(1_000));
    }

    #[tokio::test]
    async fn test_unresolved_community_aborts() {
        let store = Arc::new(MemoryScoreStore::new());
        let platform = Arc::new(MockPlatform::new("c1"));
        let engine = Engine::new(store.clone(), platform.clone(), ManualClock::new(0));
        let user = platform.add_user("a", "a");
        store.enqueue(&user, 1).unwrap();
        platform.set_community_unavailable(true);

        let report = engine.run_batch(&Settings::default()).await;
        assert!(report.aborted);
        assert_eq!(report.queued, 0);
        assert_eq!(store.queue_position(&user).unwrap(), Some(1));
    }
}
