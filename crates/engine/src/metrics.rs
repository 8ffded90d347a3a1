//! Engine metrics

use metrics::Counter;

/// Engine metrics
#[derive(Clone, Debug)]
pub(crate) struct EngineMetrics {
    /// Number of reconciliations performed
    pub(crate) reconcile_total: Counter,
    /// Number of tracked posts found removed during reconciliation
    pub(crate) removed_posts_total: Counter,
    /// Number of post lookups that failed during reconciliation
    pub(crate) unreachable_posts_total: Counter,
    /// Number of badges assigned
    pub(crate) badge_set_total: Counter,
    /// Number of badges removed
    pub(crate) badge_removed_total: Counter,
    /// Number of users processed by batches
    pub(crate) batch_users_total: Counter,
    /// Number of failed user cycles within batches
    pub(crate) batch_failures_total: Counter,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self {
            reconcile_total: metrics::counter!("stonks.reconcile.total"),
            removed_posts_total: metrics::counter!("stonks.reconcile.removed_posts_total"),
            unreachable_posts_total: metrics::counter!("stonks.reconcile.unreachable_posts_total"),
            badge_set_total: metrics::counter!("stonks.badge.set_total"),
            badge_removed_total: metrics::counter!("stonks.badge.removed_total"),
            batch_users_total: metrics::counter!("stonks.batch.users_total"),
            batch_failures_total: metrics::counter!("stonks.batch.failures_total"),
        }
    }
}
