use stonks_api::PlatformClient;
use stonks_primitives::{Clock, CommunityId, Shares, UserId};
use stonks_storage::ScoreStore;
use tracing::{debug, info};

use crate::{BadgeAction, CycleError, Engine, Settings};

/// Result of one user update cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Shares were reconciled and the badge synchronized.
    Updated { shares: Shares, badge: BadgeAction },
    /// The platform no longer knows the user. Shares were reconciled, the
    /// badge and queue position were left alone.
    UserMissing { shares: Shares },
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore,
    P: PlatformClient,
    C: Clock,
{
    /// Run one update cycle for a user: reconcile shares, sync the badge and
    /// move the user to the back of the queue.
    ///
    /// Shares are reconciled even when the platform no longer knows the user,
    /// so removed posts of a deleted account stop counting. Such a user keeps
    /// the stored display name, gets no badge sync and keeps their queue
    /// position.
    pub async fn update_user(
        &self,
        settings: &Settings,
        user: &UserId,
        community: &CommunityId,
    ) -> Result<CycleOutcome, CycleError> {
        let platform_user = self.platform.get_user(user).await?;

        let display_name = match &platform_user {
            Some(platform_user) => platform_user.display_name.clone(),
            None => self
                .scores
                .display_name(user)
                .unwrap_or_else(|| user.to_string()),
        };
        let reconciliation = self
            .reconcile(user, &display_name, settings.shares_factor)
            .await?;

        let Some(platform_user) = platform_user else {
            info!(%user, shares = reconciliation.shares, "user not found, badge sync skipped");
            return Ok(CycleOutcome::UserMissing {
                shares: reconciliation.shares,
            });
        };

        let current = self.platform.get_badge(user, community).await?;
        let badge = self
            .sync_badge(
                settings,
                &platform_user,
                community,
                reconciliation.shares,
                current.as_ref(),
            )
            .await?;

        debug!(%user, shares = reconciliation.shares, ?badge, "user updated");
        Ok(CycleOutcome::Updated {
            shares: reconciliation.shares,
            badge,
        })
    }
}
