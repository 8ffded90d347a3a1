//! Badge synchronization.
//!
//! Deciding what to do with a badge is pure ([`plan_badge`]); applying it talks
//! to the platform. A badge that carries a foreign css class belongs to
//! someone else and is left alone unless overwriting is enabled.

use stonks_api::{Badge, BadgeUpdate, PlatformClient, PlatformUser};
use stonks_primitives::{Clock, CommunityId, Shares};
use stonks_storage::ScoreStore;
use tracing::{debug, info};

use crate::settings::{PLURAL_PLACEHOLDER, SHARES_PLACEHOLDER, Settings};
use crate::{CycleError, Engine};

/// What a sync did (or would do) to a badge.
#[derive(Debug, Clone, PartialEq, Eq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum BadgeAction {
    /// Assign a badge with this text.
    Set { text: String },
    /// Remove the existing badge.
    Remove,
    /// The badge already shows the right text.
    Unchanged,
    /// Nothing to show and nothing to remove.
    NoBadge,
    /// The current badge belongs to someone else.
    Ineligible,
}

/// Badge text for a shares value.
pub fn render_badge_text(template: &str, shares: Shares) -> String {
    template
        .replace(PLURAL_PLACEHOLDER, if shares > 1 { "s" } else { "" })
        .replace(SHARES_PLACEHOLDER, &shares.to_string())
}

/// Whether the engine may touch the user's current badge.
///
/// A badge without a css class is treated like no badge.
pub fn can_change_badge(settings: &Settings, current: Option<&Badge>) -> bool {
    if settings.badge_overwrite {
        return true;
    }
    match current.and_then(|badge| badge.css_class.as_deref()) {
        Some(css_class) => css_class == settings.badge_css_class,
        None => true,
    }
}

/// Decide the badge change for `shares`.
pub fn plan_badge(settings: &Settings, shares: Shares, current: Option<&Badge>) -> BadgeAction {
    if !can_change_badge(settings, current) {
        return BadgeAction::Ineligible;
    }

    if shares == 0 {
        return match current {
            Some(_) => BadgeAction::Remove,
            None => BadgeAction::NoBadge,
        };
    }

    let text = render_badge_text(&settings.badge_text, shares);
    if current.is_some_and(|badge| badge.text == text) {
        BadgeAction::Unchanged
    } else {
        BadgeAction::Set { text }
    }
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore,
    P: PlatformClient,
    C: Clock,
{
    /// Mirror `shares` into the user's badge, then move the user to the back
    /// of the reconciliation queue.
    ///
    /// If the platform call fails the queue is left untouched, so the user is
    /// retried first in the next batch.
    pub async fn sync_badge(
        &self,
        settings: &Settings,
        user: &PlatformUser,
        community: &CommunityId,
        shares: Shares,
        current: Option<&Badge>,
    ) -> Result<BadgeAction, CycleError> {
        let action = plan_badge(settings, shares, current);
        let kind: &'static str = (&action).into();

        match &action {
            BadgeAction::Set { text } => {
                let update = BadgeUpdate {
                    user: user.id.clone(),
                    display_name: user.display_name.clone(),
                    community: community.clone(),
                    text: text.clone(),
                    css_class: settings.badge_css_class.clone(),
                    template_id: settings.template_id().map(str::to_owned),
                };
                self.platform.set_badge(&update).await?;
                self.metrics.badge_set_total.increment(1);
                info!(user = %user.id, shares, %text, "badge set");
            }
            BadgeAction::Remove => {
                self.platform.remove_badge(&user.id, community).await?;
                self.metrics.badge_removed_total.increment(1);
                info!(user = %user.id, "badge removed");
            }
            BadgeAction::Unchanged | BadgeAction::NoBadge | BadgeAction::Ineligible => {
                debug!(user = %user.id, action = kind, "badge left as is");
            }
        }

        self.scores.enqueue(&user.id, self.clock.now())?;
        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use stonks_storage::MemoryScoreStore;
    use stonks_test_utils::{BadgeCall, ManualClock, MockPlatform};

    use super::*;

    fn badge(text: &str, css_class: Option<&str>) -> Badge {
        Badge {
            text: text.to_owned(),
            css_class: css_class.map(str::to_owned),
        }
    }

    #[test]
    fn test_render_badge_text() {
        let template = ":stonks: {{shares}} share{{s}}";
        assert_eq!(render_badge_text(template, 1), ":stonks: 1 share");
        assert_eq!(render_badge_text(template, 2), ":stonks: 2 shares");
        assert_eq!(render_badge_text(template, 0), ":stonks: 0 share");
        assert_eq!(render_badge_text("{{shares}}/{{shares}}", 3), "3/3");
    }

    #[test]
    fn test_eligibility() {
        let settings = Settings::default();
        assert!(can_change_badge(&settings, None));
        assert!(can_change_badge(&settings, Some(&badge("x", Some("april24")))));
        assert!(can_change_badge(&settings, Some(&badge("x", None))));
        assert!(!can_change_badge(&settings, Some(&badge("mod", Some("staff")))));

        let overwrite = Settings {
            badge_overwrite: true,
            ..Default::default()
        };
        assert!(can_change_badge(&overwrite, Some(&badge("mod", Some("staff")))));
    }

    #[test]
    fn test_plan_badge() {
        let settings = Settings::default();
        let ours = badge(":stonks: 3 shares", Some("april24"));

        assert_eq!(
            plan_badge(&settings, 3, None),
            BadgeAction::Set {
                text: ":stonks: 3 shares".into()
            }
        );
        assert_eq!(plan_badge(&settings, 3, Some(&ours)), BadgeAction::Unchanged);
        assert_matches!(plan_badge(&settings, 4, Some(&ours)), BadgeAction::Set { .. });
        assert_eq!(plan_badge(&settings, 0, Some(&ours)), BadgeAction::Remove);
        assert_eq!(plan_badge(&settings, 0, None), BadgeAction::NoBadge);
        assert_eq!(
            plan_badge(&settings, 3, Some(&badge("mod", Some("staff")))),
            BadgeAction::Ineligible
        );

        // Only the text decides whether a write is needed.
        assert_eq!(
            plan_badge(&settings, 3, Some(&badge(":stonks: 3 shares", None))),
            BadgeAction::Unchanged
        );
        let overwrite = Settings {
            badge_overwrite: true,
            ..Default::default()
        };
        assert_eq!(
            plan_badge(&overwrite, 3, Some(&badge(":stonks: 3 shares", Some("staff")))),
            BadgeAction::Unchanged
        );
        assert_matches!(
            plan_badge(&overwrite, 4, Some(&badge(":stonks: 3 shares", Some("staff")))),
            BadgeAction::Set { .. }
        );
    }

    #[tokio::test]
    async fn test_sync_sets_badge_and_advances_queue() {
        let store = Arc::new(MemoryScoreStore::new());
        let platform = Arc::new(MockPlatform::new("c1"));
        let engine = Engine::new(store.clone(), platform.clone(), ManualClock::new(500));
        let settings = Settings {
            badge_template_id: Some("tmpl".into()),
            ..Default::default()
        };

        let id = platform.add_user("u1", "alice");
        let user = PlatformUser {
            id: id.clone(),
            display_name: "alice".into(),
        };
        store.enqueue(&id, 10).unwrap();

        let action = engine
            .sync_badge(&settings, &user, &platform.community(), 2, None)
            .await
            .unwrap();
        assert_matches!(action, BadgeAction::Set { .. });
        assert_eq!(store.queue_position(&id).unwrap(), Some(500));
        assert_matches!(
            platform.calls().as_slice(),
            [BadgeCall::Set(update)] if update.template_id.as_deref() == Some("tmpl")
                && update.css_class == "april24"
                && update.text == ":stonks: 2 shares"
        );
    }

    #[tokio::test]
    async fn test_failed_sync_keeps_queue_position() {
        let store = Arc::new(MemoryScoreStore::new());
        let platform = Arc::new(MockPlatform::new("c1"));
        let engine = Engine::new(store.clone(), platform.clone(), ManualClock::new(500));

        let id = platform.add_user("u1", "alice");
        let user = PlatformUser {
            id: id.clone(),
            display_name: "alice".into(),
        };
        store.enqueue(&id, 10).unwrap();
        platform.fail_badge(&id, true);

        assert_matches!(
            engine
                .sync_badge(&Settings::default(), &user, &platform.community(), 2, None)
                .await,
            Err(CycleError::Platform(_))
        );
        assert_eq!(store.queue_position(&id).unwrap(), Some(10));
    }
}
