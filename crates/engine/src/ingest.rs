//! Event ingestion.
//!
//! Platform events start tracking new posts and trigger immediate updates
//! when a tracked user's content changes. Events that arrive without the
//! fields a handler needs are rejected or ignored, never guessed at.

use serde::{Deserialize, Serialize};
use stonks_api::PlatformClient;
use stonks_primitives::{Clock, CommunityId, PostId, Score, Timestamp, UserId};
use stonks_storage::ScoreStore;
use tracing::{debug, info};

use crate::{CycleOutcome, Engine, IngestError, Settings};

/// Who caused a post deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventSource {
    /// The post's author.
    User,
    /// A community moderator.
    Moderator,
    /// The platform itself.
    Admin,
    Unknown,
}

/// A post as carried by a submission event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedPost {
    pub id: PostId,
    pub score: Score,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSubmitEvent {
    pub post: Option<SubmittedPost>,
    pub author: Option<UserId>,
    pub community: Option<CommunityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDeleteEvent {
    pub author: Option<UserId>,
    pub community: Option<CommunityId>,
    pub source: EventSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModActionEvent {
    /// Platform name of the action, for logging.
    pub action: String,
    pub target_post: Option<PostId>,
    pub target_author: Option<UserId>,
    pub community: Option<CommunityId>,
}

/// What an ingestion handler did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event was dropped, with the reason.
    Ignored(&'static str),
    /// The user's cycle ran.
    Updated(CycleOutcome),
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore,
    P: PlatformClient,
    C: Clock,
{
    /// A post was submitted. Starts tracking it when submissions are accepted
    /// and updates the author right away.
    pub async fn on_post_submit(
        &self,
        settings: &Settings,
        event: PostSubmitEvent,
    ) -> Result<IngestOutcome, IngestError> {
        if !settings.accepting_new_submissions {
            debug!("not accepting new submissions");
            return Ok(IngestOutcome::Ignored("not accepting new submissions"));
        }

        let post = event.post.ok_or(IngestError::MissingField("post"))?;
        let author = event.author.ok_or(IngestError::MissingField("author"))?;
        let community = event
            .community
            .ok_or(IngestError::MissingField("community"))?;

        self.scores.user_seen(&author, post.created_at)?;

        // A repeated submission event must not lower a score we already hold.
        let score = self.scores.post_score(&author, &post.id, post.score).max(post.score);
        self.scores.record_post(&author, &post.id, score)?;
        info!(user = %author, post = %post.id, score, "tracking post");

        let outcome = self.update_user(settings, &author, &community).await?;
        Ok(IngestOutcome::Updated(outcome))
    }

    /// A post was deleted. Updates the author if they are tracked.
    ///
    /// With updates disabled only deletions by the author themselves count.
    pub async fn on_post_delete(
        &self,
        settings: &Settings,
        event: PostDeleteEvent,
    ) -> Result<IngestOutcome, IngestError> {
        if settings.disable_updates && event.source != EventSource::User {
            debug!(source = %event.source, "updates disabled, ignoring deletion");
            return Ok(IngestOutcome::Ignored("updates disabled"));
        }

        let author = event.author.ok_or(IngestError::MissingField("author"))?;
        let community = event
            .community
            .ok_or(IngestError::MissingField("community"))?;

        if !self.scores.is_tracked(&author) {
            return Ok(IngestOutcome::Ignored("author not tracked"));
        }

        info!(user = %author, source = %event.source, "post deleted, updating author");
        let outcome = self.update_user(settings, &author, &community).await?;
        Ok(IngestOutcome::Updated(outcome))
    }

    /// A moderator acted on content. Updates the target author if tracked.
    pub async fn on_mod_action(
        &self,
        settings: &Settings,
        event: ModActionEvent,
    ) -> Result<IngestOutcome, IngestError> {
        if settings.disable_updates {
            return Ok(IngestOutcome::Ignored("updates disabled"));
        }

        let (Some(_), Some(author), Some(community)) =
            (event.target_post, event.target_author, event.community)
        else {
            debug!(action = %event.action, "mod action without a target post");
            return Ok(IngestOutcome::Ignored("no target post"));
        };

        if !self.scores.is_tracked(&author) {
            return Ok(IngestOutcome::Ignored("author not tracked"));
        }

        info!(user = %author, action = %event.action, "mod action, updating author");
        let outcome = self.update_user(settings, &author, &community).await?;
        Ok(IngestOutcome::Updated(outcome))
    }
}
