//! Test fakes for the stonks engine.
//!
//! [`MockPlatform`] keeps posts, users and badges in memory, records every
//! badge mutation and can be told to fail specific calls. [`ManualClock`]
//! only moves when a test moves it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use stonks_api::{
    Badge, BadgeUpdate, PlatformClient, PlatformError, PlatformResult, PlatformUser, PostStatus,
};
use stonks_primitives::{Clock, CommunityId, PostId, Score, Timestamp, UserId};

/// Clock advanced by hand.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn set(&self, now: Timestamp) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Timestamp) {
        self.0.fetch_add(by, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.0.load(Ordering::SeqCst)
    }
}

/// A badge mutation observed by [`MockPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeCall {
    Set(BadgeUpdate),
    Remove(UserId, CommunityId),
}

#[derive(Debug, Default)]
struct State {
    community: CommunityId,
    posts: HashMap<PostId, PostStatus>,
    users: HashMap<UserId, PlatformUser>,
    badges: HashMap<(UserId, CommunityId), Badge>,
    calls: Vec<BadgeCall>,
    failing_posts: HashSet<PostId>,
    failing_users: HashSet<UserId>,
    failing_badges: HashSet<UserId>,
    community_unavailable: bool,
}

/// In-memory [`PlatformClient`].
#[derive(Debug, Default)]
pub struct MockPlatform {
    state: RwLock<State>,
}

impl MockPlatform {
    pub fn new(community: impl Into<CommunityId>) -> Self {
        let platform = Self::default();
        platform.state.write().community = community.into();
        platform
    }

    pub fn community(&self) -> CommunityId {
        self.state.read().community.clone()
    }

    /// Add a user the platform knows about.
    pub fn add_user(&self, id: impl Into<UserId>, display_name: &str) -> UserId {
        let id = id.into();
        self.state.write().users.insert(
            id.clone(),
            PlatformUser {
                id: id.clone(),
                display_name: display_name.to_owned(),
            },
        );
        id
    }

    /// Forget a user, as if the account was deleted.
    pub fn delete_user(&self, id: &UserId) {
        self.state.write().users.remove(id);
    }

    /// Add or replace a live post.
    pub fn add_post(&self, id: impl Into<PostId>, author: &UserId, score: Score) -> PostId {
        let id = id.into();
        self.state.write().posts.insert(
            id.clone(),
            PostStatus {
                id: id.clone(),
                author: Some(author.clone()),
                score,
                ..Default::default()
            },
        );
        id
    }

    pub fn set_score(&self, id: &PostId, score: Score) {
        if let Some(post) = self.state.write().posts.get_mut(id) {
            post.score = score;
        }
    }

    /// Apply an arbitrary change to a stored post.
    pub fn update_post(&self, id: &PostId, f: impl FnOnce(&mut PostStatus)) {
        if let Some(post) = self.state.write().posts.get_mut(id) {
            f(post);
        }
    }

    /// Mark a post as removed by moderators.
    pub fn remove_post(&self, id: &PostId) {
        self.update_post(id, |post| {
            post.removed = true;
            post.removed_by = Some("moderator".to_owned());
        });
    }

    /// Drop a post entirely, as if the platform no longer knows it.
    pub fn forget_post(&self, id: &PostId) {
        self.state.write().posts.remove(id);
    }

    /// Make lookups of this post fail until cleared.
    pub fn fail_post(&self, id: &PostId, failing: bool) {
        let mut state = self.state.write();
        if failing {
            state.failing_posts.insert(id.clone());
        } else {
            state.failing_posts.remove(id);
        }
    }

    /// Make user lookups for this user fail until cleared.
    pub fn fail_user(&self, id: &UserId, failing: bool) {
        let mut state = self.state.write();
        if failing {
            state.failing_users.insert(id.clone());
        } else {
            state.failing_users.remove(id);
        }
    }

    /// Make every badge call for this user fail until cleared.
    pub fn fail_badge(&self, id: &UserId, failing: bool) {
        let mut state = self.state.write();
        if failing {
            state.failing_badges.insert(id.clone());
        } else {
            state.failing_badges.remove(id);
        }
    }

    pub fn set_community_unavailable(&self, unavailable: bool) {
        self.state.write().community_unavailable = unavailable;
    }

    /// Assign a badge directly, bypassing the call log.
    pub fn put_badge(&self, user: &UserId, text: &str, css_class: Option<&str>) {
        let mut state = self.state.write();
        let key = (user.clone(), state.community.clone());
        state.badges.insert(
            key,
            Badge {
                text: text.to_owned(),
                css_class: css_class.map(str::to_owned),
            },
        );
    }

    /// Badge currently held in the installation community.
    pub fn badge(&self, user: &UserId) -> Option<Badge> {
        let state = self.state.read();
        state
            .badges
            .get(&(user.clone(), state.community.clone()))
            .cloned()
    }

    /// Every badge mutation, in call order.
    pub fn calls(&self) -> Vec<BadgeCall> {
        self.state.read().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.write().calls.clear();
    }

    fn check_badge(state: &State, user: &UserId) -> PlatformResult<()> {
        if state.failing_badges.contains(user) {
            return Err(PlatformError::Request(format!("badge call failed for {user}")));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn get_post(&self, id: &PostId) -> PlatformResult<Option<PostStatus>> {
        let state = self.state.read();
        if state.failing_posts.contains(id) {
            return Err(PlatformError::Timeout);
        }
        Ok(state.posts.get(id).cloned())
    }

    async fn get_user(&self, id: &UserId) -> PlatformResult<Option<PlatformUser>> {
        let state = self.state.read();
        if state.failing_users.contains(id) {
            return Err(PlatformError::Timeout);
        }
        Ok(state.users.get(id).cloned())
    }

    async fn get_badge(
        &self,
        user: &UserId,
        community: &CommunityId,
    ) -> PlatformResult<Option<Badge>> {
        let state = self.state.read();
        Self::check_badge(&state, user)?;
        Ok(state.badges.get(&(user.clone(), community.clone())).cloned())
    }

    async fn set_badge(&self, update: &BadgeUpdate) -> PlatformResult<()> {
        let mut state = self.state.write();
        Self::check_badge(&state, &update.user)?;
        state.badges.insert(
            (update.user.clone(), update.community.clone()),
            Badge {
                text: update.text.clone(),
                css_class: Some(update.css_class.clone()),
            },
        );
        state.calls.push(BadgeCall::Set(update.clone()));
        Ok(())
    }

    async fn remove_badge(&self, user: &UserId, community: &CommunityId) -> PlatformResult<()> {
        let mut state = self.state.write();
        Self::check_badge(&state, user)?;
        state.badges.remove(&(user.clone(), community.clone()));
        state
            .calls
            .push(BadgeCall::Remove(user.clone(), community.clone()));
        Ok(())
    }

    async fn current_community(&self) -> PlatformResult<CommunityId> {
        let state = self.state.read();
        if state.community_unavailable {
            return Err(PlatformError::Request("community unavailable".to_owned()));
        }
        Ok(state.community.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now(), 15);
        clock.set(1);
        assert_eq!(clock.now(), 1);
    }

    #[tokio::test]
    async fn test_mock_platform_badges_and_failures() {
        let platform = MockPlatform::new("c1");
        let user = platform.add_user("u1", "alice");
        let community = platform.community();

        let update = BadgeUpdate {
            user: user.clone(),
            display_name: "alice".into(),
            community: community.clone(),
            text: "1 share".into(),
            css_class: "april24".into(),
            template_id: None,
        };
        platform.set_badge(&update).await.unwrap();
        assert_eq!(platform.badge(&user).unwrap().text, "1 share");

        platform.fail_badge(&user, true);
        assert!(platform.get_badge(&user, &community).await.is_err());
        platform.fail_badge(&user, false);

        platform.remove_badge(&user, &community).await.unwrap();
        assert_eq!(platform.badge(&user), None);
        assert_eq!(
            platform.calls(),
            vec![BadgeCall::Set(update), BadgeCall::Remove(user, community)]
        );
    }
}
