use serde::{Deserialize, Serialize};
use stonks_primitives::{CommunityId, PostId, Score, UserId};

/// Authoritative state of a post.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PostStatus {
    pub id: PostId,
    /// `None` once the author deleted their account or the post.
    pub author: Option<UserId>,
    pub score: Score,
    pub removed: bool,
    pub deleted: bool,
    pub spam: bool,
    /// Who removed the post, if anyone.
    pub removed_by: Option<String>,
    /// Removal reason category, if any.
    pub removed_by_category: Option<String>,
}

impl PostStatus {
    /// Whether the post no longer earns credit.
    pub fn is_removed(&self) -> bool {
        self.author.is_none()
            || self.removed
            || self.deleted
            || self.spam
            || self.removed_by.is_some()
            || self.removed_by_category.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformUser {
    pub id: UserId,
    pub display_name: String,
}

/// A visible per-community label.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub css_class: Option<String>,
}

/// Request to assign a badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeUpdate {
    pub user: UserId,
    pub display_name: String,
    pub community: CommunityId,
    pub text: String,
    pub css_class: String,
    pub template_id: Option<String>,
}
