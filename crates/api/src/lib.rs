//! Platform client trait definitions.
//!
//! This crate defines the [`PlatformClient`] trait through which the engine
//! reads authoritative post scores and manages user badges. Implementations
//! wrap a concrete platform API; tests use an in-memory fake.

mod error;
mod types;

use async_trait::async_trait;
use stonks_primitives::{CommunityId, PostId, UserId};

pub use error::{PlatformError, PlatformResult};
pub use types::{Badge, BadgeUpdate, PlatformUser, PostStatus};

/// Remote platform hosting the tracked content.
///
/// Every call is expected to complete within a bounded time or fail with
/// [`PlatformError::Timeout`]. The engine treats all failures as per-item
/// and never aborts a batch on them.
#[async_trait]
#[auto_impl::auto_impl(&, Box, Arc)]
pub trait PlatformClient: Send + Sync {
    /// Current state of a post. `None` if the platform no longer knows it.
    async fn get_post(&self, id: &PostId) -> PlatformResult<Option<PostStatus>>;

    /// Look up a user. `None` if deleted or suspended.
    async fn get_user(&self, id: &UserId) -> PlatformResult<Option<PlatformUser>>;

    /// Badge currently assigned to the user in the community.
    async fn get_badge(
        &self,
        user: &UserId,
        community: &CommunityId,
    ) -> PlatformResult<Option<Badge>>;

    /// Assign a badge, replacing any existing one.
    async fn set_badge(&self, update: &BadgeUpdate) -> PlatformResult<()>;

    /// Remove the user's badge entirely.
    async fn remove_badge(&self, user: &UserId, community: &CommunityId) -> PlatformResult<()>;

    /// Community this installation runs in.
    async fn current_community(&self) -> PlatformResult<CommunityId>;
}
