//! Leaderboard queries.

use serde::{Deserialize, Serialize};
use stonks_api::PlatformClient;
use stonks_primitives::{Clock, Shares, UserId};
use stonks_storage::{ScoreStore, Scores};

use crate::Engine;

/// One ranked holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based rank.
    pub rank: usize,
    pub user_id: UserId,
    pub display_name: String,
    pub shares: Shares,
}

/// A page of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    /// 1-based page number, after clamping.
    pub page: usize,
    /// Number of pages, at least 1.
    pub max_page: usize,
}

impl LeaderboardPage {
    /// Cut page `page` (1-based) out of `entries`. Out of range pages are
    /// clamped to the first or last page.
    pub fn paginate(entries: &[LeaderboardEntry], page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let max_page = entries.len().div_ceil(page_size).max(1);
        let page = page.clamp(1, max_page);

        let entries = entries
            .iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        Self {
            entries,
            page,
            max_page,
        }
    }
}

/// Holders with at least `min_shares`, best first.
///
/// Ties are broken by who was seen first, then by user id. Returns an empty
/// list if the store cannot be read.
pub fn leaderboard_entries<S: ScoreStore>(
    scores: &Scores<S>,
    min_shares: Shares,
) -> Vec<LeaderboardEntry> {
    scores
        .ranked_shares(min_shares)
        .into_iter()
        .enumerate()
        .map(|(i, row)| LeaderboardEntry {
            rank: i + 1,
            user_id: row.user_id,
            display_name: row.display_name,
            shares: row.shares,
        })
        .collect()
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore,
    P: PlatformClient,
    C: Clock,
{
    /// See [`leaderboard_entries`].
    pub fn leaderboard(&self, min_shares: Shares) -> Vec<LeaderboardEntry> {
        leaderboard_entries(&self.scores, min_shares)
    }
}
