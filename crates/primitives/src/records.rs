use serde::{Deserialize, Serialize};

use crate::{Shares, UserId};

/// Shares value persisted for a user after reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub display_name: String,
    pub shares: Shares,
}

/// One row returned by a ranked shares scan, highest shares first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedShares {
    pub user_id: UserId,
    pub display_name: String,
    pub shares: Shares,
}
