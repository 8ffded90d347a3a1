//! Core primitive types for stonks.
//!
//! # Types
//!
//! ## Identifiers
//! - [`UserId`] - Platform identifier of a content author
//! - [`PostId`] - Platform identifier of a tracked post
//! - [`CommunityId`] - Community in which badges are assigned
//!
//! ## Records
//! - [`ShareRecord`] - Stored shares value with the holder's display name
//! - [`RankedShares`] - One row of a ranked shares scan
//!
//! ## Time
//! - [`Timestamp`] - Unix milliseconds
//! - [`Clock`], [`SystemClock`] - Source of "now" passed into every core operation

mod clock;
mod ids;
mod records;

pub use clock::{Clock, SystemClock, Timestamp};
pub use ids::{CommunityId, PostId, UserId};
pub use records::{RankedShares, ShareRecord};

/// Score of a single post as reported by the platform.
///
/// Signed because platforms report net votes.
pub type Score = i64;

/// Derived reward value of a user. Never negative.
pub type Shares = u64;
