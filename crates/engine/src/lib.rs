//! Engagement to shares engine.
//!
//! [`Engine`] ties a [`ScoreStore`] and a [`PlatformClient`] together:
//! - [`Engine::reconcile`] recomputes a user's shares from the platform,
//! - [`Engine::sync_badge`] mirrors shares into the user's badge,
//! - [`Engine::update_user`] runs one full cycle for a user,
//! - [`Engine::run_batch`] walks the reconciliation queue,
//! - [`Engine::leaderboard`] ranks holders,
//! - the `on_*` handlers react to platform events.
//!
//! Settings are passed into every operation. The periodic job reads a fresh
//! snapshot from [`SharedSettings`] each time it runs.

mod badge;
mod batch;
mod cycle;
mod error;
mod ingest;
mod job;
mod leaderboard;
mod metrics;
mod reconcile;
pub mod settings;

use stonks_api::PlatformClient;
use stonks_primitives::{Clock, SystemClock};
use stonks_storage::{ScoreStore, Scores};

pub use badge::{BadgeAction, can_change_badge, plan_badge, render_badge_text};
pub use batch::BatchReport;
pub use cycle::CycleOutcome;
pub use error::{CycleError, IngestError};
pub use ingest::{
    EventSource, IngestOutcome, ModActionEvent, PostDeleteEvent, PostSubmitEvent, SubmittedPost,
};
pub use job::{JobState, RECONCILE_JOB_NAME, reconciliation_job};
pub use leaderboard::{LeaderboardEntry, LeaderboardPage, leaderboard_entries};
pub use reconcile::{Reconciliation, compute_shares};
pub use settings::{Settings, SettingsError, SharedSettings};

use crate::metrics::EngineMetrics;

/// The share tracking engine.
#[derive(Debug)]
pub struct Engine<S, P, C = SystemClock> {
    scores: Scores<S>,
    platform: P,
    clock: C,
    metrics: EngineMetrics,
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore,
    P: PlatformClient,
    C: Clock,
{
    pub fn new(store: S, platform: P, clock: C) -> Self {
        Self {
            scores: Scores::new(store),
            platform,
            clock,
            metrics: EngineMetrics::default(),
        }
    }

    pub fn scores(&self) -> &Scores<S> {
        &self.scores
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
