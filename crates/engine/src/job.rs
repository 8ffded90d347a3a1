//! The periodic reconciliation job.

use std::sync::Arc;

use futures_util::FutureExt;
use stonks_api::PlatformClient;
use stonks_primitives::Clock;
use stonks_storage::ScoreStore;
use stonks_tasks::{JobHandler, Scheduler, SchedulerError};
use tracing::{error, info};

use crate::{Engine, SharedSettings};

/// Name under which the batch job is registered.
pub const RECONCILE_JOB_NAME: &str = "share-reconciler";

/// State of the periodic job after a lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    Registered,
    Cancelled,
}

/// Job body: run one batch against a fresh settings snapshot.
pub fn reconciliation_job<S, P, C>(
    engine: Arc<Engine<S, P, C>>,
    settings: SharedSettings,
) -> JobHandler
where
    S: ScoreStore + 'static,
    P: PlatformClient + 'static,
    C: Clock + 'static,
{
    Arc::new(move || {
        let engine = Arc::clone(&engine);
        let settings = Arc::clone(&settings);
        async move {
            let snapshot = settings.read().clone();
            engine.run_batch(&snapshot).await;
        }
        .boxed()
    })
}

impl<S, P, C> Engine<S, P, C>
where
    S: ScoreStore + 'static,
    P: PlatformClient + 'static,
    C: Clock + 'static,
{
    /// Make the periodic job match the current settings: registered unless
    /// updates are disabled.
    ///
    /// Registering replaces any previous instance, so calling this on every
    /// install, upgrade or settings change leaves exactly one job.
    pub fn sync_job(
        self: &Arc<Self>,
        settings: &SharedSettings,
        scheduler: &dyn Scheduler,
    ) -> Result<JobState, SchedulerError> {
        let (disabled, interval) = {
            let snapshot = settings.read();
            (snapshot.disable_updates, snapshot.update_interval())
        };

        if disabled {
            scheduler.cancel(RECONCILE_JOB_NAME);
            info!("updates disabled, reconciliation job cancelled");
            return Ok(JobState::Cancelled);
        }

        let handler = reconciliation_job(Arc::clone(self), Arc::clone(settings));
        scheduler
            .register_periodic(RECONCILE_JOB_NAME, interval, handler)
            .inspect_err(|e| error!(error = %e, "failed to register reconciliation job"))?;
        Ok(JobState::Registered)
    }

    /// Install or upgrade of the app.
    pub fn on_app_changed(
        self: &Arc<Self>,
        settings: &SharedSettings,
        scheduler: &dyn Scheduler,
    ) -> Result<JobState, SchedulerError> {
        info!("app installed or upgraded");
        self.sync_job(settings, scheduler)
    }

    /// Settings were saved by the operator.
    pub fn on_settings_changed(
        self: &Arc<Self>,
        settings: &SharedSettings,
        scheduler: &dyn Scheduler,
    ) -> Result<JobState, SchedulerError> {
        info!("settings changed");
        self.sync_job(settings, scheduler)
    }
}
