//! Scheduler metrics

use core::fmt;
use metrics::Counter;

/// Scheduler metrics
#[derive(Clone, Debug)]
pub(crate) struct SchedulerMetrics {
    /// Number of periodic jobs registered
    pub(crate) jobs_registered_total: Counter,
    /// Number of periodic jobs cancelled
    pub(crate) jobs_cancelled_total: Counter,
    /// Number of started job runs
    pub(crate) job_runs_total: Counter,
    /// Number of finished job runs
    pub(crate) finished_job_runs_total: Counter,
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self {
            jobs_registered_total: metrics::counter!("stonks.scheduler.jobs_registered_total"),
            jobs_cancelled_total: metrics::counter!("stonks.scheduler.jobs_cancelled_total"),
            job_runs_total: metrics::counter!("stonks.scheduler.job_runs_total"),
            finished_job_runs_total: metrics::counter!(
                "stonks.scheduler.finished_job_runs_total"
            ),
        }
    }
}

impl SchedulerMetrics {
    pub(crate) fn inc_registered(&self) {
        self.jobs_registered_total.increment(1);
    }

    pub(crate) fn inc_cancelled(&self) {
        self.jobs_cancelled_total.increment(1);
    }

    /// Counts a started run and returns a guard counting its completion.
    pub(crate) fn start_run(&self) -> IncCounterOnDrop {
        self.job_runs_total.increment(1);
        IncCounterOnDrop::new(self.finished_job_runs_total.clone())
    }
}

/// Helper type for increasing counters even if a job run panics
pub(crate) struct IncCounterOnDrop(Counter);

impl fmt::Debug for IncCounterOnDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IncCounterOnDrop").finish()
    }
}

impl IncCounterOnDrop {
    pub(crate) const fn new(counter: Counter) -> Self {
        Self(counter)
    }
}

impl Drop for IncCounterOnDrop {
    /// Increment the counter when the instance is dropped.
    fn drop(&mut self) {
        self.0.increment(1);
    }
}
