//! Periodic job scheduling with at most one live instance per job name.
//!
//! [`Scheduler`] is the contract the engine registers its reconciliation job
//! against. [`TaskScheduler`] implements it on a tokio runtime:
//! - re-registering a name replaces the previous job,
//! - runs of the same name never overlap, even across re-registration,
//! - cancelling lets an in-flight run finish before the job stops.

mod metrics;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use auto_impl::auto_impl;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::metrics::SchedulerMetrics;

/// Body of a periodic job, invoked once per tick.
pub type JobHandler = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Errors from job registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// No tokio runtime is available to drive jobs.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// The interval must be non-zero.
    #[error("invalid interval for job {0}")]
    InvalidInterval(String),
}

/// Periodic job registry.
#[auto_impl(&, Box, Arc)]
pub trait Scheduler: Send + Sync {
    /// Register a job to run every `interval`, replacing any job with the
    /// same name.
    fn register_periodic(
        &self,
        name: &str,
        interval: Duration,
        handler: JobHandler,
    ) -> Result<(), SchedulerError>;

    /// Stop a job. Returns `false` if no job of that name was registered.
    fn cancel(&self, name: &str) -> bool;

    fn is_registered(&self, name: &str) -> bool;
}

struct JobSlot {
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// tokio-backed [`Scheduler`].
pub struct TaskScheduler {
    runtime: Handle,
    jobs: Mutex<HashMap<String, JobSlot>>,
    /// Per-name run locks, kept across re-registration.
    run_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    metrics: SchedulerMetrics,
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("jobs", &self.jobs.lock().keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TaskScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            jobs: Mutex::new(HashMap::new()),
            run_locks: Mutex::new(HashMap::new()),
            metrics: SchedulerMetrics::default(),
        }
    }

    /// Scheduler on the runtime of the calling context.
    pub fn current() -> Result<Self, SchedulerError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| SchedulerError::NoRuntime)
    }

    /// Cancel every registered job.
    pub fn cancel_all(&self) {
        let names: Vec<String> = self.jobs.lock().keys().cloned().collect();
        for name in names {
            self.cancel(&name);
        }
    }

    fn run_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(
            self.run_locks
                .lock()
                .entry(name.to_owned())
                .or_default(),
        )
    }
}

impl Scheduler for TaskScheduler {
    fn register_periodic(
        &self,
        name: &str,
        interval: Duration,
        handler: JobHandler,
    ) -> Result<(), SchedulerError> {
        if interval.is_zero() {
            return Err(SchedulerError::InvalidInterval(name.to_owned()));
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let run_lock = self.run_lock(name);
        let metrics = self.metrics.clone();
        let job_name = name.to_owned();

        let handle = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => {
                        debug!(job = %job_name, "periodic job stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        let _running = run_lock.lock().await;
                        let _finished = metrics.start_run();
                        debug!(job = %job_name, "periodic job running");
                        handler().await;
                    }
                }
            }
        });

        let previous = self.jobs.lock().insert(
            name.to_owned(),
            JobSlot {
                stop: stop_tx,
                handle,
            },
        );
        if let Some(previous) = previous {
            debug!(job = %name, "replacing existing periodic job");
            let _ = previous.stop.send(true);
        }

        self.metrics.inc_registered();
        info!(job = %name, ?interval, "registered periodic job");
        Ok(())
    }

    fn cancel(&self, name: &str) -> bool {
        let Some(slot) = self.jobs.lock().remove(name) else {
            return false;
        };
        let _ = slot.stop.send(true);
        drop(slot.handle);

        self.metrics.inc_cancelled();
        info!(job = %name, "cancelled periodic job");
        true
    }

    fn is_registered(&self, name: &str) -> bool {
        self.jobs.lock().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::FutureExt;

    use super::*;

    fn counting_handler(counter: Arc<AtomicUsize>) -> JobHandler {
        Arc::new(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
            .boxed()
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_every_interval_until_cancelled() {
        let scheduler = TaskScheduler::current().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        scheduler
            .register_periodic("job", Duration::from_secs(60), counting_handler(runs.clone()))
            .unwrap();
        assert!(scheduler.is_registered("job"));

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        assert!(scheduler.cancel("job"));
        assert!(!scheduler.is_registered("job"));
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        assert!(!scheduler.cancel("job"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reregistering_keeps_a_single_instance() {
        let scheduler = TaskScheduler::current().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            scheduler
                .register_periodic("job", Duration::from_secs(60), counting_handler(runs.clone()))
                .unwrap();
        }

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        scheduler.cancel_all();
    }

    #[tokio::test]
    async fn test_zero_interval_is_rejected() {
        let scheduler = TaskScheduler::current().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        assert_eq!(
            scheduler.register_periodic("job", Duration::ZERO, counting_handler(runs)),
            Err(SchedulerError::InvalidInterval("job".into()))
        );
        assert!(!scheduler.is_registered("job"));
    }

    #[test]
    fn test_no_runtime() {
        assert_eq!(TaskScheduler::current().unwrap_err(), SchedulerError::NoRuntime);
    }
}
