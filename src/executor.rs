//! Bounded Task Executor
//!
//! Runs a batch of independent validation closures on a fixed-width worker pool:
//! - **Bounded concurrency**: a rayon pool with exactly `width` threads
//! - **Index-addressed output**: task *i* writes only slot *i* of a preallocated buffer
//! - **Cooperative cancellation**: the token is checked before every dispatch,
//!   running tasks are never interrupted
//! - **Fail-fast dispatch**: after a failure at index *k*, undispatched tasks
//!   above *k* are skipped since they cannot change the reported error
//!
//! Batches issued from inside a running task (nested schemas) execute on the
//! same pool; waiting threads keep stealing work, so nesting cannot deadlock.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, trace};

use crate::config::ConfigError;
use crate::error::Result;

/// Cooperative cancellation signal shared by every task of one validation call
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Option<Weak<AtomicBool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that is never cancelled
    pub fn none() -> Self {
        Self::default()
    }

    /// Token observing `flag`. Once every strong reference to the flag is
    /// dropped the token reports cancellation.
    pub fn watching(flag: &Arc<AtomicBool>) -> Self {
        Self {
            flag: Some(Arc::downgrade(flag)),
            deadline: None,
        }
    }

    /// Add a deadline `timeout` from now. `None` leaves the token unchanged.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            self.deadline = Instant::now().checked_add(timeout);
        }
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline, if any, has passed
    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Whether the watched flag was raised or its owner went away
    pub fn is_flagged(&self) -> bool {
        match &self.flag {
            Some(flag) => flag
                .upgrade()
                .is_none_or(|flag| flag.load(Ordering::Acquire)),
            None => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.is_flagged() || self.is_expired()
    }
}

/// Whether a failure stops dispatching later tasks of the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// Skip undispatched tasks with an index above the lowest failure
    #[default]
    FailFast,
    /// Dispatch every task regardless of failures
    RunAll,
}

/// Outcome of one batch. Slot *i* holds the result of task *i*, or `None`
/// when the task was never dispatched.
#[derive(Debug)]
pub struct Batch<R> {
    slots: Vec<Option<Result<R>>>,
    dispatched: usize,
    cancelled: bool,
}

impl<R> Batch<R> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of tasks that were started
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    /// Whether cancellation prevented at least one task from starting
    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn slots(&self) -> &[Option<Result<R>>] {
        &self.slots
    }

    pub fn into_slots(self) -> Vec<Option<Result<R>>> {
        self.slots
    }
}

/// Fixed-width worker pool shared by every batch of an engine
#[derive(Clone)]
pub struct TaskExecutor {
    pool: Arc<ThreadPool>,
    width: usize,
}

impl TaskExecutor {
    /// Create an executor with exactly `width` worker threads
    pub fn new(width: usize) -> std::result::Result<Self, ConfigError> {
        if width == 0 {
            return Err(ConfigError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(width)
            .thread_name(|index| format!("validate-json-{}", index))
            .build()?;

        debug!(width, "worker pool started");

        Ok(Self {
            pool: Arc::new(pool),
            width,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run `tasks` under bounded parallelism and collect their results by index
    pub fn run_batch<R, F>(
        &self,
        tasks: &[F],
        policy: DispatchPolicy,
        token: &CancelToken,
    ) -> Batch<R>
    where
        F: Fn() -> Result<R> + Sync,
        R: Send,
    {
        let total = tasks.len();
        let mut slots: Vec<Option<Result<R>>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);

        if total == 0 {
            return Batch {
                slots,
                dispatched: 0,
                cancelled: false,
            };
        }

        debug!(tasks = total, width = self.width, ?policy, "dispatching batch");

        let dispatched = AtomicUsize::new(0);
        let refused = AtomicBool::new(false);
        let first_failure = AtomicUsize::new(usize::MAX);

        self.pool.install(|| {
            slots
                .par_iter_mut()
                .zip(tasks.par_iter())
                .enumerate()
                .for_each(|(index, (slot, task))| {
                    if token.is_cancelled() {
                        refused.store(true, Ordering::Relaxed);
                        return;
                    }
                    if policy == DispatchPolicy::FailFast
                        && index > first_failure.load(Ordering::Acquire)
                    {
                        return;
                    }

                    dispatched.fetch_add(1, Ordering::Relaxed);
                    let result = task();
                    if result.is_err() {
                        first_failure.fetch_min(index, Ordering::AcqRel);
                    }
                    *slot = Some(result);
                });
        });

        let batch = Batch {
            slots,
            dispatched: dispatched.into_inner(),
            cancelled: refused.into_inner(),
        };
        trace!(
            dispatched = batch.dispatched,
            cancelled = batch.cancelled,
            "batch finished"
        );
        batch
    }

    /// Run `job` in the background on this executor's pool
    pub(crate) fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(job);
    }
}

impl fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("width", &self.width)
            .finish()
    }
}
