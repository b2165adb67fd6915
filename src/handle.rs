//! Execution handles
//!
//! A validation started in the background is represented by an
//! `ExecutionHandle`. The caller owns the cancel flag and the state cell; the
//! background job only holds weak references to them, so dropping the handle
//! cancels the job.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, debug_span, warn};
use uuid::Uuid;

use crate::error::{Result, ValidationError};
use crate::executor::{CancelToken, TaskExecutor};

/// Lifecycle of a background validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl HandleState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => HandleState::Completed,
            2 => HandleState::Failed,
            3 => HandleState::Cancelled,
            _ => HandleState::Running,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            HandleState::Running => 0,
            HandleState::Completed => 1,
            HandleState::Failed => 2,
            HandleState::Cancelled => 3,
        }
    }

    fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => HandleState::Completed,
            Err(ValidationError::Cancelled) => HandleState::Cancelled,
            Err(_) => HandleState::Failed,
        }
    }
}

/// Caller-owned handle to an in-flight or finished validation
pub struct ExecutionHandle<T> {
    id: Uuid,
    cancel: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    receiver: oneshot::Receiver<Result<T>>,
}

impl<T: Send + 'static> ExecutionHandle<T> {
    /// Start `job` on the executor's pool. The job receives a token tied to
    /// this handle and to the optional `timeout`.
    pub(crate) fn spawn<F>(executor: &TaskExecutor, timeout: Option<Duration>, job: F) -> Self
    where
        F: FnOnce(&CancelToken) -> Result<T> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        let state = Arc::new(AtomicU8::new(HandleState::Running.as_u8()));
        let (sender, receiver) = oneshot::channel();

        let token = CancelToken::watching(&cancel).with_timeout(timeout);
        let flag = Arc::downgrade(&cancel);
        let cell = Arc::downgrade(&state);

        executor.spawn(move || {
            let span = debug_span!("handle", %id);
            let _enter = span.enter();

            let mut result = job(&token);

            let requested = flag
                .upgrade()
                .is_some_and(|flag| flag.load(Ordering::Acquire));
            if requested && result.is_err() {
                result = Err(ValidationError::Cancelled);
            }

            let finished = HandleState::of(&result);
            if finished == HandleState::Cancelled && token.is_expired() && !requested {
                warn!("validation deadline exceeded");
            }
            debug!(state = ?finished, "validation finished");

            if let Some(cell) = cell.upgrade() {
                cell.store(finished.as_u8(), Ordering::Release);
            }
            if sender.send(result).is_err() {
                debug!("handle dropped before the result was delivered");
            }
        });

        debug!(%id, "validation started");

        Self {
            id,
            cancel,
            state,
            receiver,
        }
    }

    /// Block the current thread until the result is available.
    ///
    /// Inside an async runtime this still blocks the calling worker; prefer
    /// [`wait`](Self::wait) there.
    pub fn join(self) -> Result<T> {
        let ExecutionHandle {
            receiver,
            cancel: _cancel,
            ..
        } = self;

        let received = if Handle::try_current().is_ok() {
            // blocking_recv refuses to run on a runtime thread
            thread::scope(|scope| {
                scope
                    .spawn(move || receiver.blocking_recv().ok())
                    .join()
                    .ok()
                    .flatten()
            })
        } else {
            receiver.blocking_recv().ok()
        };
        received.unwrap_or(Err(ValidationError::Cancelled))
    }
}

impl<T> ExecutionHandle<T> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Stop dispatching further tasks. Tasks already running finish normally.
    pub fn cancel(&self) {
        if !self.cancel.swap(true, Ordering::AcqRel) {
            debug!(id = %self.id, "cancellation requested");
        }
    }

    pub fn state(&self) -> HandleState {
        HandleState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_done(&self) -> bool {
        self.state() != HandleState::Running
    }

    /// Whether cancellation was requested or the job ended cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire) || self.state() == HandleState::Cancelled
    }

    /// Wait asynchronously for the result
    pub async fn wait(self) -> Result<T> {
        let ExecutionHandle {
            receiver,
            cancel: _cancel,
            ..
        } = self;
        receiver.await.unwrap_or(Err(ValidationError::Cancelled))
    }
}

impl<T> fmt::Debug for ExecutionHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionHandle")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
