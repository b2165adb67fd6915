//! Validation Engine
//!
//! Entry point tying the pieces together:
//! - **Worker pool**: one fixed-width `TaskExecutor` shared by every call and
//!   every nested batch of the engine
//! - **Synchronous calls**: `validate`, `validate_array` and
//!   `validate_array_collecting` block the caller until the result is ready
//! - **Background calls**: the `*_cancellable` variants return an
//!   `ExecutionHandle` that can be cancelled, joined or awaited
//! - **Timeouts**: a configured timeout becomes the deadline of the call's
//!   cancellation token and surfaces as `Cancelled`

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug_span, warn};

use crate::array_rule::{self, ConcurrentArrayRule};
use crate::class_rule::{self, ClassRule};
use crate::config::ConfigError;
use crate::error::{Result, RowErrors, ValidationError};
use crate::executor::{CancelToken, TaskExecutor};
use crate::handle::ExecutionHandle;
use crate::rules::Rule;
use crate::schema::Schema;
use crate::value::Value;

/// Worker pool width used when nothing else is configured
pub const DEFAULT_WORKERS: usize = 4;

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationConfig {
    /// Number of worker threads
    pub workers: usize,
    /// Deadline applied to every validation call
    pub timeout: Option<Duration>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout: None,
        }
    }
}

impl ValidationConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Bounded-concurrency schema validation engine
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    executor: TaskExecutor,
    config: ValidationConfig,
}

impl ValidationEngine {
    /// Create an engine and start its worker pool
    pub fn new(config: ValidationConfig) -> std::result::Result<Self, ConfigError> {
        let executor = TaskExecutor::new(config.workers)?;
        Ok(Self { executor, config })
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn executor(&self) -> &TaskExecutor {
        &self.executor
    }

    /// Validate an object node against `schema`
    pub fn validate<T>(&self, schema: &Schema<T>, value: &Value) -> Result<T> {
        let span = debug_span!("validate", workers = self.config.workers);
        let _enter = span.enter();

        let token = self.call_token();
        let result = class_rule::validate_object(&self.executor, schema, value, &token);
        settle(result, &token)
    }

    /// Validate an object node in the background
    pub fn validate_cancellable<T>(&self, schema: Arc<Schema<T>>, value: Value) -> ExecutionHandle<T>
    where
        T: Send + 'static,
    {
        let executor = self.executor.clone();
        ExecutionHandle::spawn(&self.executor, self.config.timeout, move |token| {
            class_rule::validate_object(&executor, &schema, &value, token)
        })
    }

    /// Validate every element of an array node with `rule`
    pub fn validate_array<R: Rule>(&self, rule: &R, value: &Value) -> Result<Vec<R::Output>> {
        let span = debug_span!("validate_array", workers = self.config.workers);
        let _enter = span.enter();

        let token = self.call_token();
        let result = array_rule::validate_array(&self.executor, rule, value, &token);
        settle(result, &token)
    }

    /// Validate an array node in the background
    pub fn validate_array_cancellable<R>(&self, rule: R, value: Value) -> ExecutionHandle<Vec<R::Output>>
    where
        R: Rule + 'static,
    {
        let executor = self.executor.clone();
        ExecutionHandle::spawn(&self.executor, self.config.timeout, move |token| {
            array_rule::validate_array(&executor, &rule, &value, token)
        })
    }

    /// Validate every element and report every failing row
    pub fn validate_array_collecting<R: Rule>(
        &self,
        rule: &R,
        value: &Value,
    ) -> std::result::Result<Vec<R::Output>, RowErrors> {
        let span = debug_span!("validate_array_collecting", workers = self.config.workers);
        let _enter = span.enter();

        let token = self.call_token();
        let result = array_rule::validate_array_collecting(&self.executor, rule, value, &token);
        if let Err(rows) = &result
            && rows.errors.iter().any(ValidationError::is_cancelled)
            && token.is_expired()
        {
            warn!(failed = rows.len(), "validation deadline exceeded");
        }
        result
    }

    /// Use `schema` as an item rule running on this engine's pool
    pub fn class_rule<T>(&self, schema: Arc<Schema<T>>) -> ClassRule<T> {
        ClassRule::new(self.executor.clone(), schema)
    }

    /// Apply `item` concurrently to array nodes on this engine's pool
    pub fn array_rule<R: Rule>(&self, item: R) -> ConcurrentArrayRule<R> {
        ConcurrentArrayRule::new(self.executor.clone(), item)
    }

    fn call_token(&self) -> CancelToken {
        CancelToken::none().with_timeout(self.config.timeout)
    }
}

fn settle<T>(result: Result<T>, token: &CancelToken) -> Result<T> {
    if let Err(ValidationError::Cancelled) = &result
        && token.is_expired()
    {
        warn!("validation deadline exceeded");
    }
    result
}
