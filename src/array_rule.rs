//! Array Validation Orchestrator
//!
//! Every element of an array node becomes one task of a single batch. Results
//! land in the slot of their element, so the output keeps input order whatever
//! the completion order was. Item failures are wrapped with their index.

use tracing::debug;

use crate::aggregate::{aggregate, aggregate_all};
use crate::error::{Result, RowErrors, ValidationError};
use crate::executor::{Batch, CancelToken, DispatchPolicy, TaskExecutor};
use crate::path::Path;
use crate::rules::Rule;
use crate::value::{Value, ValueKind};

/// Validate each element of `value` with `rule`, failing on the lowest failing index
pub fn validate_array<R: Rule>(
    executor: &TaskExecutor,
    rule: &R,
    value: &Value,
    token: &CancelToken,
) -> Result<Vec<R::Output>> {
    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::type_mismatch(ValueKind::Array, value))?;
    aggregate(run_items(executor, rule, items, DispatchPolicy::FailFast, token))
}

/// Validate every element and report all failing rows instead of the first
pub fn validate_array_collecting<R: Rule>(
    executor: &TaskExecutor,
    rule: &R,
    value: &Value,
    token: &CancelToken,
) -> std::result::Result<Vec<R::Output>, RowErrors> {
    let Some(items) = value.as_array() else {
        return Err(RowErrors::whole(ValidationError::type_mismatch(
            ValueKind::Array,
            value,
        )));
    };
    aggregate_all(run_items(executor, rule, items, DispatchPolicy::RunAll, token))
}

fn run_items<R: Rule>(
    executor: &TaskExecutor,
    rule: &R,
    items: &[Value],
    policy: DispatchPolicy,
    token: &CancelToken,
) -> Batch<R::Output> {
    debug!(items = items.len(), ?policy, "validating array");
    let tasks: Vec<_> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            move || {
                rule.validate_with(item, token)
                    .map_err(|e| ValidationError::nested(Path::index(index), e))
            }
        })
        .collect();
    executor.run_batch(&tasks, policy, token)
}

/// An item rule applied concurrently to every element of an array node
#[derive(Clone)]
pub struct ConcurrentArrayRule<R> {
    executor: TaskExecutor,
    item: R,
}

impl<R: Rule> ConcurrentArrayRule<R> {
    pub fn new(executor: TaskExecutor, item: R) -> Self {
        Self { executor, item }
    }

    pub fn item(&self) -> &R {
        &self.item
    }
}

impl<R: Rule> Rule for ConcurrentArrayRule<R> {
    type Output = Vec<R::Output>;

    fn validate(&self, value: &Value) -> Result<Self::Output> {
        self.validate_with(value, &CancelToken::none())
    }

    fn validate_with(&self, value: &Value, token: &CancelToken) -> Result<Self::Output> {
        validate_array(&self.executor, &self.item, value, token)
    }
}
