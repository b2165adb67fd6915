//! Error aggregation
//!
//! Batches are reduced only after every dispatched task has finished, so the
//! reported error never depends on completion order.

use crate::error::{Result, RowErrors, ValidationError};
use crate::executor::Batch;

/// Reduce a batch to its values in input order, or to one error.
///
/// Cancellation observed by the batch wins. Otherwise the failure with the
/// lowest index is reported.
pub fn aggregate<R>(batch: Batch<R>) -> Result<Vec<R>> {
    if batch.was_cancelled() {
        return Err(ValidationError::Cancelled);
    }

    let mut values = Vec::with_capacity(batch.len());
    for slot in batch.into_slots() {
        match slot {
            Some(Ok(value)) => values.push(value),
            Some(Err(error)) => return Err(error),
            // Only cancellation leaves a slot empty before the first failure
            None => return Err(ValidationError::Cancelled),
        }
    }
    Ok(values)
}

/// Reduce a batch keeping every failure, in index order
pub fn aggregate_all<R>(batch: Batch<R>) -> std::result::Result<Vec<R>, RowErrors> {
    let total = batch.len();
    if batch.was_cancelled() {
        return Err(RowErrors {
            total,
            errors: vec![ValidationError::Cancelled],
        });
    }

    let mut values = Vec::with_capacity(total);
    let mut errors = Vec::new();
    for slot in batch.into_slots() {
        match slot {
            Some(Ok(value)) => values.push(value),
            Some(Err(error)) => errors.push(error),
            None => errors.push(ValidationError::Cancelled),
        }
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(RowErrors { total, errors })
    }
}
