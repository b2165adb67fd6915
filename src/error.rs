use thiserror::Error;

use crate::path::Path;
use crate::value::{Value, ValueKind};

/// Failure produced while validating a value tree against a schema or rule
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The node has the wrong kind. Carries no location of its own: the
    /// enclosing field or item wraps it in `NestedFailure`, and
    /// [`trail`](ValidationError::trail) rebuilds the full path. A mismatch
    /// on the validated root itself has no trail.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("field not found: {path}")]
    FieldNotFound { path: Path },

    #[error("requirement not met for {path} with value {value}")]
    UnmetRequirement {
        path: Path,
        value: Value,
        #[source]
        cause: Option<Box<ValidationError>>,
    },

    #[error("invalid value at {path}: {cause}")]
    NestedFailure {
        path: Path,
        #[source]
        cause: Box<ValidationError>,
    },

    #[error("validation cancelled")]
    Cancelled,
}

impl ValidationError {
    /// Type mismatch between the expected kind and the node actually found
    pub fn type_mismatch(expected: ValueKind, found: &Value) -> Self {
        ValidationError::TypeMismatch {
            expected,
            found: ValueKind::of(found),
        }
    }

    /// Wrap `cause` with the path of the enclosing field or item.
    /// Cancellation is passed through unwrapped.
    pub fn nested(path: Path, cause: ValidationError) -> Self {
        match cause {
            ValidationError::Cancelled => ValidationError::Cancelled,
            cause => ValidationError::NestedFailure {
                path,
                cause: Box::new(cause),
            },
        }
    }

    /// Full path from the validated root to the failing node, if known
    pub fn trail(&self) -> Option<Path> {
        match self {
            ValidationError::NestedFailure { path, cause } => match cause.trail() {
                Some(rest) => Some(path.join(&rest)),
                None => Some(path.clone()),
            },
            ValidationError::FieldNotFound { path }
            | ValidationError::UnmetRequirement { path, .. } => Some(path.clone()),
            ValidationError::TypeMismatch { .. } | ValidationError::Cancelled => None,
        }
    }

    /// Innermost error of a nested failure chain
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            ValidationError::NestedFailure { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ValidationError::Cancelled)
    }

    /// Short upper-case label used by brief reports
    pub fn kind_label(&self) -> &'static str {
        match self.root_cause() {
            ValidationError::TypeMismatch { .. } => "TYPE MISMATCH",
            ValidationError::FieldNotFound { .. } => "FIELD NOT FOUND",
            ValidationError::UnmetRequirement { .. } => "UNMET REQUIREMENT",
            ValidationError::NestedFailure { .. } => "INVALID",
            ValidationError::Cancelled => "CANCELLED",
        }
    }
}

/// Problems detected while building a schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Every failing row of an array validated in collect-all mode, in index order
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} of {} items failed validation", .errors.len(), .total)]
pub struct RowErrors {
    /// Number of items in the input (0 when the input was not an array)
    pub total: usize,
    pub errors: Vec<ValidationError>,
}

impl RowErrors {
    /// A single failure that applies to the whole input
    pub fn whole(error: ValidationError) -> Self {
        Self {
            total: 0,
            errors: vec![error],
        }
    }

    /// The error fail-fast validation would have reported
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Schema construction result type alias
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
