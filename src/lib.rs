//! # validate-json Library
//!
//! A bounded-concurrency schema validation engine: decodes untyped JSON value
//! trees into typed objects and arrays, running independent field and item
//! validations in parallel on a fixed-width worker pool with deterministic,
//! lowest-index error reporting and cooperative cancellation.

pub mod aggregate;
pub mod array_rule;
pub mod class_rule;
pub mod config;
pub mod error;
pub mod error_reporter;
pub mod executor;
pub mod handle;
pub mod path;
pub mod rules;
pub mod schema;
pub mod validator;
pub mod value;

pub use aggregate::{aggregate, aggregate_all};
pub use array_rule::ConcurrentArrayRule;
pub use class_rule::ClassRule;
pub use config::{Config, ConfigError, ConfigManager, EngineConfig, EnvProvider, OutputConfig};
pub use error::{Result, RowErrors, SchemaError, ValidationError};
pub use error_reporter::{ErrorReporter, VerbosityLevel};
pub use executor::{Batch, CancelToken, DispatchPolicy, TaskExecutor};
pub use handle::{ExecutionHandle, HandleState};
pub use path::{Path, PathSegment, resolve};
pub use rules::{ArrayRule, BoolRule, DoubleRule, IntRule, Rule, StringRule, ValueRule};
pub use schema::{BoundSetter, FieldDescriptor, FieldKind, RequirementDescriptor, Schema, SchemaBuilder};
pub use validator::{DEFAULT_WORKERS, ValidationConfig, ValidationEngine};
pub use value::{Value, ValueKind};
