//! Class Validation Orchestrator
//!
//! Builds a typed object from an object node in strictly sequential phases:
//!
//! 1. **Requirements**: every precondition is checked as one batch. The target
//!    object is not created unless all of them pass.
//! 2. **Creation**: the schema factory is called once.
//! 3. **Mandatory fields**: decoded as one batch; a missing node fails the object.
//! 4. **Optional fields**: decoded as one batch; a missing node falls back to the
//!    configured default or is skipped.
//!
//! Decoding runs on the worker pool. Setters are applied afterwards on the
//! calling thread in declaration order, so the target object is never shared.

use std::sync::Arc;

use tracing::{debug, debug_span};

use crate::aggregate::aggregate;
use crate::error::{Result, ValidationError};
use crate::executor::{CancelToken, DispatchPolicy, TaskExecutor};
use crate::rules::Rule;
use crate::schema::{BoundSetter, FieldDescriptor, RequirementDescriptor, Schema};
use crate::value::{Value, ValueKind};

/// Validate `value` against `schema`, producing a fully populated object
pub fn validate_object<T>(
    executor: &TaskExecutor,
    schema: &Schema<T>,
    value: &Value,
    token: &CancelToken,
) -> Result<T> {
    if !value.is_object() {
        return Err(ValidationError::type_mismatch(ValueKind::Object, value));
    }

    let span = debug_span!("object", fields = schema.mandatory().len() + schema.optional().len());
    let _enter = span.enter();

    // Requirements
    let checks: Vec<_> = schema
        .requirements()
        .iter()
        .map(|requirement| move || check_requirement(requirement, value, token))
        .collect();
    if !checks.is_empty() {
        debug!(count = checks.len(), "checking requirements");
        let batch = executor.run_batch(&checks, DispatchPolicy::FailFast, token);
        aggregate(batch)?;
    }

    if token.is_cancelled() {
        return Err(ValidationError::Cancelled);
    }
    let mut target = schema.create();

    // Mandatory fields
    let mandatory: Vec<_> = schema
        .mandatory()
        .iter()
        .map(|field| move || bind_mandatory(field, value, token))
        .collect();
    debug!(count = mandatory.len(), "binding mandatory fields");
    let batch = executor.run_batch(&mandatory, DispatchPolicy::FailFast, token);
    for setter in aggregate(batch)? {
        setter(&mut target);
    }

    // Optional fields
    let optional: Vec<_> = schema
        .optional()
        .iter()
        .map(|field| move || bind_optional(field, value, token))
        .collect();
    debug!(count = optional.len(), "binding optional fields");
    let batch = executor.run_batch(&optional, DispatchPolicy::FailFast, token);
    for setter in aggregate(batch)?.into_iter().flatten() {
        setter(&mut target);
    }

    Ok(target)
}

fn check_requirement(
    requirement: &RequirementDescriptor,
    value: &Value,
    token: &CancelToken,
) -> Result<()> {
    let path = requirement.path();
    let node = path
        .resolve(value)
        .ok_or_else(|| ValidationError::FieldNotFound { path: path.clone() })?;

    match requirement.check(node, token) {
        Ok(true) => Ok(()),
        Ok(false) => Err(ValidationError::UnmetRequirement {
            path: path.clone(),
            value: node.clone(),
            cause: None,
        }),
        Err(error @ (ValidationError::UnmetRequirement { .. } | ValidationError::Cancelled)) => {
            Err(error)
        }
        Err(cause) => Err(ValidationError::UnmetRequirement {
            path: path.clone(),
            value: node.clone(),
            cause: Some(Box::new(cause)),
        }),
    }
}

fn bind_mandatory<T>(
    field: &FieldDescriptor<T>,
    value: &Value,
    token: &CancelToken,
) -> Result<BoundSetter<T>> {
    let path = field.path();
    let node = path
        .resolve(value)
        .ok_or_else(|| ValidationError::FieldNotFound { path: path.clone() })?;
    field
        .validate(node, token)
        .map_err(|e| ValidationError::nested(path.clone(), e))
}

fn bind_optional<T>(
    field: &FieldDescriptor<T>,
    value: &Value,
    token: &CancelToken,
) -> Result<Option<BoundSetter<T>>> {
    let path = field.path();
    match path.resolve(value) {
        Some(node) => field
            .validate(node, token)
            .map(Some)
            .map_err(|e| ValidationError::nested(path.clone(), e)),
        None => Ok(field.default_setter()),
    }
}

/// A schema used as an item rule, so objects nest inside other schemas and arrays
pub struct ClassRule<T> {
    executor: TaskExecutor,
    schema: Arc<Schema<T>>,
}

impl<T> ClassRule<T> {
    pub fn new(executor: TaskExecutor, schema: Arc<Schema<T>>) -> Self {
        Self { executor, schema }
    }

    pub fn schema(&self) -> &Arc<Schema<T>> {
        &self.schema
    }
}

impl<T> Clone for ClassRule<T> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            schema: Arc::clone(&self.schema),
        }
    }
}

impl<T: Send + 'static> Rule for ClassRule<T> {
    type Output = T;

    fn validate(&self, value: &Value) -> Result<T> {
        self.validate_with(value, &CancelToken::none())
    }

    fn validate_with(&self, value: &Value, token: &CancelToken) -> Result<T> {
        validate_object(&self.executor, &self.schema, value, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;
    use crate::rules::{IntRule, StringRule};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Record {
        id: String,
        name: String,
        age: i64,
        email: Option<String>,
    }

    fn record_schema(created: Arc<AtomicUsize>) -> Schema<Record> {
        Schema::builder(move || {
            created.fetch_add(1, Ordering::SeqCst);
            Record::default()
        })
        .required("id", StringRule, |id: &String| !id.is_empty())
        .expect("id", StringRule, |r: &mut Record, v| r.id = v)
        .expect("name", StringRule, |r: &mut Record, v| r.name = v)
        .optional_or("age", IntRule, 30, |r: &mut Record, v| r.age = v)
        .optional("email", StringRule, |r: &mut Record, v| r.email = Some(v))
        .build()
        .unwrap()
    }

    fn run(value: Value) -> (Result<Record>, usize) {
        let created = Arc::new(AtomicUsize::new(0));
        let schema = record_schema(Arc::clone(&created));
        let executor = TaskExecutor::new(4).unwrap();
        let result = validate_object(&executor, &schema, &value, &CancelToken::none());
        (result, created.load(Ordering::SeqCst))
    }

    #[test]
    fn test_valid_object() {
        let (result, created) = run(json!({"id": "abc", "name": "Foo", "email": "a@b.c"}));
        assert_eq!(
            result.unwrap(),
            Record {
                id: "abc".into(),
                name: "Foo".into(),
                age: 30,
                email: Some("a@b.c".into()),
            }
        );
        assert_eq!(created, 1);
    }

    #[test]
    fn test_missing_mandatory_field() {
        let (result, _) = run(json!({"id": "abc"}));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::FieldNotFound {
                path: Path::key("name")
            }
        );
    }

    #[test]
    fn test_failed_requirement_skips_factory() {
        let (result, created) = run(json!({"id": "", "name": "Foo"}));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::UnmetRequirement {
                path: Path::key("id"),
                value: json!(""),
                cause: None,
            }
        );
        assert_eq!(created, 0);

        let (result, created) = run(json!({"name": "Foo"}));
        assert!(matches!(
            result.unwrap_err(),
            ValidationError::FieldNotFound { .. }
        ));
        assert_eq!(created, 0);
    }

    #[test]
    fn test_requirement_rule_failure_carries_cause() {
        let (result, created) = run(json!({"id": 7, "name": "Foo"}));
        match result.unwrap_err() {
            ValidationError::UnmetRequirement { path, cause, .. } => {
                assert_eq!(path, Path::key("id"));
                assert!(matches!(
                    cause.as_deref(),
                    Some(ValidationError::TypeMismatch { .. })
                ));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(created, 0);
    }

    #[test]
    fn test_optional_failure_is_reported() {
        let (result, _) = run(json!({"id": "abc", "name": "Foo", "age": "old"}));
        let error = result.unwrap_err();
        assert_eq!(error.trail().unwrap().to_string(), "age");
        assert!(matches!(
            error.root_cause(),
            ValidationError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_null_optional_uses_default() {
        let (result, _) = run(json!({"id": "abc", "name": "Foo", "age": null, "email": null}));
        let record = result.unwrap();
        assert_eq!(record.age, 30);
        assert_eq!(record.email, None);
    }

    #[test]
    fn test_non_object_input() {
        let (result, created) = run(json!(["id"]));
        assert_eq!(
            result.unwrap_err(),
            ValidationError::TypeMismatch {
                expected: ValueKind::Object,
                found: ValueKind::Array,
            }
        );
        assert_eq!(created, 0);
    }

    #[test]
    fn test_class_rule_nests() {
        #[derive(Debug, Default)]
        struct Outer {
            inner: Record,
        }

        let executor = TaskExecutor::new(2).unwrap();
        let inner = ClassRule::new(
            executor.clone(),
            Arc::new(record_schema(Arc::new(AtomicUsize::new(0)))),
        );
        let outer = Schema::builder(Outer::default)
            .expect("inner", inner, |o: &mut Outer, v| o.inner = v)
            .build()
            .unwrap();

        let ok = validate_object(
            &executor,
            &outer,
            &json!({"inner": {"id": "x", "name": "y"}}),
            &CancelToken::none(),
        )
        .unwrap();
        assert_eq!(ok.inner.name, "y");

        let error = validate_object(
            &executor,
            &outer,
            &json!({"inner": {"id": "x"}}),
            &CancelToken::none(),
        )
        .unwrap_err();
        assert_eq!(error.trail().unwrap().to_string(), "inner.name");
    }
}
