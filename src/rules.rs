//! Item rules
//!
//! A `Rule` turns one node of the value tree into a typed output. Leaf rules
//! cover the scalar kinds; `ArrayRule` walks an array sequentially. The
//! concurrent orchestrators (`ClassRule`, `ConcurrentArrayRule`) implement the
//! same trait so schemas nest inside each other.

use std::sync::Arc;

use crate::error::{Result, ValidationError};
use crate::executor::CancelToken;
use crate::path::Path;
use crate::value::{Value, ValueKind};

/// Validation of a single node into a typed output
pub trait Rule: Send + Sync {
    type Output: Send + 'static;

    fn validate(&self, value: &Value) -> Result<Self::Output>;

    /// Validate under the caller's cancellation token. Rules that fan out
    /// (nested schemas, concurrent arrays) observe it; leaf rules ignore it.
    fn validate_with(&self, value: &Value, _token: &CancelToken) -> Result<Self::Output> {
        self.validate(value)
    }
}

impl<R: Rule + ?Sized> Rule for Arc<R> {
    type Output = R::Output;

    fn validate(&self, value: &Value) -> Result<Self::Output> {
        (**self).validate(value)
    }

    fn validate_with(&self, value: &Value, token: &CancelToken) -> Result<Self::Output> {
        (**self).validate_with(value, token)
    }
}

/// Accepts string nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct StringRule;

impl Rule for StringRule {
    type Output = String;

    fn validate(&self, value: &Value) -> Result<String> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| ValidationError::type_mismatch(ValueKind::String, value))
    }
}

/// Accepts integral numbers that fit in an `i64`
#[derive(Debug, Clone, Copy, Default)]
pub struct IntRule;

impl Rule for IntRule {
    type Output = i64;

    fn validate(&self, value: &Value) -> Result<i64> {
        value
            .as_i64()
            .ok_or_else(|| ValidationError::type_mismatch(ValueKind::Integer, value))
    }
}

/// Accepts any number
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleRule;

impl Rule for DoubleRule {
    type Output = f64;

    fn validate(&self, value: &Value) -> Result<f64> {
        value
            .as_f64()
            .ok_or_else(|| ValidationError::type_mismatch(ValueKind::Number, value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolRule;

impl Rule for BoolRule {
    type Output = bool;

    fn validate(&self, value: &Value) -> Result<bool> {
        value
            .as_bool()
            .ok_or_else(|| ValidationError::type_mismatch(ValueKind::Bool, value))
    }
}

/// Accepts any node and keeps a copy of it
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueRule;

impl Rule for ValueRule {
    type Output = Value;

    fn validate(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }
}

/// Validates every element of an array in order on the calling thread.
/// The first failing element is reported as `[i]`.
#[derive(Debug, Clone, Default)]
pub struct ArrayRule<R> {
    item: R,
}

impl<R: Rule> ArrayRule<R> {
    pub fn new(item: R) -> Self {
        Self { item }
    }

    pub fn item(&self) -> &R {
        &self.item
    }
}

impl<R: Rule> Rule for ArrayRule<R> {
    type Output = Vec<R::Output>;

    fn validate(&self, value: &Value) -> Result<Self::Output> {
        self.validate_with(value, &CancelToken::none())
    }

    fn validate_with(&self, value: &Value, token: &CancelToken) -> Result<Self::Output> {
        let items = value
            .as_array()
            .ok_or_else(|| ValidationError::type_mismatch(ValueKind::Array, value))?;

        let mut output = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if token.is_cancelled() {
                return Err(ValidationError::Cancelled);
            }
            let decoded = self
                .item
                .validate_with(item, token)
                .map_err(|e| ValidationError::nested(Path::index(index), e))?;
            output.push(decoded);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_scalar_rules_accept_matching_kind() {
        assert_eq!(StringRule.validate(&json!("abc")).unwrap(), "abc");
        assert_eq!(IntRule.validate(&json!(-12)).unwrap(), -12);
        assert_eq!(DoubleRule.validate(&json!(2.5)).unwrap(), 2.5);
        assert_eq!(DoubleRule.validate(&json!(3)).unwrap(), 3.0);
        assert!(BoolRule.validate(&json!(true)).unwrap());
        assert_eq!(ValueRule.validate(&json!({"a": [1]})).unwrap(), json!({"a": [1]}));
    }

    #[test]
    fn test_scalar_rules_report_type_mismatch() {
        assert_eq!(
            StringRule.validate(&json!(5)).unwrap_err(),
            ValidationError::TypeMismatch {
                expected: ValueKind::String,
                found: ValueKind::Integer,
            }
        );
        assert_eq!(
            IntRule.validate(&json!(1.5)).unwrap_err(),
            ValidationError::TypeMismatch {
                expected: ValueKind::Integer,
                found: ValueKind::Number,
            }
        );
        assert_eq!(
            IntRule.validate(&json!(u64::MAX)).unwrap_err().to_string(),
            "type mismatch: expected integer, found number"
        );
        assert!(matches!(
            BoolRule.validate(&json!("true")),
            Err(ValidationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            DoubleRule.validate(&json!(null)),
            Err(ValidationError::TypeMismatch {
                found: ValueKind::Null,
                ..
            })
        ));
    }

    #[test]
    fn test_array_rule_keeps_order() {
        let rule = ArrayRule::new(StringRule);
        let tags = rule.validate(&json!(["a", "b", "c"])).unwrap();
        assert_eq!(tags, vec!["a", "b", "c"]);
        assert!(rule.validate(&json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_array_rule_reports_first_failing_index() {
        let rule = ArrayRule::new(IntRule);
        let error = rule.validate(&json!([1, "two", "three"])).unwrap_err();
        assert_eq!(error.trail().unwrap().to_string(), "[1]");
        assert!(matches!(
            error.root_cause(),
            ValidationError::TypeMismatch { .. }
        ));

        assert!(matches!(
            rule.validate(&json!({"not": "array"})),
            Err(ValidationError::TypeMismatch {
                expected: ValueKind::Array,
                ..
            })
        ));
    }

    #[test]
    fn test_array_rule_observes_cancellation() {
        let flag = Arc::new(AtomicBool::new(true));
        let token = CancelToken::watching(&flag);
        let rule = ArrayRule::new(IntRule);
        assert_eq!(
            rule.validate_with(&json!([1, 2]), &token).unwrap_err(),
            ValidationError::Cancelled
        );
    }

    #[test]
    fn test_shared_rule_through_arc() {
        let rule: Arc<dyn Rule<Output = String>> = Arc::new(StringRule);
        assert_eq!(rule.validate(&json!("x")).unwrap(), "x");
    }
}
