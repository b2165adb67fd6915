//! Schema construction
//!
//! A `Schema<T>` is assembled once through `SchemaBuilder` and is read-only
//! afterwards. It holds the factory for the target object plus three ordered
//! descriptor lists: requirements, mandatory fields and optional fields.
//! Binders receive the target object explicitly, so a descriptor never
//! captures the object it writes to.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, SchemaError, SchemaResult};
use crate::executor::CancelToken;
use crate::path::Path;
use crate::rules::Rule;
use crate::value::Value;

/// Deferred write of one decoded value into the target object
pub type BoundSetter<T> = Box<dyn FnOnce(&mut T) + Send>;

type BindFn<T> = Box<dyn Fn(&Value, &CancelToken) -> Result<BoundSetter<T>> + Send + Sync>;
type DefaultFn<T> = Box<dyn Fn() -> BoundSetter<T> + Send + Sync>;
type PredicateFn = Box<dyn Fn(&Value, &CancelToken) -> Result<bool> + Send + Sync>;
type FactoryFn<T> = Box<dyn Fn() -> T + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Mandatory,
    Optional,
}

/// A field of the target object: where to find it and how to decode it
pub struct FieldDescriptor<T> {
    path: Path,
    kind: FieldKind,
    bind: BindFn<T>,
    default: Option<DefaultFn<T>>,
}

impl<T> FieldDescriptor<T> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Decode the resolved node into a setter for the target object
    pub fn validate(&self, node: &Value, token: &CancelToken) -> Result<BoundSetter<T>> {
        (self.bind)(node, token)
    }

    /// Setter writing the configured default, used when the field is absent
    pub fn default_setter(&self) -> Option<BoundSetter<T>> {
        self.default.as_ref().map(|default| default())
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("path", &self.path.to_string())
            .field("kind", &self.kind)
            .field("has_default", &self.has_default())
            .finish()
    }
}

/// A precondition on the input checked before the target object exists
pub struct RequirementDescriptor {
    path: Path,
    predicate: PredicateFn,
}

impl RequirementDescriptor {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the rule and the predicate on the resolved node. Rule failures are
    /// returned as-is.
    pub fn check(&self, node: &Value, token: &CancelToken) -> Result<bool> {
        (self.predicate)(node, token)
    }
}

impl fmt::Debug for RequirementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequirementDescriptor")
            .field("path", &self.path.to_string())
            .finish()
    }
}

/// Immutable description of how to build a `T` from an object node
pub struct Schema<T> {
    factory: FactoryFn<T>,
    requirements: Vec<RequirementDescriptor>,
    mandatory: Vec<FieldDescriptor<T>>,
    optional: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> Schema<T> {
    /// Start a schema whose target objects are produced by `factory`
    pub fn builder<F>(factory: F) -> SchemaBuilder<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        SchemaBuilder {
            schema: Schema {
                factory: Box::new(factory),
                requirements: Vec::new(),
                mandatory: Vec::new(),
                optional: Vec::new(),
            },
            error: None,
        }
    }
}

impl<T> Schema<T> {
    pub fn requirements(&self) -> &[RequirementDescriptor] {
        &self.requirements
    }

    pub fn mandatory(&self) -> &[FieldDescriptor<T>] {
        &self.mandatory
    }

    pub fn optional(&self) -> &[FieldDescriptor<T>] {
        &self.optional
    }

    /// Fresh target object
    pub fn create(&self) -> T {
        (self.factory)()
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("requirements", &self.requirements)
            .field("mandatory", &self.mandatory)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Append-only builder; `build` hands over the finished schema
pub struct SchemaBuilder<T> {
    schema: Schema<T>,
    error: Option<SchemaError>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Require the node at `path` to decode with `rule` and satisfy `predicate`
    pub fn required<R, P>(mut self, path: &str, rule: R, predicate: P) -> Self
    where
        R: Rule + 'static,
        P: Fn(&R::Output) -> bool + Send + Sync + 'static,
    {
        if let Some(path) = self.parse(path) {
            self.schema.requirements.push(RequirementDescriptor {
                path,
                predicate: Box::new(move |node: &Value, token: &CancelToken| -> Result<bool> {
                    rule.validate_with(node, token).map(|decoded| predicate(&decoded))
                }),
            });
        }
        self
    }

    /// Mandatory field: a missing node fails the whole object
    pub fn expect<R, B>(mut self, path: &str, rule: R, bind: B) -> Self
    where
        R: Rule + 'static,
        B: Fn(&mut T, R::Output) + Send + Sync + 'static,
    {
        if let Some(path) = self.parse(path) {
            let field = descriptor(path, FieldKind::Mandatory, rule, Arc::new(bind), None);
            self.schema.mandatory.push(field);
        }
        self
    }

    /// Optional field: a missing or null node leaves the target untouched
    pub fn optional<R, B>(mut self, path: &str, rule: R, bind: B) -> Self
    where
        R: Rule + 'static,
        B: Fn(&mut T, R::Output) + Send + Sync + 'static,
    {
        if let Some(path) = self.parse(path) {
            let field = descriptor(path, FieldKind::Optional, rule, Arc::new(bind), None);
            self.schema.optional.push(field);
        }
        self
    }

    /// Optional field that binds `default` when the node is missing or null
    pub fn optional_or<R, B>(mut self, path: &str, rule: R, default: R::Output, bind: B) -> Self
    where
        R: Rule + 'static,
        R::Output: Clone + Sync,
        B: Fn(&mut T, R::Output) + Send + Sync + 'static,
    {
        if let Some(path) = self.parse(path) {
            let bind = Arc::new(bind);
            let fallback = {
                let bind = Arc::clone(&bind);
                Box::new(move || {
                    let value = default.clone();
                    let bind = Arc::clone(&bind);
                    Box::new(move |target: &mut T| bind(target, value)) as BoundSetter<T>
                }) as DefaultFn<T>
            };
            let field = descriptor(path, FieldKind::Optional, rule, bind, Some(fallback));
            self.schema.optional.push(field);
        }
        self
    }

    /// Finish the schema, reporting the first invalid path if any
    pub fn build(self) -> SchemaResult<Schema<T>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.schema),
        }
    }

    fn parse(&mut self, text: &str) -> Option<Path> {
        match Path::parse(text) {
            Ok(path) => Some(path),
            Err(error) => {
                self.error.get_or_insert(error);
                None
            }
        }
    }
}

fn descriptor<T, R, B>(
    path: Path,
    kind: FieldKind,
    rule: R,
    bind: Arc<B>,
    default: Option<DefaultFn<T>>,
) -> FieldDescriptor<T>
where
    T: 'static,
    R: Rule + 'static,
    B: Fn(&mut T, R::Output) + Send + Sync + 'static,
{
    FieldDescriptor {
        path,
        kind,
        bind: Box::new(move |node: &Value, token: &CancelToken| -> Result<BoundSetter<T>> {
            let decoded = rule.validate_with(node, token)?;
            let bind = Arc::clone(&bind);
            Ok(Box::new(move |target: &mut T| bind(target, decoded)) as BoundSetter<T>)
        }),
        default,
    }
}
