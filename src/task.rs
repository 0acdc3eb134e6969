//! The task entity.
//!
//! A [Task] is a discrete unit of work: a [Variant] together with a validated
//! set of parameter values. Its identity is derived from the variant name and
//! the parameter values, so two independently constructed tasks with equal
//! parameters are the same task as far as the graph is concerned.
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::TaskError;
use crate::value::{Parameters, Value};
use crate::variant::{Variant, declared_parameters};

/// A type-erased, thread-safe container.
pub type Dynamic = Arc<dyn Any + Send + Sync>;

/// Atomic reference-counted string type used for identities.
pub type ArcStr = Arc<str>;

/// Fields that can never be assigned once a task exists.
const FROZEN_FIELDS: &[&str] = &[
    "id",
    "identity",
    "config",
    "configuration",
    "kind",
    "task_name",
    "ready",
    "dependents",
    "stakeholders",
    "requirements",
];

pub struct Task {
    variant: Arc<dyn Variant>,
    parameters: Vec<(&'static str, Value)>,
    identity: ArcStr,
    config: Option<Dynamic>,
    completed: AtomicBool,
    dependents: RwLock<BTreeMap<ArcStr, Arc<Task>>>,
}

impl Task {
    /// Constructs a task of the given variant.
    ///
    /// Every parameter declared by the variant, or by any variant it extends,
    /// must be present in `parameters`. All absent names are reported at once.
    pub fn new<V: Variant>(
        variant: V,
        parameters: Parameters,
        config: Option<Dynamic>,
    ) -> Result<Self, TaskError> {
        Self::from_shared(Arc::new(variant), parameters, config)
    }

    /// Same as [`Task::new`], for a variant that is already shared.
    pub fn from_shared(
        variant: Arc<dyn Variant>,
        mut parameters: Parameters,
        config: Option<Dynamic>,
    ) -> Result<Self, TaskError> {
        let declared = declared_parameters(variant.as_ref());

        let mut bound = Vec::with_capacity(declared.len());
        let mut missing = Vec::new();
        for name in declared {
            match parameters.remove(name) {
                Some(value) => bound.push((name, value)),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(TaskError::MissingParameter {
                kind: variant.name().to_string(),
                names: missing,
            });
        }

        if !parameters.is_empty() {
            return Err(TaskError::UnknownParameter {
                kind: variant.name().to_string(),
                names: parameters.names().map(str::to_string).collect(),
            });
        }

        let values: Vec<String> = bound.iter().map(|(_, value)| value.to_string()).collect();
        let identity = format!("{}_{}", variant.name(), values.join("_"));

        Ok(Self {
            variant,
            parameters: bound,
            identity: identity.into(),
            config,
            completed: AtomicBool::new(false),
            dependents: RwLock::new(BTreeMap::new()),
        })
    }

    pub fn builder<V: Variant>(variant: V) -> TaskBuilder {
        TaskBuilder {
            variant: Arc::new(variant),
            parameters: Parameters::new(),
            config: None,
        }
    }

    /// The variant name, e.g. `TaskA`.
    pub fn kind(&self) -> &str {
        self.variant.name()
    }

    pub fn variant(&self) -> &dyn Variant {
        self.variant.as_ref()
    }

    /// The deduplication key, `<kind>_<value1>_..._<valueN>`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub(crate) fn identity_shared(&self) -> ArcStr {
        self.identity.clone()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Bound parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.parameters.iter().map(|(name, value)| (*name, value))
    }

    pub fn configuration(&self) -> Option<&Dynamic> {
        self.config.as_ref()
    }

    /// Reads the configuration as a concrete type.
    pub fn config<C: Any>(&self) -> Option<&C> {
        self.config.as_deref().and_then(|config| config.downcast_ref::<C>())
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn set_completed(&self, completed: bool) {
        self.completed.store(completed, Ordering::SeqCst);
    }

    /// Assigns a field by name.
    ///
    /// Only `completed` can be assigned, and only with a boolean. The identity,
    /// the configuration, the kind and the parameters are frozen.
    pub fn assign(&self, field: &str, value: Value) -> Result<(), TaskError> {
        if field == "completed" {
            return match value {
                Value::Bool(completed) => {
                    self.set_completed(completed);
                    Ok(())
                }
                value => Err(TaskError::InvalidValue {
                    task: self.kind().to_string(),
                    field: field.to_string(),
                    value,
                }),
            };
        }

        if FROZEN_FIELDS.contains(&field) || self.get(field).is_some() {
            return Err(TaskError::FrozenProperty {
                task: self.kind().to_string(),
                field: field.to_string(),
            });
        }

        Err(TaskError::UnknownField {
            task: self.kind().to_string(),
            field: field.to_string(),
        })
    }

    /// Records `dependent` as a task that requires this one. Returns `false`
    /// if a task with the same identity was already recorded.
    pub fn add_dependent(&self, dependent: &Arc<Task>) -> bool {
        let mut dependents = self.dependents.write().unwrap_or_else(PoisonError::into_inner);

        if dependents.contains_key(dependent.identity()) {
            return false;
        }

        dependents.insert(dependent.identity_shared(), dependent.clone());
        true
    }

    /// Tasks that declared this task as a requirement, ordered by identity.
    pub fn dependents(&self) -> Vec<Arc<Task>> {
        self.dependents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn dependent_ids(&self) -> Vec<ArcStr> {
        self.dependents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// A task is ready when nothing depends on it, or when every task that
    /// depends on it has been completed.
    ///
    /// Note this looks at dependents, not at requirements.
    pub fn is_ready(&self) -> bool {
        self.dependents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .all(|dependent| dependent.is_completed())
    }

    /// Freshly constructed requirement tasks, as declared by the variant.
    pub fn requirements(&self) -> Result<Vec<Task>, TaskError> {
        self.variant.requirements(self)
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for Task {}

impl std::hash::Hash for Task {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("identity", &self.identity)
            .field("completed", &self.is_completed())
            .field("dependents", &self.dependent_ids())
            .finish()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity)
    }
}

/// Collects parameters and configuration for a [Task] before validating them.
pub struct TaskBuilder {
    variant: Arc<dyn Variant>,
    parameters: Parameters,
    config: Option<Dynamic>,
}

impl TaskBuilder {
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name, value);
        self
    }

    pub fn params(mut self, parameters: Parameters) -> Self {
        for (name, value) in parameters {
            self.parameters.insert(name, value);
        }
        self
    }

    pub fn config<C: Any + Send + Sync>(mut self, config: C) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    pub fn build(self) -> Result<Task, TaskError> {
        Task::from_shared(self.variant, self.parameters, self.config)
    }
}
