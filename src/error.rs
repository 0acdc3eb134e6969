use thiserror::Error;

use crate::value::Value;

/// Everything that can go wrong while declaring tasks or expanding them into a
/// [`TaskGraph`](crate::TaskGraph).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    #[error("{kind} requires the following parameters: {}", names.join(","))]
    MissingParameter { kind: String, names: Vec<String> },

    #[error("{kind} does not declare the following parameters: {}", names.join(","))]
    UnknownParameter { kind: String, names: Vec<String> },

    #[error("{task}.{field} can only be a boolean value, got {}", value.type_name())]
    InvalidValue {
        task: String,
        field: String,
        value: Value,
    },

    #[error("{task}.{field} cannot be modified.")]
    FrozenProperty { task: String, field: String },

    #[error("{task} has no field named '{field}'")]
    UnknownField { task: String, field: String },

    #[error("Cyclic dependency detected: {}", cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },
}
