#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

mod error;
mod graph;
#[cfg(feature = "logging")]
mod logging;
mod task;
mod value;
mod variant;

pub use crate::error::TaskError;
pub use crate::graph::TaskGraph;
#[cfg(feature = "logging")]
pub use crate::logging::init_logging;
pub use crate::task::{ArcStr, Dynamic, Task, TaskBuilder};
pub use crate::value::{Parameters, Value};
pub use crate::variant::{Variant, declared_parameters};
