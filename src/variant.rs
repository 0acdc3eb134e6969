//! Task variant declarations.
//!
//! A variant is a concrete kind of task. It names the parameters it needs,
//! optionally extends another variant (inheriting its parameters), and
//! declares which other tasks it depends on.
//!
//! ```rust
//! use shigoto::{Task, TaskError, Variant};
//!
//! struct Compile;
//!
//! impl Variant for Compile {
//!     fn name(&self) -> &str {
//!         "Compile"
//!     }
//!
//!     fn parameters(&self) -> &[&'static str] {
//!         &["target"]
//!     }
//! }
//!
//! struct Release;
//!
//! impl Variant for Release {
//!     fn name(&self) -> &str {
//!         "Release"
//!     }
//!
//!     fn requirements(&self, _: &Task) -> Result<Vec<Task>, TaskError> {
//!         Ok(vec![Task::builder(Compile).param("target", "x86_64").build()?])
//!     }
//! }
//! ```

use crate::error::TaskError;
use crate::task::Task;

pub trait Variant: Send + Sync + 'static {
    /// The task kind, the first component of every identity of this variant.
    fn name(&self) -> &str;

    /// Parameter names declared by this variant itself, in declaration order.
    fn parameters(&self) -> &[&'static str] {
        &[]
    }

    /// The variant this one extends, if any.
    fn parent(&self) -> Option<&dyn Variant> {
        None
    }

    /// Tasks this task depends on. Evaluated anew on every call.
    fn requirements(&self, _task: &Task) -> Result<Vec<Task>, TaskError> {
        Ok(vec![])
    }
}

/// Resolves the full list of parameter names a variant requires.
///
/// Names declared by the root-most ancestor come first. A name declared again
/// further down the hierarchy keeps the position of its first declaration.
pub fn declared_parameters(variant: &dyn Variant) -> Vec<&'static str> {
    let mut chain = vec![variant];
    let mut current = variant;
    while let Some(parent) = current.parent() {
        chain.push(parent);
        current = parent;
    }

    let mut names: Vec<&'static str> = Vec::new();
    for variant in chain.iter().rev() {
        for &name in variant.parameters() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    names
}

#[cfg(test)]
mod test {
    use super::*;

    struct GrandParent;
    struct Parent;
    struct Child;
    struct Shadowing;

    impl Variant for GrandParent {
        fn name(&self) -> &str {
            "GrandParent"
        }

        fn parameters(&self) -> &[&'static str] {
            &["x"]
        }
    }

    impl Variant for Parent {
        fn name(&self) -> &str {
            "Parent"
        }

        fn parent(&self) -> Option<&dyn Variant> {
            Some(&GrandParent)
        }
    }

    impl Variant for Child {
        fn name(&self) -> &str {
            "Child"
        }

        fn parameters(&self) -> &[&'static str] {
            &["y"]
        }

        fn parent(&self) -> Option<&dyn Variant> {
            Some(&Parent)
        }
    }

    impl Variant for Shadowing {
        fn name(&self) -> &str {
            "Shadowing"
        }

        fn parameters(&self) -> &[&'static str] {
            &["z", "x"]
        }

        fn parent(&self) -> Option<&dyn Variant> {
            Some(&Child)
        }
    }

    #[test]
    fn test_own_parameters() {
        assert_eq!(declared_parameters(&GrandParent), vec!["x"]);
    }

    #[test]
    fn test_parameters_through_empty_parent() {
        assert_eq!(declared_parameters(&Parent), vec!["x"]);
        assert_eq!(declared_parameters(&Child), vec!["x", "y"]);
    }

    #[test]
    fn test_redeclared_parameter_keeps_ancestor_position() {
        assert_eq!(declared_parameters(&Shadowing), vec!["x", "y", "z"]);
    }
}
