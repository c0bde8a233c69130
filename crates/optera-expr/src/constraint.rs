//! Constraint type tags and function/set compatibility.

use crate::function::{Function, FunctionType};
use crate::set::{Set, SetType};
use serde::Serialize;

/// The static `(FunctionType, SetType)` pair of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConstraintType {
    pub function: FunctionType,
    pub set: SetType,
}

impl ConstraintType {
    pub fn new(function: FunctionType, set: SetType) -> Self {
        Self { function, set }
    }

    /// Tag of an existing `(function, set)` pair.
    pub fn of(function: &Function, set: &Set) -> Self {
        Self::new(function.function_type(), set.set_type())
    }
}

impl std::fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-in-{}", self.function.as_str(), self.set.as_str())
    }
}

/// Reason a function cannot be paired with a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incompatibility {
    /// Scalar function with a vector set, or the reverse.
    Shape,
    /// Function output dimension differs from the set dimension.
    Dimension { function: usize, set: usize },
}

/// Check that `function` can be constrained to lie in `set`.
pub fn check_compatible(function: &Function, set: &Set) -> Result<(), Incompatibility> {
    let function_type = function.function_type();
    let set_type = set.set_type();
    if set_type.is_scalar() != function_type.is_scalar() {
        return Err(Incompatibility::Shape);
    }
    let function_dim = function.output_dimension();
    let set_dim = set.dimension();
    if function_dim != set_dim {
        return Err(Incompatibility::Dimension {
            function: function_dim,
            set: set_dim,
        });
    }
    Ok(())
}
