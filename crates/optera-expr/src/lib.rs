//! Functions, sets and handles for describing optimization instances.
//!
//! - `refs`:       VariableRef, ConstraintRef, InstanceId
//! - `function`:   Function family and in-place changes
//! - `set`:        Set family and membership
//! - `constraint`: ConstraintType and function/set compatibility

pub mod constraint;
pub mod function;
pub mod refs;
pub mod set;

pub use constraint::{ConstraintType, Incompatibility, check_compatible};
pub use function::{
    Function, FunctionChange, FunctionError, FunctionType, ScalarAffineFunction, ScalarAffineTerm,
    ScalarQuadraticFunction, ScalarQuadraticTerm, VectorAffineFunction, VectorQuadraticFunction,
};
pub use refs::{ConstraintRef, InstanceId, VariableRef};
pub use set::{Set, SetError, SetType};
