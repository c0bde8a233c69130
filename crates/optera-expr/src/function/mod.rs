//! Function families for constraints and objectives.
//!
//! - `core`:     Function: the closed variant family and its type tags
//! - `scalar`:   ScalarAffineFunction, ScalarQuadraticFunction
//! - `vector`:   VectorAffineFunction, VectorQuadraticFunction
//! - `change`:   FunctionChange: in-place edits
//! - `builders`: helpers for composing affine functions
//! - `error`:    Function construction and modification errors

pub mod builders;
pub mod change;
pub mod core;
pub mod error;
pub mod scalar;
pub mod vector;

pub use change::FunctionChange;
pub use self::core::{Function, FunctionType};
pub use error::FunctionError;
pub use scalar::{ScalarAffineFunction, ScalarAffineTerm, ScalarQuadraticFunction, ScalarQuadraticTerm};
pub use vector::{VectorAffineFunction, VectorQuadraticFunction};
