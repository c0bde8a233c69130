//! The `Function` variant family and its type tags.
//!
//! Functions are values: equality is structural and nothing here knows about
//! instances beyond the owner stamped on each `VariableRef`.

use crate::function::error::FunctionError;
use crate::function::scalar::{ScalarAffineFunction, ScalarQuadraticFunction};
use crate::function::vector::{VectorAffineFunction, VectorQuadraticFunction};
use crate::refs::{InstanceId, VariableRef};
use serde::Serialize;
use std::collections::BTreeSet;

/// Static type of a function, used for capability bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[non_exhaustive]
pub enum FunctionType {
    ScalarVariable,
    VectorOfVariables,
    ScalarAffine,
    VectorAffine,
    ScalarQuadratic,
    VectorQuadratic,
}

impl FunctionType {
    pub const ALL: [FunctionType; 6] = [
        FunctionType::ScalarVariable,
        FunctionType::VectorOfVariables,
        FunctionType::ScalarAffine,
        FunctionType::VectorAffine,
        FunctionType::ScalarQuadratic,
        FunctionType::VectorQuadratic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionType::ScalarVariable => "ScalarVariable",
            FunctionType::VectorOfVariables => "VectorOfVariables",
            FunctionType::ScalarAffine => "ScalarAffineFunction",
            FunctionType::VectorAffine => "VectorAffineFunction",
            FunctionType::ScalarQuadratic => "ScalarQuadraticFunction",
            FunctionType::VectorQuadratic => "VectorQuadraticFunction",
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            FunctionType::ScalarVariable | FunctionType::ScalarAffine | FunctionType::ScalarQuadratic
        )
    }

    /// Whether in-place coefficient edits apply to this type.
    pub fn is_modifiable(self) -> bool {
        !matches!(
            self,
            FunctionType::ScalarVariable | FunctionType::VectorOfVariables
        )
    }
}

impl std::fmt::Display for FunctionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed expression over the variables of one instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum Function {
    ScalarVariable(VariableRef),
    VectorOfVariables(Vec<VariableRef>),
    ScalarAffine(ScalarAffineFunction),
    VectorAffine(VectorAffineFunction),
    ScalarQuadratic(ScalarQuadraticFunction),
    VectorQuadratic(VectorQuadraticFunction),
}

impl Function {
    pub fn function_type(&self) -> FunctionType {
        match self {
            Function::ScalarVariable(_) => FunctionType::ScalarVariable,
            Function::VectorOfVariables(_) => FunctionType::VectorOfVariables,
            Function::ScalarAffine(_) => FunctionType::ScalarAffine,
            Function::VectorAffine(_) => FunctionType::VectorAffine,
            Function::ScalarQuadratic(_) => FunctionType::ScalarQuadratic,
            Function::VectorQuadratic(_) => FunctionType::VectorQuadratic,
        }
    }

    /// Number of scalar outputs.
    pub fn output_dimension(&self) -> usize {
        match self {
            Function::ScalarVariable(_) | Function::ScalarAffine(_) | Function::ScalarQuadratic(_) => 1,
            Function::VectorOfVariables(variables) => variables.len(),
            Function::VectorAffine(f) => f.output_dimension(),
            Function::VectorQuadratic(f) => f.output_dimension(),
        }
    }

    fn variables_iter(&self) -> Box<dyn Iterator<Item = VariableRef> + '_> {
        match self {
            Function::ScalarVariable(variable) => Box::new(std::iter::once(*variable)),
            Function::VectorOfVariables(variables) => Box::new(variables.iter().copied()),
            Function::ScalarAffine(f) => Box::new(f.variables_iter()),
            Function::VectorAffine(f) => Box::new(f.variables_iter()),
            Function::ScalarQuadratic(f) => Box::new(f.variables_iter()),
            Function::VectorQuadratic(f) => Box::new(f.variables_iter()),
        }
    }

    /// Distinct variables referenced, in handle order.
    pub fn variables(&self) -> BTreeSet<VariableRef> {
        self.variables_iter().collect()
    }

    pub fn references(&self, variable: VariableRef) -> bool {
        self.variables_iter().any(|candidate| candidate == variable)
    }

    /// Check coefficients, row counts and that all variables share an owner.
    pub fn validate(&self) -> Result<(), FunctionError> {
        match self {
            Function::ScalarVariable(_) => {}
            Function::VectorOfVariables(variables) => {
                if variables.is_empty() {
                    return Err(FunctionError::EmptyVector);
                }
            }
            Function::ScalarAffine(f) => f.validate()?,
            Function::VectorAffine(f) => f.validate()?,
            Function::ScalarQuadratic(f) => f.validate()?,
            Function::VectorQuadratic(f) => f.validate()?,
        }
        let mut owners = self.variables_iter().map(VariableRef::owner);
        if let Some(first) = owners.next() {
            if owners.any(|owner| owner != first) {
                return Err(FunctionError::MixedOwners);
            }
        }
        Ok(())
    }

    /// Owner shared by every referenced variable, if any are referenced.
    pub fn owner(&self) -> Option<InstanceId> {
        self.variables_iter().next().map(VariableRef::owner)
    }

    /// Evaluate every output given a value for each variable.
    pub fn evaluate(&self, value_of: &impl Fn(VariableRef) -> Option<f64>) -> Option<Vec<f64>> {
        match self {
            Function::ScalarVariable(variable) => value_of(*variable).map(|value| vec![value]),
            Function::VectorOfVariables(variables) => {
                variables.iter().map(|variable| value_of(*variable)).collect()
            }
            Function::ScalarAffine(f) => f.evaluate(value_of).map(|value| vec![value]),
            Function::VectorAffine(f) => f.evaluate(value_of),
            Function::ScalarQuadratic(f) => f.evaluate(value_of).map(|value| vec![value]),
            Function::VectorQuadratic(f) => f.evaluate(value_of),
        }
    }

    /// Affine view of a scalar function; `None` for quadratic or vector functions.
    pub fn as_scalar_affine(&self) -> Option<ScalarAffineFunction> {
        match self {
            Function::ScalarVariable(variable) => {
                Some(ScalarAffineFunction::new(vec![(*variable, 1.0)], 0.0))
            }
            Function::ScalarAffine(f) => Some(f.clone()),
            _ => None,
        }
    }

    /// Affine rows of a function; `None` when any row is quadratic.
    pub fn affine_rows(&self) -> Option<Vec<ScalarAffineFunction>> {
        match self {
            Function::ScalarVariable(_) | Function::ScalarAffine(_) => {
                self.as_scalar_affine().map(|row| vec![row])
            }
            Function::VectorOfVariables(variables) => Some(
                variables
                    .iter()
                    .map(|variable| ScalarAffineFunction::new(vec![(*variable, 1.0)], 0.0))
                    .collect(),
            ),
            Function::VectorAffine(f) => Some(f.rows().to_vec()),
            Function::ScalarQuadratic(_) | Function::VectorQuadratic(_) => None,
        }
    }
}

impl From<VariableRef> for Function {
    fn from(variable: VariableRef) -> Self {
        Function::ScalarVariable(variable)
    }
}

impl From<ScalarAffineFunction> for Function {
    fn from(f: ScalarAffineFunction) -> Self {
        Function::ScalarAffine(f)
    }
}

impl From<ScalarQuadraticFunction> for Function {
    fn from(f: ScalarQuadraticFunction) -> Self {
        Function::ScalarQuadratic(f)
    }
}

impl From<VectorAffineFunction> for Function {
    fn from(f: VectorAffineFunction) -> Self {
        Function::VectorAffine(f)
    }
}

impl From<VectorQuadraticFunction> for Function {
    fn from(f: VectorQuadraticFunction) -> Self {
        Function::VectorQuadratic(f)
    }
}
