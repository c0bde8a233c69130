//! In-place function edits.

use crate::function::core::Function;
use crate::function::error::{FunctionError, ensure_finite};
use crate::refs::VariableRef;
use serde::Serialize;

/// One edit applied to a stored constraint function or objective.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum FunctionChange {
    /// Replace the constant of a scalar affine or quadratic function.
    ScalarConstant(f64),
    /// Replace the affine coefficient of one variable in a scalar function.
    ScalarCoefficient {
        variable: VariableRef,
        coefficient: f64,
    },
    /// Replace the coefficient on the unordered pair `{variable_1, variable_2}`.
    QuadraticCoefficient {
        variable_1: VariableRef,
        variable_2: VariableRef,
        coefficient: f64,
    },
    /// Replace the constant vector of a vector affine or quadratic function.
    VectorConstants(Vec<f64>),
    /// Replace the coefficient of one variable in several rows.
    MultirowCoefficient {
        variable: VariableRef,
        new_coefficients: Vec<(usize, f64)>,
    },
}

impl FunctionChange {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionChange::ScalarConstant(_) => "ScalarConstant",
            FunctionChange::ScalarCoefficient { .. } => "ScalarCoefficient",
            FunctionChange::QuadraticCoefficient { .. } => "QuadraticCoefficient",
            FunctionChange::VectorConstants(_) => "VectorConstants",
            FunctionChange::MultirowCoefficient { .. } => "MultirowCoefficient",
        }
    }

    /// Variables the change introduces or touches.
    pub fn variables(&self) -> Vec<VariableRef> {
        match self {
            FunctionChange::ScalarConstant(_) | FunctionChange::VectorConstants(_) => Vec::new(),
            FunctionChange::ScalarCoefficient { variable, .. }
            | FunctionChange::MultirowCoefficient { variable, .. } => vec![*variable],
            FunctionChange::QuadraticCoefficient {
                variable_1,
                variable_2,
                ..
            } => vec![*variable_1, *variable_2],
        }
    }

    fn check_values(&self) -> Result<(), FunctionError> {
        match self {
            FunctionChange::ScalarConstant(value) => ensure_finite(*value),
            FunctionChange::ScalarCoefficient { coefficient, .. }
            | FunctionChange::QuadraticCoefficient { coefficient, .. } => ensure_finite(*coefficient),
            FunctionChange::VectorConstants(values) => {
                values.iter().try_for_each(|value| ensure_finite(*value))
            }
            FunctionChange::MultirowCoefficient {
                new_coefficients, ..
            } => new_coefficients
                .iter()
                .try_for_each(|(_, coefficient)| ensure_finite(*coefficient)),
        }
    }
}

impl Function {
    /// Apply `change` in place. On error the function is left untouched.
    pub fn apply_change(&mut self, change: &FunctionChange) -> Result<(), FunctionError> {
        let not_applicable = FunctionError::ChangeNotApplicable {
            change: change.name(),
            function: self.function_type(),
        };
        if !self.function_type().is_modifiable() {
            return Err(not_applicable);
        }
        change.check_values()?;
        match (self, change) {
            (Function::ScalarAffine(f), FunctionChange::ScalarConstant(value)) => {
                f.set_constant(*value);
            }
            (Function::ScalarQuadratic(f), FunctionChange::ScalarConstant(value)) => {
                f.affine_mut().set_constant(*value);
            }
            (
                Function::ScalarAffine(f),
                FunctionChange::ScalarCoefficient {
                    variable,
                    coefficient,
                },
            ) => f.set_coefficient(*variable, *coefficient),
            (
                Function::ScalarQuadratic(f),
                FunctionChange::ScalarCoefficient {
                    variable,
                    coefficient,
                },
            ) => f.affine_mut().set_coefficient(*variable, *coefficient),
            (
                Function::ScalarQuadratic(f),
                FunctionChange::QuadraticCoefficient {
                    variable_1,
                    variable_2,
                    coefficient,
                },
            ) => f.set_quadratic_coefficient(*variable_1, *variable_2, *coefficient),
            (Function::VectorAffine(f), FunctionChange::VectorConstants(values)) => {
                f.set_constants(values)?;
            }
            (Function::VectorQuadratic(f), FunctionChange::VectorConstants(values)) => {
                f.set_constants(values)?;
            }
            (
                Function::VectorAffine(f),
                FunctionChange::MultirowCoefficient {
                    variable,
                    new_coefficients,
                },
            ) => f.set_row_coefficients(*variable, new_coefficients)?,
            (
                Function::VectorQuadratic(f),
                FunctionChange::MultirowCoefficient {
                    variable,
                    new_coefficients,
                },
            ) => f.set_row_coefficients(*variable, new_coefficients)?,
            _ => return Err(not_applicable),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::function::{
        FunctionType, ScalarAffineFunction, ScalarQuadraticFunction, VectorAffineFunction,
    };
    use crate::refs::InstanceId;

    fn vars(n: u32) -> Vec<VariableRef> {
        let owner = InstanceId::fresh();
        (0..n).map(|i| VariableRef::new(owner, i, 0)).collect()
    }

    #[test]
    fn scalar_constant_on_affine() {
        let v = vars(1);
        let mut f = Function::from(ScalarAffineFunction::new(vec![(v[0], 1.0)], 0.0));
        f.apply_change(&FunctionChange::ScalarConstant(4.0)).unwrap();
        assert_eq!(f.evaluate(&|_| Some(1.0)), Some(vec![5.0]));
    }

    #[test]
    fn scalar_coefficient_on_quadratic_touches_affine_part() {
        let v = vars(2);
        let mut f = Function::from(ScalarQuadraticFunction::new(
            vec![(v[0], v[1], 1.0)],
            ScalarAffineFunction::new(vec![(v[0], 1.0)], 0.0),
        ));
        f.apply_change(&FunctionChange::ScalarCoefficient {
            variable: v[1],
            coefficient: 2.0,
        })
        .unwrap();
        assert_eq!(f.evaluate(&|_| Some(1.0)), Some(vec![4.0]));
    }

    #[test]
    fn multirow_on_vector_affine() {
        let v = vars(2);
        let mut f = Function::from(VectorAffineFunction::from_variables(&v, &[0.0, 0.0]).unwrap());
        f.apply_change(&FunctionChange::MultirowCoefficient {
            variable: v[1],
            new_coefficients: vec![(0, 2.0), (1, 3.0)],
        })
        .unwrap();
        assert_eq!(f.evaluate(&|_| Some(1.0)), Some(vec![3.0, 3.0]));
    }

    #[test]
    fn vector_constants_length_checked() {
        let v = vars(2);
        let mut f = Function::from(VectorAffineFunction::from_variables(&v, &[0.0, 0.0]).unwrap());
        let err = f
            .apply_change(&FunctionChange::VectorConstants(vec![1.0]))
            .unwrap_err();
        assert_eq!(err, FunctionError::ConstantLengthMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn change_on_wrong_type_is_rejected() {
        let v = vars(1);
        let mut f = Function::from(v[0]);
        let err = f
            .apply_change(&FunctionChange::ScalarConstant(1.0))
            .unwrap_err();
        assert_eq!(
            err,
            FunctionError::ChangeNotApplicable {
                change: "ScalarConstant",
                function: FunctionType::ScalarVariable,
            }
        );
        assert_eq!(f, Function::ScalarVariable(v[0]));
    }

    #[test]
    fn variable_functions_reject_every_change() {
        let v = vars(2);
        let changes = [
            FunctionChange::ScalarConstant(f64::NAN),
            FunctionChange::ScalarCoefficient {
                variable: v[0],
                coefficient: 2.0,
            },
            FunctionChange::VectorConstants(vec![1.0, 1.0]),
            FunctionChange::MultirowCoefficient {
                variable: v[1],
                new_coefficients: vec![(0, 1.0)],
            },
        ];
        for original in [Function::from(v[0]), Function::VectorOfVariables(v.clone())] {
            assert!(!original.function_type().is_modifiable());
            for change in &changes {
                let mut f = original.clone();
                let err = f.apply_change(change).unwrap_err();
                assert_eq!(
                    err,
                    FunctionError::ChangeNotApplicable {
                        change: change.name(),
                        function: original.function_type(),
                    }
                );
                assert_eq!(f, original);
            }
        }
    }

    #[test]
    fn non_finite_change_is_rejected() {
        let v = vars(1);
        let mut f = Function::from(ScalarAffineFunction::new(vec![(v[0], 1.0)], 0.0));
        assert!(
            f.apply_change(&FunctionChange::ScalarConstant(f64::INFINITY))
                .is_err()
        );
    }
}
