//! Vector-valued functions as ordered rows of scalar functions.

use crate::function::error::FunctionError;
use crate::function::scalar::{ScalarAffineFunction, ScalarQuadraticFunction};
use crate::refs::VariableRef;
use serde::Serialize;

/// Ordered rows of scalar-affine functions. Rows may differ in length.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorAffineFunction {
    rows: Vec<ScalarAffineFunction>,
}

impl VectorAffineFunction {
    pub fn new(rows: Vec<ScalarAffineFunction>) -> Self {
        Self { rows }
    }

    /// One row per variable: `[x1, x2, ...] + constants`.
    pub fn from_variables(variables: &[VariableRef], constants: &[f64]) -> Result<Self, FunctionError> {
        if variables.len() != constants.len() {
            return Err(FunctionError::ConstantLengthMismatch {
                expected: variables.len(),
                got: constants.len(),
            });
        }
        Ok(Self::new(
            variables
                .iter()
                .zip(constants)
                .map(|(variable, constant)| ScalarAffineFunction::new(vec![(*variable, 1.0)], *constant))
                .collect(),
        ))
    }

    pub fn rows(&self) -> &[ScalarAffineFunction] {
        &self.rows
    }

    pub fn output_dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn constants(&self) -> Vec<f64> {
        self.rows.iter().map(ScalarAffineFunction::constant_term).collect()
    }

    pub fn set_constants(&mut self, constants: &[f64]) -> Result<(), FunctionError> {
        set_row_constants(&mut self.rows, constants, ScalarAffineFunction::set_constant)
    }

    /// Replace the coefficient of `variable` in the listed rows.
    pub fn set_row_coefficients(
        &mut self,
        variable: VariableRef,
        changes: &[(usize, f64)],
    ) -> Result<(), FunctionError> {
        check_rows(self.rows.len(), changes)?;
        for (row, coefficient) in changes {
            self.rows[*row].set_coefficient(variable, *coefficient);
        }
        Ok(())
    }

    pub fn evaluate(&self, value_of: &impl Fn(VariableRef) -> Option<f64>) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row.evaluate(value_of)).collect()
    }

    pub(crate) fn validate(&self) -> Result<(), FunctionError> {
        if self.rows.is_empty() {
            return Err(FunctionError::EmptyVector);
        }
        self.rows.iter().try_for_each(ScalarAffineFunction::validate)
    }

    pub(crate) fn variables_iter(&self) -> impl Iterator<Item = VariableRef> + '_ {
        self.rows.iter().flat_map(|row| row.variables_iter())
    }
}

/// Ordered rows of scalar-quadratic functions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorQuadraticFunction {
    rows: Vec<ScalarQuadraticFunction>,
}

impl VectorQuadraticFunction {
    pub fn new(rows: Vec<ScalarQuadraticFunction>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ScalarQuadraticFunction] {
        &self.rows
    }

    pub fn output_dimension(&self) -> usize {
        self.rows.len()
    }

    pub fn constants(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.affine().constant_term()).collect()
    }

    pub fn set_constants(&mut self, constants: &[f64]) -> Result<(), FunctionError> {
        set_row_constants(&mut self.rows, constants, |row: &mut ScalarQuadraticFunction, constant| {
            row.affine_mut().set_constant(constant)
        })
    }

    /// Replace the affine coefficient of `variable` in the listed rows.
    pub fn set_row_coefficients(
        &mut self,
        variable: VariableRef,
        changes: &[(usize, f64)],
    ) -> Result<(), FunctionError> {
        check_rows(self.rows.len(), changes)?;
        for (row, coefficient) in changes {
            self.rows[*row].affine_mut().set_coefficient(variable, *coefficient);
        }
        Ok(())
    }

    pub fn evaluate(&self, value_of: &impl Fn(VariableRef) -> Option<f64>) -> Option<Vec<f64>> {
        self.rows.iter().map(|row| row.evaluate(value_of)).collect()
    }

    pub(crate) fn validate(&self) -> Result<(), FunctionError> {
        if self.rows.is_empty() {
            return Err(FunctionError::EmptyVector);
        }
        self.rows.iter().try_for_each(ScalarQuadraticFunction::validate)
    }

    pub(crate) fn variables_iter(&self) -> impl Iterator<Item = VariableRef> + '_ {
        self.rows.iter().flat_map(|row| row.variables_iter())
    }
}

fn check_rows(rows: usize, changes: &[(usize, f64)]) -> Result<(), FunctionError> {
    if let Some((row, _)) = changes.iter().find(|(row, _)| *row >= rows) {
        return Err(FunctionError::RowOutOfBounds { row: *row, rows });
    }
    Ok(())
}

fn set_row_constants<T>(
    rows: &mut [T],
    constants: &[f64],
    mut apply: impl FnMut(&mut T, f64),
) -> Result<(), FunctionError> {
    if rows.len() != constants.len() {
        return Err(FunctionError::ConstantLengthMismatch {
            expected: rows.len(),
            got: constants.len(),
        });
    }
    for (row, constant) in rows.iter_mut().zip(constants) {
        apply(row, *constant);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::refs::InstanceId;

    fn vars(n: u32) -> Vec<VariableRef> {
        let owner = InstanceId::fresh();
        (0..n).map(|i| VariableRef::new(owner, i, 0)).collect()
    }

    #[test]
    fn rows_may_differ_in_length() {
        let v = vars(3);
        let f = VectorAffineFunction::new(vec![
            ScalarAffineFunction::new(vec![(v[0], 1.0)], 0.0),
            ScalarAffineFunction::new(vec![(v[1], 1.0), (v[2], 2.0)], 1.0),
        ]);
        assert_eq!(f.output_dimension(), 2);
        assert_eq!(f.evaluate(&|_| Some(1.0)), Some(vec![1.0, 4.0]));
    }

    #[test]
    fn empty_vector_is_invalid() {
        let f = VectorAffineFunction::new(Vec::new());
        assert_eq!(f.validate(), Err(FunctionError::EmptyVector));
    }

    #[test]
    fn from_variables_requires_matching_constants() {
        let v = vars(2);
        assert!(VectorAffineFunction::from_variables(&v, &[0.0]).is_err());
        let f = VectorAffineFunction::from_variables(&v, &[1.0, -1.0]).unwrap();
        assert_eq!(f.constants(), vec![1.0, -1.0]);
    }

    #[test]
    fn set_row_coefficients_checks_bounds() {
        let v = vars(2);
        let mut f = VectorAffineFunction::from_variables(&v, &[0.0, 0.0]).unwrap();
        assert_eq!(
            f.set_row_coefficients(v[0], &[(2, 1.0)]),
            Err(FunctionError::RowOutOfBounds { row: 2, rows: 2 })
        );
        f.set_row_coefficients(v[0], &[(1, 3.0)]).unwrap();
        assert_eq!(f.rows()[1].coefficient_of(v[0]), 3.0);
    }

    #[test]
    fn quadratic_constants_roundtrip() {
        let v = vars(1);
        let mut f = VectorQuadraticFunction::new(vec![ScalarQuadraticFunction::new(
            vec![(v[0], v[0], 1.0)],
            ScalarAffineFunction::constant(2.0),
        )]);
        f.set_constants(&[5.0]).unwrap();
        assert_eq!(f.constants(), vec![5.0]);
        assert_eq!(f.evaluate(&|_| Some(2.0)), Some(vec![9.0]));
    }
}
