//! Function construction and modification errors.

use crate::function::FunctionType;

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionError {
    /// Parallel variable and coefficient inputs differ in length.
    MismatchedLengths { variables: usize, coefficients: usize },
    /// A coefficient or constant is NaN or infinite.
    NonFiniteCoefficient { value: f64 },
    /// Vector-valued function with no rows.
    EmptyVector,
    /// Variables issued by different instances in one function.
    MixedOwners,
    /// Row index outside the function's output dimension.
    RowOutOfBounds { row: usize, rows: usize },
    /// Replacement constants do not match the output dimension.
    ConstantLengthMismatch { expected: usize, got: usize },
    /// The requested change does not apply to this function type.
    ChangeNotApplicable {
        change: &'static str,
        function: FunctionType,
    },
}

impl FunctionError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            FunctionError::MismatchedLengths { .. } => "FUNCTION_MISMATCHED_LENGTHS",
            FunctionError::NonFiniteCoefficient { .. } => "FUNCTION_NON_FINITE_COEFFICIENT",
            FunctionError::EmptyVector => "FUNCTION_EMPTY_VECTOR",
            FunctionError::MixedOwners => "FUNCTION_MIXED_OWNERS",
            FunctionError::RowOutOfBounds { .. } => "FUNCTION_ROW_OUT_OF_BOUNDS",
            FunctionError::ConstantLengthMismatch { .. } => "FUNCTION_CONSTANT_LENGTH",
            FunctionError::ChangeNotApplicable { .. } => "FUNCTION_CHANGE_NOT_APPLICABLE",
        }
    }
}

impl std::fmt::Display for FunctionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionError::MismatchedLengths {
                variables,
                coefficients,
            } => write!(
                f,
                "[{}] variables ({}) and coefficients ({}) must have the same length",
                self.code(),
                variables,
                coefficients
            ),
            FunctionError::NonFiniteCoefficient { value } => write!(
                f,
                "[{}] coefficients must be finite (got {})",
                self.code(),
                value
            ),
            FunctionError::EmptyVector => {
                write!(f, "[{}] vector function needs at least one row", self.code())
            }
            FunctionError::MixedOwners => write!(
                f,
                "[{}] function mixes variables from different instances",
                self.code()
            ),
            FunctionError::RowOutOfBounds { row, rows } => write!(
                f,
                "[{}] row {} out of bounds (function has {} rows)",
                self.code(),
                row,
                rows
            ),
            FunctionError::ConstantLengthMismatch { expected, got } => write!(
                f,
                "[{}] expected {} constants, got {}",
                self.code(),
                expected,
                got
            ),
            FunctionError::ChangeNotApplicable { change, function } => write!(
                f,
                "[{}] {} cannot be applied to {}",
                self.code(),
                change,
                function.as_str()
            ),
        }
    }
}

impl std::error::Error for FunctionError {}

pub(crate) fn ensure_finite(value: f64) -> Result<(), FunctionError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(FunctionError::NonFiniteCoefficient { value })
    }
}

#[cfg(test)]
mod tests {
    use super::FunctionError;
    use crate::function::FunctionType;

    #[test]
    fn error_code_is_stable() {
        assert_eq!(FunctionError::EmptyVector.code(), "FUNCTION_EMPTY_VECTOR");
        assert_eq!(
            FunctionError::MismatchedLengths {
                variables: 1,
                coefficients: 2
            }
            .code(),
            "FUNCTION_MISMATCHED_LENGTHS"
        );
    }

    #[test]
    fn display_prefixes_error_code() {
        let rendered = FunctionError::ChangeNotApplicable {
            change: "ScalarConstant",
            function: FunctionType::VectorAffine,
        }
        .to_string();
        assert!(rendered.starts_with("[FUNCTION_CHANGE_NOT_APPLICABLE]"));
        assert!(rendered.contains("VectorAffineFunction"));
    }
}
