//! Builder functions for composing affine functions.

use crate::function::scalar::ScalarAffineFunction;
use crate::function::vector::VectorAffineFunction;

/// Concatenate the terms of several affine functions and add their constants.
///
/// Duplicate variable terms are NOT merged; call `canonical()` on the result
/// when consolidation is needed.
pub fn affine_sum(functions: Vec<ScalarAffineFunction>) -> ScalarAffineFunction {
    let mut terms = Vec::new();
    let mut constant = 0.0;
    for function in functions {
        constant += function.constant_term();
        terms.extend(
            function
                .terms()
                .iter()
                .map(|term| (term.variable, term.coefficient)),
        );
    }
    ScalarAffineFunction::new(terms, constant)
}

/// Scale every coefficient and the constant by `by`, dropping zero terms.
pub fn affine_scale(function: &ScalarAffineFunction, by: f64) -> ScalarAffineFunction {
    ScalarAffineFunction::new(
        function
            .terms()
            .iter()
            .map(|term| (term.variable, term.coefficient * by))
            .filter(|(_, c)| *c != 0.0)
            .collect(),
        function.constant_term() * by,
    )
}

/// Stack scalar rows into one vector function.
pub fn stack(rows: impl IntoIterator<Item = ScalarAffineFunction>) -> VectorAffineFunction {
    VectorAffineFunction::new(rows.into_iter().collect())
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::refs::{InstanceId, VariableRef};

    #[test]
    fn sum_keeps_duplicates_and_adds_constants() {
        let owner = InstanceId::fresh();
        let x = VariableRef::new(owner, 0, 0);
        let total = affine_sum(vec![
            ScalarAffineFunction::new(vec![(x, 1.0)], 1.0),
            ScalarAffineFunction::new(vec![(x, 2.0)], 2.5),
        ]);
        assert_eq!(total.terms().len(), 2);
        assert_eq!(total.constant_term(), 3.5);
        assert_eq!(total.canonical().coefficient_of(x), 3.0);
    }

    #[test]
    fn scale_by_zero_drops_terms() {
        let owner = InstanceId::fresh();
        let x = VariableRef::new(owner, 0, 0);
        let scaled = affine_scale(&ScalarAffineFunction::new(vec![(x, 4.0)], 2.0), 0.0);
        assert!(scaled.terms().is_empty());
        assert_eq!(scaled.constant_term(), 0.0);
    }

    #[test]
    fn stack_preserves_row_order() {
        let stacked = stack([
            ScalarAffineFunction::constant(1.0),
            ScalarAffineFunction::constant(2.0),
        ]);
        assert_eq!(stacked.constants(), vec![1.0, 2.0]);
    }
}
