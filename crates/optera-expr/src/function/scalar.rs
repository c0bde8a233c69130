//! Scalar-valued affine and quadratic functions.

use crate::function::error::{FunctionError, ensure_finite};
use crate::refs::VariableRef;
use serde::Serialize;
use std::collections::BTreeMap;

/// `coefficient * variable`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalarAffineTerm {
    pub variable: VariableRef,
    pub coefficient: f64,
}

impl ScalarAffineTerm {
    pub fn new(variable: VariableRef, coefficient: f64) -> Self {
        Self {
            variable,
            coefficient,
        }
    }
}

/// `Σ coefficient·variable + constant`, terms kept in insertion order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScalarAffineFunction {
    terms: Vec<ScalarAffineTerm>,
    constant: f64,
}

impl ScalarAffineFunction {
    /// Function from `(variable, coefficient)` pairs and a constant.
    pub fn new(terms: Vec<(VariableRef, f64)>, constant: f64) -> Self {
        Self {
            terms: terms
                .into_iter()
                .map(|(variable, coefficient)| ScalarAffineTerm::new(variable, coefficient))
                .collect(),
            constant,
        }
    }

    /// Constant function with no variable terms.
    pub fn constant(constant: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant,
        }
    }

    /// Build from parallel variable and coefficient vectors.
    pub fn from_parts(
        variables: Vec<VariableRef>,
        coefficients: Vec<f64>,
        constant: f64,
    ) -> Result<Self, FunctionError> {
        if variables.len() != coefficients.len() {
            return Err(FunctionError::MismatchedLengths {
                variables: variables.len(),
                coefficients: coefficients.len(),
            });
        }
        Ok(Self::new(variables.into_iter().zip(coefficients).collect(), constant))
    }

    pub fn terms(&self) -> &[ScalarAffineTerm] {
        &self.terms
    }

    pub fn constant_term(&self) -> f64 {
        self.constant
    }

    /// Sum of all coefficients on `variable` (duplicates included).
    pub fn coefficient_of(&self, variable: VariableRef) -> f64 {
        self.terms
            .iter()
            .filter(|term| term.variable == variable)
            .map(|term| term.coefficient)
            .sum()
    }

    /// Merged terms with duplicates combined and zeros dropped, ordered by variable.
    pub fn canonical(&self) -> Self {
        let mut merged: BTreeMap<VariableRef, f64> = BTreeMap::new();
        for term in &self.terms {
            *merged.entry(term.variable).or_insert(0.0) += term.coefficient;
        }
        Self::new(
            merged.into_iter().filter(|(_, c)| *c != 0.0).collect(),
            self.constant,
        )
    }

    pub fn evaluate(&self, value_of: &impl Fn(VariableRef) -> Option<f64>) -> Option<f64> {
        let mut total = self.constant;
        for term in &self.terms {
            total += term.coefficient * value_of(term.variable)?;
        }
        Some(total)
    }

    /// Replace the coefficient of `variable`. Duplicate terms on the same
    /// variable collapse into the first occurrence; a zero removes the term.
    pub fn set_coefficient(&mut self, variable: VariableRef, coefficient: f64) {
        let first = self.terms.iter().position(|term| term.variable == variable);
        match first {
            Some(position) => {
                let mut seen = 0usize;
                self.terms.retain(|term| {
                    if term.variable != variable {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
                if coefficient == 0.0 {
                    self.terms.remove(position);
                } else {
                    self.terms[position].coefficient = coefficient;
                }
            }
            None if coefficient != 0.0 => {
                self.terms.push(ScalarAffineTerm::new(variable, coefficient));
            }
            None => {}
        }
    }

    pub fn set_constant(&mut self, constant: f64) {
        self.constant = constant;
    }

    pub(crate) fn validate(&self) -> Result<(), FunctionError> {
        ensure_finite(self.constant)?;
        for term in &self.terms {
            ensure_finite(term.coefficient)?;
        }
        Ok(())
    }

    pub(crate) fn variables_iter(&self) -> impl Iterator<Item = VariableRef> + '_ {
        self.terms.iter().map(|term| term.variable)
    }
}

/// `coefficient * variable_1 * variable_2`, with `variable_1 <= variable_2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScalarQuadraticTerm {
    pub variable_1: VariableRef,
    pub variable_2: VariableRef,
    pub coefficient: f64,
}

/// `Σ c·xi·xj + affine`.
///
/// Quadratic terms form a symmetric map from unordered variable pairs to
/// coefficients: `(x, y, a)` and `(y, x, b)` merge into one `(x, y, a + b)`
/// term, and a diagonal term `(x, x, c)` contributes exactly `c·x²`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ScalarQuadraticFunction {
    quadratic: Vec<ScalarQuadraticTerm>,
    affine: ScalarAffineFunction,
}

fn ordered_pair(a: VariableRef, b: VariableRef) -> (VariableRef, VariableRef) {
    if a <= b { (a, b) } else { (b, a) }
}

impl ScalarQuadraticFunction {
    pub fn new(
        quadratic: Vec<(VariableRef, VariableRef, f64)>,
        affine: ScalarAffineFunction,
    ) -> Self {
        let mut merged: BTreeMap<(VariableRef, VariableRef), f64> = BTreeMap::new();
        for (a, b, coefficient) in quadratic {
            *merged.entry(ordered_pair(a, b)).or_insert(0.0) += coefficient;
        }
        Self {
            quadratic: merged
                .into_iter()
                .filter(|(_, c)| *c != 0.0)
                .map(|((variable_1, variable_2), coefficient)| ScalarQuadraticTerm {
                    variable_1,
                    variable_2,
                    coefficient,
                })
                .collect(),
            affine,
        }
    }

    pub fn quadratic_terms(&self) -> &[ScalarQuadraticTerm] {
        &self.quadratic
    }

    pub fn affine(&self) -> &ScalarAffineFunction {
        &self.affine
    }

    pub fn affine_mut(&mut self) -> &mut ScalarAffineFunction {
        &mut self.affine
    }

    /// Coefficient on the unordered pair `{a, b}`.
    pub fn quadratic_coefficient(&self, a: VariableRef, b: VariableRef) -> f64 {
        let (variable_1, variable_2) = ordered_pair(a, b);
        self.quadratic
            .iter()
            .find(|term| term.variable_1 == variable_1 && term.variable_2 == variable_2)
            .map_or(0.0, |term| term.coefficient)
    }

    /// Replace the coefficient on the unordered pair `{a, b}`.
    pub fn set_quadratic_coefficient(&mut self, a: VariableRef, b: VariableRef, coefficient: f64) {
        let (variable_1, variable_2) = ordered_pair(a, b);
        let position = self.quadratic.binary_search_by(|term| {
            (term.variable_1, term.variable_2).cmp(&(variable_1, variable_2))
        });
        match (position, coefficient == 0.0) {
            (Ok(index), true) => {
                self.quadratic.remove(index);
            }
            (Ok(index), false) => self.quadratic[index].coefficient = coefficient,
            (Err(_), true) => {}
            (Err(index), false) => self.quadratic.insert(
                index,
                ScalarQuadraticTerm {
                    variable_1,
                    variable_2,
                    coefficient,
                },
            ),
        }
    }

    pub fn evaluate(&self, value_of: &impl Fn(VariableRef) -> Option<f64>) -> Option<f64> {
        let mut total = self.affine.evaluate(value_of)?;
        for term in &self.quadratic {
            total += term.coefficient * value_of(term.variable_1)? * value_of(term.variable_2)?;
        }
        Some(total)
    }

    pub(crate) fn validate(&self) -> Result<(), FunctionError> {
        self.affine.validate()?;
        for term in &self.quadratic {
            ensure_finite(term.coefficient)?;
        }
        Ok(())
    }

    pub(crate) fn variables_iter(&self) -> impl Iterator<Item = VariableRef> + '_ {
        self.quadratic
            .iter()
            .flat_map(|term| [term.variable_1, term.variable_2])
            .chain(self.affine.variables_iter())
    }
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
    fn from_parts_rejects_mismatched_lengths() {
        let v = vars(2);
        let result = ScalarAffineFunction::from_parts(v, vec![1.0], 0.0);
        assert_eq!(
            result.unwrap_err(),
            FunctionError::MismatchedLengths {
                variables: 2,
                coefficients: 1
            }
        );
    }

    #[test]
    fn evaluate_affine() {
        let v = vars(2);
        let f = ScalarAffineFunction::new(vec![(v[0], 2.0), (v[1], -1.0)], 3.0);
        let value = f.evaluate(&|x| Some(if x == v[0] { 4.0 } else { 1.0 }));
        assert_eq!(value, Some(10.0));
    }

    #[test]
    fn evaluate_missing_value_is_none() {
        let v = vars(1);
        let f = ScalarAffineFunction::new(vec![(v[0], 1.0)], 0.0);
        assert_eq!(f.evaluate(&|_| None), None);
    }

    #[test]
    fn set_coefficient_collapses_duplicates() {
        let v = vars(2);
        let mut f = ScalarAffineFunction::new(vec![(v[0], 1.0), (v[1], 2.0), (v[0], 5.0)], 0.0);
        f.set_coefficient(v[0], 7.0);
        assert_eq!(f.terms().len(), 2);
        assert_eq!(f.coefficient_of(v[0]), 7.0);
        assert_eq!(f.terms()[0].variable, v[0]);
    }

    #[test]
    fn set_coefficient_zero_removes_term() {
        let v = vars(2);
        let mut f = ScalarAffineFunction::new(vec![(v[0], 1.0), (v[1], 2.0)], 0.0);
        f.set_coefficient(v[0], 0.0);
        assert_eq!(f.terms().len(), 1);
        assert_eq!(f.coefficient_of(v[0]), 0.0);

        f.set_coefficient(v[0], 4.0);
        assert_eq!(f.terms().last().map(|t| t.variable), Some(v[0]));
    }

    #[test]
    fn canonical_merges_and_drops_zeros() {
        let v = vars(2);
        let f = ScalarAffineFunction::new(vec![(v[1], 1.0), (v[0], 2.0), (v[1], -1.0)], 0.5);
        let canonical = f.canonical();
        assert_eq!(canonical.terms(), &[ScalarAffineTerm::new(v[0], 2.0)]);
        assert_eq!(canonical.constant_term(), 0.5);
    }

    #[test]
    fn quadratic_terms_are_symmetric() {
        let v = vars(2);
        let a = ScalarQuadraticFunction::new(vec![(v[0], v[1], 1.0), (v[1], v[0], 2.0)], Default::default());
        let b = ScalarQuadraticFunction::new(vec![(v[1], v[0], 3.0)], Default::default());
        assert_eq!(a, b);
        assert_eq!(a.quadratic_coefficient(v[1], v[0]), 3.0);
    }

    #[test]
    fn diagonal_term_is_not_doubled() {
        let v = vars(1);
        let f = ScalarQuadraticFunction::new(vec![(v[0], v[0], 2.0)], ScalarAffineFunction::constant(1.0));
        assert_eq!(f.evaluate(&|_| Some(3.0)), Some(19.0));
    }

    #[test]
    fn set_quadratic_coefficient_keeps_order() {
        let v = vars(3);
        let mut f = ScalarQuadraticFunction::new(vec![(v[0], v[2], 1.0)], Default::default());
        f.set_quadratic_coefficient(v[1], v[0], 4.0);
        f.set_quadratic_coefficient(v[2], v[0], 0.0);
        assert_eq!(f.quadratic_terms().len(), 1);
        assert_eq!(f.quadratic_coefficient(v[0], v[1]), 4.0);
    }

    #[test]
    fn validate_rejects_nan() {
        let v = vars(1);
        let f = ScalarAffineFunction::new(vec![(v[0], f64::NAN)], 0.0);
        assert!(matches!(
            f.validate(),
            Err(FunctionError::NonFiniteCoefficient { .. })
        ));
    }
}
