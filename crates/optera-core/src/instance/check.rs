//! Feasibility checks of stored results against the stored model.
//!
//! Duals follow the conic convention: for `min a₀ᵀx + b₀` subject to
//! `Aᵢx + bᵢ ∈ Cᵢ`, each dual `yᵢ` lies in the dual cone `Cᵢ*` and
//! `a₀ − Σ Aᵢᵀyᵢ = 0`. For `max` the stationarity condition is
//! `a₀ + Σ Aᵢᵀyᵢ = 0`.

use crate::instance::SolverInstance;
use optera_expr::{ConstraintRef, Set, VariableRef};
use optera_solver::{AttributeKind, Backend, OptimizationSense, ResultIndex, SolverError};
use serde::Serialize;
use std::collections::BTreeMap;

/// A constraint whose value falls outside its set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub constraint: ConstraintRef,
    /// Primal function values, or dual values for dual checks.
    pub values: Vec<f64>,
    /// Distance to the interval of a scalar set.
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeasibilityReport {
    pub checked: usize,
    /// Constraints whose set membership cannot be decided here.
    pub undecided: Vec<ConstraintRef>,
    pub violations: Vec<Violation>,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    fn record(&mut self, constraint: ConstraintRef, values: Vec<f64>, inside: Option<bool>, bounds: Option<(f64, f64)>) {
        match inside {
            Some(true) => self.checked += 1,
            Some(false) => {
                self.checked += 1;
                let distance = bounds.and_then(|(lower, upper)| {
                    values
                        .first()
                        .map(|value| (lower - value).max(value - upper).max(0.0))
                });
                self.violations.push(Violation {
                    constraint,
                    values,
                    distance,
                });
            }
            None => self.undecided.push(constraint),
        }
    }
}

impl<B: Backend> SolverInstance<B> {
    /// Check the primal values of result `index` against every constraint.
    pub fn check_primal_feasibility(
        &self,
        index: ResultIndex,
        tolerance: f64,
    ) -> Result<FeasibilityReport, SolverError> {
        let mut report = FeasibilityReport::default();
        for (constraint, entry) in self.constraints.iter(self.id) {
            let values = self.constraint_primal(constraint, index)?;
            let inside = entry.set.contains(&values, tolerance);
            report.record(constraint, values, inside, entry.set.scalar_bounds());
        }
        tracing::debug!(
            component = "instance",
            operation = "check_primal_feasibility",
            status = "success",
            checked = report.checked,
            undecided = report.undecided.len(),
            violations = report.violations.len(),
            "Checked primal feasibility"
        );
        Ok(report)
    }

    /// Check that the duals of result `index` lie in the dual cones.
    ///
    /// Constraints whose set has no representable dual cone are undecided.
    pub fn check_dual_feasibility(
        &self,
        index: ResultIndex,
        tolerance: f64,
    ) -> Result<FeasibilityReport, SolverError> {
        let mut report = FeasibilityReport::default();
        for (constraint, entry) in self.constraints.iter(self.id) {
            let Some(cone) = entry.set.dual_cone() else {
                report.undecided.push(constraint);
                continue;
            };
            let values = self.constraint_dual(constraint, index)?;
            let inside = cone.contains(&values, tolerance);
            report.record(constraint, values, inside, cone.scalar_bounds());
        }
        tracing::debug!(
            component = "instance",
            operation = "check_dual_feasibility",
            status = "success",
            checked = report.checked,
            undecided = report.undecided.len(),
            violations = report.violations.len(),
            "Checked dual feasibility"
        );
        Ok(report)
    }

    /// Stationarity residual per variable for an affine model:
    /// `a₀ − Σ Aᵢᵀyᵢ` when minimizing, `a₀ + Σ Aᵢᵀyᵢ` when maximizing.
    ///
    /// Integrality, semicontinuity and SOS constraints are skipped.
    ///
    /// # Errors
    ///
    /// `InvalidModel` when the objective or a constraint is not affine,
    /// `AttributeNotAvailable` when a dual is missing.
    pub fn dual_residual(&self, index: ResultIndex) -> Result<BTreeMap<VariableRef, f64>, SolverError> {
        let objective = self
            .objective_function()?
            .as_scalar_affine()
            .ok_or_else(|| SolverError::InvalidModel("dual residual needs an affine objective".to_string()))?;
        let sign = match self.objective.sense {
            OptimizationSense::Max => 1.0,
            OptimizationSense::Min | OptimizationSense::Feasibility => -1.0,
        };

        let mut residual: BTreeMap<VariableRef, f64> = self
            .list_of_variables()
            .into_iter()
            .map(|variable| (variable, objective.coefficient_of(variable)))
            .collect();

        for (constraint, entry) in self.constraints.iter(self.id) {
            if entry.set.dual_cone().is_none() && !matches!(entry.set, Set::Interval { .. }) {
                continue;
            }
            let rows = entry.function.affine_rows().ok_or_else(|| {
                SolverError::InvalidModel(format!("{} is not affine", constraint.constraint_type()))
            })?;
            let duals = self.constraint_dual(constraint, index)?;
            if duals.len() != rows.len() {
                return Err(SolverError::AttributeNotAvailable(AttributeKind::ConstraintDual(index)));
            }
            for (row, dual) in rows.iter().zip(duals) {
                for term in row.terms() {
                    if let Some(value) = residual.get_mut(&term.variable) {
                        *value += sign * term.coefficient * dual;
                    }
                }
            }
        }
        Ok(residual)
    }
}
