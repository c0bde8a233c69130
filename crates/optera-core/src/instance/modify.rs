//! In-place edits of stored functions and constraint sets.
//!
//! Every edit is applied to a copy first. The stored model only changes
//! once the copy is valid and the backend has accepted the edit.

use crate::instance::SolverInstance;
use crate::instance::builder::validate_pair;
use crate::instance::store::variable_key;
use optera_expr::{ConstraintRef, Function, FunctionChange, FunctionError, Set, VariableRef};
use optera_solver::{Backend, OptimizationSense, SolverError};
use std::collections::BTreeSet;

fn edited(function: &Function, change: &FunctionChange) -> Result<Function, SolverError> {
    let mut candidate = function.clone();
    candidate.apply_change(change).map_err(|err| {
        if matches!(err, FunctionError::ChangeNotApplicable { .. }) {
            SolverError::UnsupportedModification(err.to_string())
        } else {
            SolverError::InvalidFunction(err)
        }
    })?;
    Ok(candidate)
}

impl<B: Backend> SolverInstance<B> {
    /// Apply `change` to the function of `constraint`.
    pub fn modify_constraint(
        &mut self,
        constraint: ConstraintRef,
        change: &FunctionChange,
    ) -> Result<(), SolverError> {
        let entry = self.ensure_constraint(constraint)?;
        let function_type = entry.function.function_type();
        let candidate = edited(&entry.function, change)?;
        let before = entry.function.variables();
        change
            .variables()
            .into_iter()
            .try_for_each(|variable| self.ensure_variable(variable))?;
        validate_pair(&candidate, &entry.set)?;
        if !self.backend.supports_modification(function_type, change) {
            return Err(SolverError::UnsupportedModification(format!(
                "{} on {}",
                change.name(),
                function_type
            )));
        }
        self.backend.modify_constraint(constraint, change)?;

        let after = candidate.variables();
        if let Some(entry) = self.constraints.get_mut(constraint) {
            entry.function = candidate;
        }
        self.reindex_users(constraint, &before, &after);
        self.invalidate_results("modify_constraint");
        tracing::debug!(
            component = "instance",
            operation = "modify_constraint",
            status = "success",
            constraint = constraint.index(),
            change = change.name(),
            "Modified constraint function"
        );
        Ok(())
    }

    /// Apply `change` to the objective function.
    pub fn modify_objective(&mut self, change: &FunctionChange) -> Result<(), SolverError> {
        if self.objective.sense == OptimizationSense::Feasibility {
            return Err(SolverError::UnsupportedModification(format!(
                "{} on a feasibility objective",
                change.name()
            )));
        }
        let current = self.objective_function()?;
        let function_type = current.function_type();
        let candidate = edited(current, change)?;
        change
            .variables()
            .into_iter()
            .try_for_each(|variable| self.ensure_variable(variable))?;
        candidate.validate()?;
        if !self.backend.supports_modification(function_type, change) {
            return Err(SolverError::UnsupportedModification(format!(
                "{} on {} objective",
                change.name(),
                function_type
            )));
        }
        self.backend.modify_objective(change)?;

        self.objective.function = candidate;
        self.invalidate_results("modify_objective");
        tracing::debug!(
            component = "instance",
            operation = "modify_objective",
            status = "success",
            change = change.name(),
            "Modified objective function"
        );
        Ok(())
    }

    /// Replace the set of `constraint` with another set of the same type.
    pub fn set_constraint_set(
        &mut self,
        constraint: ConstraintRef,
        set: Set,
    ) -> Result<(), SolverError> {
        let entry = self.ensure_constraint(constraint)?;
        let expected = entry.set.set_type();
        if set.set_type() != expected {
            return Err(SolverError::InvalidConstraintSet {
                expected,
                got: set.set_type(),
            });
        }
        validate_pair(&entry.function, &set)?;
        self.backend.set_constraint_set(constraint, &set)?;

        if let Some(entry) = self.constraints.get_mut(constraint) {
            entry.set = set;
        }
        self.invalidate_results("set_constraint_set");
        tracing::debug!(
            component = "instance",
            operation = "set_constraint_set",
            status = "success",
            constraint = constraint.index(),
            set_type = expected.as_str(),
            "Replaced constraint set"
        );
        Ok(())
    }

    fn reindex_users(
        &mut self,
        constraint: ConstraintRef,
        before: &BTreeSet<VariableRef>,
        after: &BTreeSet<VariableRef>,
    ) {
        for variable in before.difference(after) {
            if let Some(entry) = self.variables.get_mut(variable_key(*variable)) {
                entry.users.remove(&constraint);
            }
        }
        for variable in after.difference(before) {
            if let Some(entry) = self.variables.get_mut(variable_key(*variable)) {
                entry.users.insert(constraint);
            }
        }
    }
}
