//! Adding and deleting variables and constraints, and replacing the objective.

use crate::instance::store::{VariableEntry, constraint_key, variable_key};
use crate::instance::{ObjectiveState, SolverInstance};
use optera_expr::{
    ConstraintRef, ConstraintType, Function, FunctionType, Incompatibility, ScalarAffineFunction,
    Set, VariableRef, check_compatible,
};
use optera_solver::{Backend, OptimizationSense, SolverError, StaleHandle};
use std::collections::BTreeSet;
use std::time::Instant;

/// Validate a `(function, set)` pair on its own.
pub(crate) fn validate_pair(function: &Function, set: &Set) -> Result<(), SolverError> {
    function.validate()?;
    set.validate()?;
    check_compatible(function, set).map_err(|err| match err {
        Incompatibility::Shape => SolverError::DimensionMismatch {
            function: function.output_dimension(),
            set: set.dimension(),
        },
        Incompatibility::Dimension { function, set } => {
            SolverError::DimensionMismatch { function, set }
        }
    })
}

impl<B: Backend> SolverInstance<B> {
    /// Add a free continuous variable.
    pub fn add_variable(&mut self) -> Result<VariableRef, SolverError> {
        let key = self.variables.next_key();
        let variable = VariableRef::new(self.id, key.index, key.generation);
        self.backend.add_variable(variable)?;
        self.variables.insert(VariableEntry::default());
        self.invalidate_results("add_variable");
        tracing::trace!(
            component = "instance",
            operation = "add_variable",
            status = "success",
            variable = key.index,
            "Added variable"
        );
        Ok(variable)
    }

    /// Add `count` variables, returned in creation order.
    ///
    /// Variables added before a backend failure stay in the model.
    pub fn add_variables(&mut self, count: usize) -> Result<Vec<VariableRef>, SolverError> {
        let started = Instant::now();
        let variables = (0..count)
            .map(|_| self.add_variable())
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(
            component = "instance",
            operation = "add_variables",
            status = "success",
            variables = count,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Added variables"
        );
        Ok(variables)
    }

    /// Add a variable together with a `ScalarVariable`-in-`set` constraint.
    ///
    /// The set and the backend's support for it are checked before the
    /// variable is created.
    pub fn add_constrained_variable(
        &mut self,
        set: Set,
    ) -> Result<(VariableRef, ConstraintRef), SolverError> {
        set.validate()?;
        if !set.is_scalar() {
            return Err(SolverError::DimensionMismatch {
                function: 1,
                set: set.dimension(),
            });
        }
        let constraint_type = ConstraintType::new(FunctionType::ScalarVariable, set.set_type());
        if !self.backend.supports_constraint(constraint_type) {
            return Err(SolverError::UnsupportedConstraint(constraint_type));
        }
        let variable = self.add_variable()?;
        let constraint = self.add_constraint(variable, set)?;
        Ok((variable, constraint))
    }

    /// Delete a variable.
    ///
    /// `ScalarVariable` constraints on it are deleted with it. Every other
    /// constraint referencing it, and the objective if it does, becomes
    /// inconsistent: queries on them fail with `StaleReference` and the
    /// model cannot be optimized until they are deleted or replaced.
    pub fn delete_variable(&mut self, variable: VariableRef) -> Result<(), SolverError> {
        self.ensure_variable(variable)?;
        if !self.backend.supports_variable_deletion() {
            return Err(SolverError::UnsupportedDelete("variables"));
        }
        self.backend.delete_variable(variable)?;
        self.forget_variable(variable);
        self.invalidate_results("delete_variable");
        Ok(())
    }

    /// Delete several variables in handle order.
    ///
    /// All handles are checked before any is removed, so a stale handle
    /// deletes nothing. The backend deletes one variable at a time: when it
    /// fails, the variables it already deleted are gone from the instance
    /// too, and the failing variable and the ones after it stay live.
    pub fn delete_variables(&mut self, variables: &[VariableRef]) -> Result<(), SolverError> {
        let unique: BTreeSet<VariableRef> = variables.iter().copied().collect();
        unique
            .iter()
            .try_for_each(|variable| self.ensure_variable(*variable))?;
        if !self.backend.supports_variable_deletion() {
            return Err(SolverError::UnsupportedDelete("variables"));
        }
        for (deleted, variable) in unique.into_iter().enumerate() {
            if let Err(err) = self.backend.delete_variable(variable) {
                tracing::warn!(
                    component = "instance",
                    operation = "delete_variables",
                    status = "error",
                    variable = variable.index(),
                    deleted,
                    error = %err,
                    "Backend stopped variable deletion"
                );
                return Err(err);
            }
            self.forget_variable(variable);
            self.invalidate_results("delete_variables");
        }
        Ok(())
    }

    fn forget_variable(&mut self, variable: VariableRef) {
        let users = self
            .variables
            .remove(variable_key(variable))
            .map(|entry| entry.users)
            .unwrap_or_default();

        let mut removed = 0_usize;
        let mut orphaned = 0_usize;
        for constraint in users {
            let bound_only = self
                .constraints
                .get(constraint)
                .is_some_and(|entry| entry.function == Function::ScalarVariable(variable));
            if bound_only {
                self.constraints.remove(constraint);
                self.attributes.forget_constraint(constraint);
                removed += 1;
            } else if let Some(entry) = self.constraints.get_mut(constraint) {
                entry.consistent = false;
                orphaned += 1;
            }
        }
        let objective_orphaned = self.objective.function.references(variable);
        if objective_orphaned {
            self.objective.consistent = false;
        }
        self.attributes.forget_variable(variable);

        tracing::debug!(
            component = "instance",
            operation = "delete_variable",
            status = "success",
            variable = variable.index(),
            removed_constraints = removed,
            orphaned_constraints = orphaned,
            objective_orphaned,
            "Deleted variable"
        );
    }

    /// Add the constraint `function ∈ set`.
    ///
    /// # Errors
    ///
    /// `InvalidFunction`, `InvalidSet` or `DimensionMismatch` for a malformed
    /// pair, `StaleReference` for a variable that is not live in this
    /// instance, `UnsupportedConstraint` when the backend rejects the pair.
    pub fn add_constraint(
        &mut self,
        function: impl Into<Function>,
        set: Set,
    ) -> Result<ConstraintRef, SolverError> {
        let function = function.into();
        validate_pair(&function, &set)?;
        self.ensure_function_variables(&function)?;
        let constraint_type = ConstraintType::of(&function, &set);
        if !self.backend.supports_constraint(constraint_type) {
            return Err(SolverError::UnsupportedConstraint(constraint_type));
        }

        let constraint = self.constraints.next_ref(self.id, constraint_type);
        self.backend.add_constraint(constraint, &function, &set)?;
        for variable in function.variables() {
            if let Some(entry) = self.variables.get_mut(variable_key(variable)) {
                entry.users.insert(constraint);
            }
        }
        self.constraints.insert(constraint, function, set);
        self.invalidate_results("add_constraint");
        tracing::trace!(
            component = "instance",
            operation = "add_constraint",
            status = "success",
            constraint = constraint_key(constraint).index,
            constraint_type = %constraint_type,
            "Added constraint"
        );
        Ok(constraint)
    }

    /// Delete a constraint. Inconsistent constraints may be deleted.
    pub fn delete_constraint(&mut self, constraint: ConstraintRef) -> Result<(), SolverError> {
        let variables = self
            .live_constraint(constraint)
            .map(|entry| entry.function.variables())
            .ok_or(SolverError::StaleReference(StaleHandle::Constraint(constraint)))?;
        if !self.backend.supports_constraint_deletion() {
            return Err(SolverError::UnsupportedDelete("constraints"));
        }
        self.backend.delete_constraint(constraint)?;
        self.constraints.remove(constraint);
        for variable in variables {
            if let Some(entry) = self.variables.get_mut(variable_key(variable)) {
                entry.users.remove(&constraint);
            }
        }
        self.attributes.forget_constraint(constraint);
        self.invalidate_results("delete_constraint");
        tracing::debug!(
            component = "instance",
            operation = "delete_constraint",
            status = "success",
            constraint = constraint.index(),
            constraint_type = %constraint.constraint_type(),
            "Deleted constraint"
        );
        Ok(())
    }

    /// Replace the objective.
    ///
    /// `Feasibility` discards `function` and stores a constant zero.
    pub fn set_objective(
        &mut self,
        sense: OptimizationSense,
        function: impl Into<Function>,
    ) -> Result<(), SolverError> {
        let function = match sense {
            OptimizationSense::Feasibility => {
                Function::ScalarAffine(ScalarAffineFunction::constant(0.0))
            }
            _ => function.into(),
        };
        function.validate()?;
        if !function.function_type().is_scalar() {
            return Err(SolverError::DimensionMismatch {
                function: function.output_dimension(),
                set: 1,
            });
        }
        self.ensure_function_variables(&function)?;
        if !self.backend.supports_objective(function.function_type()) {
            return Err(SolverError::UnsupportedObjective(function.function_type()));
        }
        self.backend.set_objective(sense, &function)?;

        let function_type = function.function_type();
        self.objective = ObjectiveState {
            sense,
            function,
            consistent: true,
        };
        self.invalidate_results("set_objective");
        tracing::debug!(
            component = "instance",
            operation = "set_objective",
            status = "success",
            sense = sense.as_str(),
            function_type = function_type.as_str(),
            "Set objective function"
        );
        Ok(())
    }

    /// Change the sense while keeping the objective function.
    ///
    /// Switching to `Feasibility` clears the function.
    pub fn set_objective_sense(&mut self, sense: OptimizationSense) -> Result<(), SolverError> {
        if sense == self.objective.sense {
            return Ok(());
        }
        let function = self.objective_function()?.clone();
        self.set_objective(sense, function)
    }
}
