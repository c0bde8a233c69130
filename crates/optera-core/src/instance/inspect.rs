//! Instance inspection and snapshots.

use crate::instance::{LifecycleState, SolverInstance};
use optera_expr::{ConstraintRef, ConstraintType, Function, Set, VariableRef};
use optera_solver::{Backend, OptimizationSense, TerminationStatusCode};
use serde::Serialize;
use std::collections::BTreeSet;

/// View of a variable in an instance snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct VariableView {
    pub variable: VariableRef,
    pub name: Option<String>,
    pub primal_start: Option<f64>,
    /// Number of constraints referencing the variable.
    pub constraints: usize,
}

/// View of a constraint in an instance snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ConstraintView {
    pub constraint: ConstraintRef,
    pub constraint_type: ConstraintType,
    pub name: Option<String>,
    /// False once a referenced variable has been deleted.
    pub consistent: bool,
    pub function: Option<Function>,
    pub set: Set,
}

/// View of the objective in an instance snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectiveView {
    pub sense: OptimizationSense,
    pub consistent: bool,
    pub function: Option<Function>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SnapshotMetadata {
    pub variables: usize,
    pub constraints: usize,
    pub constraint_types: usize,
    pub state: LifecycleState,
    pub termination_status: TerminationStatusCode,
    pub result_count: usize,
}

/// A complete snapshot of an instance.
#[derive(Debug, Clone, Serialize)]
pub struct InstanceSnapshot {
    pub name: String,
    pub solver: String,
    pub variables: Vec<VariableView>,
    pub constraints: Vec<ConstraintView>,
    pub objective: ObjectiveView,
    pub metadata: SnapshotMetadata,
}

impl InstanceSnapshot {
    /// Render the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Options for inspecting an instance.
#[derive(Debug, Clone)]
pub struct InspectOptions {
    /// Include constraint and objective functions, not only their types.
    pub include_functions: bool,
    pub constraint_types: Option<Vec<ConstraintType>>,
    pub variable_filter: Option<Vec<VariableRef>>,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self {
            include_functions: true,
            constraint_types: None,
            variable_filter: None,
        }
    }
}

impl<B: Backend> SolverInstance<B> {
    /// Snapshot everything the instance stores, in creation order.
    pub fn snapshot(&self, options: InspectOptions) -> InstanceSnapshot {
        let InspectOptions {
            include_functions,
            constraint_types,
            variable_filter,
        } = options;
        let type_filter: Option<BTreeSet<ConstraintType>> =
            constraint_types.map(|types| types.into_iter().collect());
        let var_filter: Option<BTreeSet<VariableRef>> =
            variable_filter.map(|variables| variables.into_iter().collect());

        let variables = self
            .variables
            .iter()
            .map(|(key, entry)| (VariableRef::new(self.id, key.index, key.generation), entry))
            .filter(|(variable, _)| var_filter.as_ref().is_none_or(|filter| filter.contains(variable)))
            .map(|(variable, entry)| VariableView {
                variable,
                name: self.variable_name(variable).map(str::to_string),
                primal_start: self.attributes.variable_primal_start.get(&variable).copied(),
                constraints: entry.users.len(),
            })
            .collect();

        let constraints = self
            .constraints
            .iter(self.id)
            .filter(|(constraint, _)| {
                type_filter
                    .as_ref()
                    .is_none_or(|filter| filter.contains(&constraint.constraint_type()))
            })
            .map(|(constraint, entry)| ConstraintView {
                constraint,
                constraint_type: constraint.constraint_type(),
                name: self.constraint_name(constraint).map(str::to_string),
                consistent: entry.consistent,
                function: include_functions.then(|| entry.function.clone()),
                set: entry.set.clone(),
            })
            .collect();

        let objective = ObjectiveView {
            sense: self.objective.sense,
            consistent: self.objective.consistent,
            function: include_functions.then(|| self.objective.function.clone()),
        };

        let metadata = SnapshotMetadata {
            variables: self.number_of_variables(),
            constraints: self.total_constraints(),
            constraint_types: self.list_of_constraint_types_present().len(),
            state: self.lifecycle_state(),
            termination_status: self.termination_status(),
            result_count: self.result_count(),
        };

        tracing::debug!(
            component = "instance",
            operation = "snapshot",
            status = "success",
            variables = metadata.variables,
            constraints = metadata.constraints,
            "Captured instance snapshot"
        );

        InstanceSnapshot {
            name: self.attributes.name.clone(),
            solver: self.backend.solver_name().to_string(),
            variables,
            constraints,
            objective,
            metadata,
        }
    }
}
