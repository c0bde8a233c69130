//! The solver instance: owner of every store and of the backend.
//!
//! # Module Organization
//!
//! - `arena`: generational slots behind variable and constraint handles
//! - `store`: constraint storage and the per-type index
//! - `builder`: adding and deleting variables, constraints and the objective
//! - `modify`: in-place function edits and set replacement
//! - `attributes`: the capability-checked attribute protocol
//! - `optimize`: the solve lifecycle
//! - `check`: primal and dual feasibility checks on stored results
//! - `inspect`: snapshots for diagnostics

mod arena;
mod attributes;
mod builder;
mod check;
mod inspect;
mod modify;
mod optimize;
mod store;

use crate::instance::arena::Arena;
use crate::instance::attributes::AttributeStore;
use crate::instance::store::{ConstraintStore, StoredConstraint, VariableEntry, variable_key};
use optera_expr::{ConstraintRef, Function, InstanceId, ScalarAffineFunction, VariableRef};
use optera_solver::{
    Backend, OptimizationSense, SolveResults, SolverConfig, SolverError, StaleHandle,
};

pub use check::{FeasibilityReport, Violation};
pub use inspect::{
    ConstraintView, InspectOptions, InstanceSnapshot, ObjectiveView, SnapshotMetadata,
    VariableView,
};

/// Where an instance is in its solve lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum LifecycleState {
    /// No results: never optimized, or mutated since the last solve.
    Unoptimized,
    /// Inside `optimize()`.
    Optimizing,
    /// Holding results from the last `optimize()`.
    Optimized,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Unoptimized => "unoptimized",
            LifecycleState::Optimizing => "optimizing",
            LifecycleState::Optimized => "optimized",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum InstanceState {
    Unoptimized,
    Optimizing,
    Optimized(SolveResults),
}

#[derive(Debug, Clone)]
pub(crate) struct ObjectiveState {
    pub sense: OptimizationSense,
    pub function: Function,
    /// False once a variable the function references has been deleted.
    pub consistent: bool,
}

impl ObjectiveState {
    fn feasibility() -> Self {
        Self {
            sense: OptimizationSense::Feasibility,
            function: Function::ScalarAffine(ScalarAffineFunction::constant(0.0)),
            consistent: true,
        }
    }
}

/// A model held in front of one backend.
///
/// The instance validates every request, keeps its own copy of the model,
/// and only commits a change once the backend has accepted it. Handles it
/// issues carry its [`InstanceId`] and are rejected by every other instance.
#[derive(Debug)]
pub struct SolverInstance<B: Backend> {
    id: InstanceId,
    backend: B,
    pub(crate) variables: Arena<VariableEntry>,
    pub(crate) constraints: ConstraintStore,
    pub(crate) objective: ObjectiveState,
    pub(crate) attributes: AttributeStore,
    pub(crate) state: InstanceState,
}

impl<B: Backend> SolverInstance<B> {
    /// Create an empty feasibility problem in front of `backend`.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, SolverConfig::default())
    }

    /// Create an empty instance whose optimizer attributes start from `config`.
    pub fn with_config(backend: B, config: SolverConfig) -> Self {
        let id = InstanceId::fresh();
        tracing::debug!(
            component = "instance",
            operation = "create",
            status = "success",
            instance = id.inner(),
            solver = backend.solver_name(),
            configured = !config.is_empty(),
            "Created solver instance"
        );
        Self {
            id,
            backend,
            variables: Arena::new(),
            constraints: ConstraintStore::default(),
            objective: ObjectiveState::feasibility(),
            attributes: AttributeStore::with_config(config),
            state: InstanceState::Unoptimized,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &SolverConfig {
        &self.attributes.config
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        match self.state {
            InstanceState::Unoptimized => LifecycleState::Unoptimized,
            InstanceState::Optimizing => LifecycleState::Optimizing,
            InstanceState::Optimized(_) => LifecycleState::Optimized,
        }
    }

    /// Results of the last solve, if still valid.
    pub fn results(&self) -> Option<&SolveResults> {
        match &self.state {
            InstanceState::Optimized(results) => Some(results),
            _ => None,
        }
    }

    pub fn is_valid_variable(&self, variable: VariableRef) -> bool {
        variable.owner() == self.id && self.variables.contains(variable_key(variable))
    }

    /// Whether `constraint` is live, of the tagged type and still consistent.
    pub fn is_valid_constraint(&self, constraint: ConstraintRef) -> bool {
        self.live_constraint(constraint)
            .is_some_and(|entry| entry.consistent)
    }

    pub fn number_of_variables(&self) -> usize {
        self.variables.len()
    }

    /// Live variables in creation order.
    pub fn list_of_variables(&self) -> Vec<VariableRef> {
        self.variables
            .iter()
            .map(|(key, _)| VariableRef::new(self.id, key.index, key.generation))
            .collect()
    }

    pub fn objective_sense(&self) -> OptimizationSense {
        self.objective.sense
    }

    /// The objective function; a constant zero for feasibility problems.
    pub fn objective_function(&self) -> Result<&Function, SolverError> {
        if !self.objective.consistent {
            return Err(SolverError::StaleReference(StaleHandle::Objective));
        }
        Ok(&self.objective.function)
    }

    pub(crate) fn ensure_variable(&self, variable: VariableRef) -> Result<(), SolverError> {
        if self.is_valid_variable(variable) {
            Ok(())
        } else {
            Err(SolverError::StaleReference(StaleHandle::Variable(variable)))
        }
    }

    pub(crate) fn ensure_function_variables(&self, function: &Function) -> Result<(), SolverError> {
        function
            .variables()
            .into_iter()
            .try_for_each(|variable| self.ensure_variable(variable))
    }

    /// Entry behind a live handle, consistent or not.
    pub(crate) fn live_constraint(&self, constraint: ConstraintRef) -> Option<&StoredConstraint> {
        if constraint.owner() != self.id {
            return None;
        }
        self.constraints.get(constraint)
    }

    /// Entry behind a live handle whose variables all still exist.
    pub(crate) fn ensure_constraint(
        &self,
        constraint: ConstraintRef,
    ) -> Result<&StoredConstraint, SolverError> {
        self.live_constraint(constraint)
            .filter(|entry| entry.consistent)
            .ok_or(SolverError::StaleReference(StaleHandle::Constraint(constraint)))
    }

    /// Drop results after a change to the mathematical model.
    pub(crate) fn invalidate_results(&mut self, operation: &'static str) {
        if matches!(self.state, InstanceState::Optimized(_)) {
            self.state = InstanceState::Unoptimized;
            tracing::debug!(
                component = "instance",
                operation = "invalidate_results",
                status = "success",
                cause = operation,
                "Dropped results after model change"
            );
        }
    }
}
