//! The backend boundary.

use crate::attribute::{AttributeKind, OptimizationSense};
use crate::error::SolverError;
use crate::results::{OptimizeRequest, SolveResults};
use optera_expr::{
    ConstraintRef, ConstraintType, Function, FunctionChange, FunctionType, Set, VariableRef,
};

/// A numerical solver driven by a `SolverInstance`.
///
/// The instance validates every input before calling in: handles are live,
/// functions and sets are well formed, and the matching `supports_*` query
/// answered `true`. A backend keeps its own native copy of the model and
/// must leave it unchanged when it returns an error.
pub trait Backend {
    fn solver_name(&self) -> &str;

    fn supports_constraint(&self, constraint_type: ConstraintType) -> bool;

    fn supports_objective(&self, function_type: FunctionType) -> bool;

    /// A `true` answer commits the backend to accepting the whole problem.
    fn supports_problem(&self, objective: FunctionType, constraints: &[ConstraintType]) -> bool {
        self.supports_objective(objective)
            && constraints
                .iter()
                .all(|constraint_type| self.supports_constraint(*constraint_type))
    }

    fn supports_variable_deletion(&self) -> bool {
        false
    }

    fn supports_constraint_deletion(&self) -> bool {
        false
    }

    /// Whether `change` can be applied in place to a function of this type.
    fn supports_modification(&self, _function_type: FunctionType, _change: &FunctionChange) -> bool {
        false
    }

    /// Whether the backend honors the optimizer parameter `kind`.
    fn supports_parameter(&self, kind: &AttributeKind) -> bool {
        matches!(kind, AttributeKind::Silent | AttributeKind::TimeLimitSec)
    }

    fn add_variable(&mut self, variable: VariableRef) -> Result<(), SolverError>;

    /// Remove a variable along with every `ScalarVariable` constraint on it.
    /// Other constraints referencing it are deleted separately by the instance.
    fn delete_variable(&mut self, _variable: VariableRef) -> Result<(), SolverError> {
        Err(SolverError::UnsupportedDelete("variables"))
    }

    fn add_constraint(
        &mut self,
        constraint: ConstraintRef,
        function: &Function,
        set: &Set,
    ) -> Result<(), SolverError>;

    fn delete_constraint(&mut self, _constraint: ConstraintRef) -> Result<(), SolverError> {
        Err(SolverError::UnsupportedDelete("constraints"))
    }

    /// Replace the set of a constraint with one of the same set type.
    fn set_constraint_set(&mut self, constraint: ConstraintRef, _set: &Set) -> Result<(), SolverError> {
        Err(SolverError::UnsupportedModification(format!(
            "set replacement on {}",
            constraint.constraint_type()
        )))
    }

    /// Replace the objective. `Feasibility` arrives with a constant zero function.
    fn set_objective(
        &mut self,
        sense: OptimizationSense,
        function: &Function,
    ) -> Result<(), SolverError>;

    fn modify_constraint(
        &mut self,
        _constraint: ConstraintRef,
        change: &FunctionChange,
    ) -> Result<(), SolverError> {
        Err(SolverError::UnsupportedModification(change.name().to_string()))
    }

    fn modify_objective(&mut self, change: &FunctionChange) -> Result<(), SolverError> {
        Err(SolverError::UnsupportedModification(change.name().to_string()))
    }

    /// Solve the current model. Solver outcomes, including failures to find
    /// a solution, are reported through `SolveResults::termination_status`.
    ///
    /// # Errors
    ///
    /// Returns `SolverError::BackendFailure` only when the backend itself
    /// could not run.
    fn optimize(&mut self, request: &OptimizeRequest) -> Result<SolveResults, SolverError>;
}

/// Capability query over a whole problem shape.
pub fn supports_problem(
    backend: &dyn Backend,
    objective: FunctionType,
    constraints: &[ConstraintType],
) -> bool {
    backend.supports_problem(objective, constraints)
}
