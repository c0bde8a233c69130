//! Solver error types.

use crate::attribute::{AttributeKind, AttributeScope, AttributeTarget};
use optera_expr::{
    ConstraintRef, ConstraintType, FunctionError, FunctionType, SetError, SetType, VariableRef,
};

/// A handle the instance could not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleHandle {
    Variable(VariableRef),
    Constraint(ConstraintRef),
    /// The objective references a deleted variable.
    Objective,
}

impl std::fmt::Display for StaleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleHandle::Variable(variable) => write!(f, "variable {}", variable),
            StaleHandle::Constraint(constraint) => write!(f, "constraint {}", constraint),
            StaleHandle::Objective => write!(f, "objective"),
        }
    }
}

/// Error type for instance and backend operations.
///
/// Every variant is locally recoverable. Solve outcomes such as
/// infeasibility are termination statuses, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The backend does not accept this (function, set) pair.
    UnsupportedConstraint(ConstraintType),
    /// The backend does not accept this objective function type.
    UnsupportedObjective(FunctionType),
    /// The backend cannot delete this kind of entity.
    UnsupportedDelete(&'static str),
    /// The backend rejected an in-place edit.
    UnsupportedModification(String),
    /// A handle is deleted, foreign to this instance, or depends on a deleted variable.
    StaleReference(StaleHandle),
    /// The attribute has no value in the current state.
    AttributeNotAvailable(AttributeKind),
    /// The attribute is read-only or the backend refused it.
    AttributeNotSettable(AttributeKind),
    /// The target does not match the attribute's scope.
    AttributeScopeMismatch {
        kind: AttributeKind,
        expected: AttributeScope,
        target: AttributeTarget,
    },
    /// Wrongly typed or out-of-range attribute value.
    InvalidAttributeValue { kind: AttributeKind, reason: String },
    /// Result index beyond `ResultCount`.
    ResultIndexOutOfBounds { requested: u32, count: usize },
    /// The model cannot be optimized as it stands.
    InvalidModel(String),
    InvalidFunction(FunctionError),
    InvalidSet(SetError),
    /// Function shape or output dimension does not fit the set.
    DimensionMismatch { function: usize, set: usize },
    /// Replacement set has a different set type than the constraint.
    InvalidConstraintSet { expected: SetType, got: SetType },
    /// The backend failed outside the status model.
    BackendFailure(String),
}

impl SolverError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::UnsupportedConstraint(_) => "CONSTRAINT_UNSUPPORTED",
            SolverError::UnsupportedObjective(_) => "OBJECTIVE_UNSUPPORTED",
            SolverError::UnsupportedDelete(_) => "DELETE_UNSUPPORTED",
            SolverError::UnsupportedModification(_) => "MODIFICATION_UNSUPPORTED",
            SolverError::StaleReference(_) => "REFERENCE_STALE",
            SolverError::AttributeNotAvailable(_) => "ATTRIBUTE_NOT_AVAILABLE",
            SolverError::AttributeNotSettable(_) => "ATTRIBUTE_NOT_SETTABLE",
            SolverError::AttributeScopeMismatch { .. } => "ATTRIBUTE_SCOPE_MISMATCH",
            SolverError::InvalidAttributeValue { .. } => "ATTRIBUTE_INVALID_VALUE",
            SolverError::ResultIndexOutOfBounds { .. } => "RESULT_INDEX_OUT_OF_BOUNDS",
            SolverError::InvalidModel(_) => "MODEL_INVALID",
            SolverError::InvalidFunction(_) => "FUNCTION_INVALID",
            SolverError::InvalidSet(_) => "SET_INVALID",
            SolverError::DimensionMismatch { .. } => "CONSTRAINT_DIMENSION_MISMATCH",
            SolverError::InvalidConstraintSet { .. } => "CONSTRAINT_SET_TYPE_CHANGED",
            SolverError::BackendFailure(_) => "BACKEND_FAILURE",
        }
    }
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::UnsupportedConstraint(tag) => {
                write!(f, "[{}] {} constraints are not supported", self.code(), tag)
            }
            SolverError::UnsupportedObjective(function) => write!(
                f,
                "[{}] {} objectives are not supported",
                self.code(),
                function
            ),
            SolverError::UnsupportedDelete(what) => {
                write!(f, "[{}] Backend cannot delete {}", self.code(), what)
            }
            SolverError::UnsupportedModification(what) => {
                write!(f, "[{}] Backend rejected modification: {}", self.code(), what)
            }
            SolverError::StaleReference(handle) => {
                write!(f, "[{}] {} is not valid in this instance", self.code(), handle)
            }
            SolverError::AttributeNotAvailable(kind) => {
                write!(f, "[{}] {} is not available", self.code(), kind)
            }
            SolverError::AttributeNotSettable(kind) => {
                write!(f, "[{}] {} cannot be set", self.code(), kind)
            }
            SolverError::AttributeScopeMismatch {
                kind,
                expected,
                target,
            } => write!(
                f,
                "[{}] {} expects a {:?} target, got {:?}",
                self.code(),
                kind,
                expected,
                target
            ),
            SolverError::InvalidAttributeValue { kind, reason } => {
                write!(f, "[{}] Invalid value for {}: {}", self.code(), kind, reason)
            }
            SolverError::ResultIndexOutOfBounds { requested, count } => write!(
                f,
                "[{}] Result {} requested but only {} available",
                self.code(),
                requested,
                count
            ),
            SolverError::InvalidModel(reason) => {
                write!(f, "[{}] Model is invalid: {}", self.code(), reason)
            }
            SolverError::InvalidFunction(err) => write!(f, "[{}] {}", self.code(), err),
            SolverError::InvalidSet(err) => write!(f, "[{}] {}", self.code(), err),
            SolverError::DimensionMismatch { function, set } => write!(
                f,
                "[{}] Function has {} outputs but set has dimension {}",
                self.code(),
                function,
                set
            ),
            SolverError::InvalidConstraintSet { expected, got } => write!(
                f,
                "[{}] Constraint set must stay {} (got {})",
                self.code(),
                expected,
                got
            ),
            SolverError::BackendFailure(msg) => {
                write!(f, "[{}] Backend failure: {}", self.code(), msg)
            }
        }
    }
}

impl std::error::Error for SolverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolverError::InvalidFunction(err) => Some(err),
            SolverError::InvalidSet(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FunctionError> for SolverError {
    fn from(err: FunctionError) -> Self {
        SolverError::InvalidFunction(err)
    }
}

impl From<SetError> for SolverError {
    fn from(err: SetError) -> Self {
        SolverError::InvalidSet(err)
    }
}
