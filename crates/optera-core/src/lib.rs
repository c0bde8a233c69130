//! Optera core: a solver-agnostic model instance in front of a backend.
//!
//! A [`SolverInstance`] owns the variable registry, the constraint store,
//! the objective and the attribute store, and forwards every accepted edit
//! to its [`Backend`](optera_solver::Backend).

pub mod instance;
pub mod logging;

pub use instance::{
    ConstraintView, FeasibilityReport, InspectOptions, InstanceSnapshot, LifecycleState,
    ObjectiveView, SnapshotMetadata, SolverInstance, VariableView, Violation,
};
pub use logging::{LoggingError, init_logging};
