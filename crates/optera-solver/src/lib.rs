//! Shared solver abstractions for optera.
//!
//! This crate provides the types both sides of the backend boundary agree
//! on: the `Backend` trait, attribute kinds and values, status codes, the
//! error enum and typed solve results.
//!
//! # Overview
//!
//! - [`Backend`]: Trait every solver backend implements
//! - [`AttributeKind`]: Closed set of queryable/settable attributes
//! - [`TerminationStatusCode`], [`ResultStatusCode`]: Status model
//! - [`SolverConfig`]: Optimizer parameters passed with each solve
//! - [`SolveResults`]: What a backend returns from `optimize()`
//! - [`SolverError`]: Error types for instance and backend operations

mod attribute;
mod config;
mod error;
mod results;
mod status;
mod traits;

pub use attribute::{
    AttributeAccess, AttributeKind, AttributeScope, AttributeTarget, AttributeValue, Availability,
    OptimizationSense, ResultIndex, ValueType,
};
pub use config::SolverConfig;
pub use error::{SolverError, StaleHandle};
pub use results::{OptimizeRequest, ResultVector, SolveResults};
pub use status::{Conclusion, ResultStatusCode, TerminationStatusCode};
pub use traits::{Backend, supports_problem};
