//! HiGHS backend for optera solver instances.
//!
//! [`HighsBackend`] keeps a native copy of the model and rebuilds a HiGHS
//! row problem from it on every solve. The [`ffi`] module wraps the parts
//! of HiGHS the `highs` crate does not expose.

pub mod backend;
pub mod ffi;
mod native;
mod status;

pub use backend::HighsBackend;
pub use ffi::{HighsModel, HighsModelError, HighsOption, SolutionSnapshot, highs_version};
