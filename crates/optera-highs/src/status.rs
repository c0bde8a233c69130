//! HiGHS model status and solution status conversions.

use highs::HighsModelStatus;
use optera_solver::{ResultStatusCode, TerminationStatusCode};

pub(crate) fn termination_status(status: HighsModelStatus) -> TerminationStatusCode {
    match status {
        HighsModelStatus::Optimal => TerminationStatusCode::Success,
        HighsModelStatus::Infeasible => TerminationStatusCode::InfeasibleNoResult,
        HighsModelStatus::Unbounded => TerminationStatusCode::UnboundedNoResult,
        HighsModelStatus::UnboundedOrInfeasible => TerminationStatusCode::InfeasibleOrUnbounded,
        HighsModelStatus::ReachedTimeLimit => TerminationStatusCode::TimeLimit,
        HighsModelStatus::ReachedIterationLimit => TerminationStatusCode::IterationLimit,
        HighsModelStatus::ModelError => TerminationStatusCode::InvalidModel,
        _ => TerminationStatusCode::OtherError,
    }
}

pub(crate) fn raw_status(status: HighsModelStatus) -> &'static str {
    match status {
        HighsModelStatus::Optimal => "optimal",
        HighsModelStatus::Infeasible => "infeasible",
        HighsModelStatus::Unbounded => "unbounded",
        HighsModelStatus::UnboundedOrInfeasible => "unbounded_or_infeasible",
        HighsModelStatus::ReachedTimeLimit => "time_limit",
        HighsModelStatus::ReachedIterationLimit => "iteration_limit",
        HighsModelStatus::ModelError => "model_error",
        _ => "unknown",
    }
}

/// Map a HiGHS `*_solution_status` info value (0 none, 1 infeasible,
/// 2 feasible) to a result status.
pub(crate) fn solution_status(info: Option<usize>) -> ResultStatusCode {
    match info {
        Some(2) => ResultStatusCode::FeasiblePoint,
        Some(1) => ResultStatusCode::InfeasiblePoint,
        _ => ResultStatusCode::NoSolution,
    }
}
