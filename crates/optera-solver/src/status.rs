//! Termination and result status codes.

use serde::Serialize;

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TerminationStatusCode {
    /// Sentinel before the first `optimize()` and after any model edit.
    OptimizeNotCalled,
    /// The solver found what it was asked for to its tolerances.
    Success,
    /// Success to relaxed tolerances.
    AlmostSuccess,
    /// Proven infeasible without a certificate.
    InfeasibleNoResult,
    /// Proven unbounded without a certificate.
    UnboundedNoResult,
    InfeasibleOrUnbounded,
    IterationLimit,
    TimeLimit,
    NodeLimit,
    SolutionLimit,
    MemoryLimit,
    ObjectiveLimit,
    OtherLimit,
    SlowProgress,
    NumericalError,
    InvalidModel,
    InvalidOption,
    Interrupted,
    OtherError,
}

impl TerminationStatusCode {
    /// Solver stopped on a user-imposed limit.
    pub fn is_limit(self) -> bool {
        matches!(
            self,
            TerminationStatusCode::IterationLimit
                | TerminationStatusCode::TimeLimit
                | TerminationStatusCode::NodeLimit
                | TerminationStatusCode::SolutionLimit
                | TerminationStatusCode::MemoryLimit
                | TerminationStatusCode::ObjectiveLimit
                | TerminationStatusCode::OtherLimit
        )
    }

    /// Check if the status reports a solver-side failure.
    pub fn is_error(self) -> bool {
        matches!(
            self,
            TerminationStatusCode::SlowProgress
                | TerminationStatusCode::NumericalError
                | TerminationStatusCode::InvalidModel
                | TerminationStatusCode::InvalidOption
                | TerminationStatusCode::Interrupted
                | TerminationStatusCode::OtherError
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TerminationStatusCode::OptimizeNotCalled => "optimize_not_called",
            TerminationStatusCode::Success => "success",
            TerminationStatusCode::AlmostSuccess => "almost_success",
            TerminationStatusCode::InfeasibleNoResult => "infeasible_no_result",
            TerminationStatusCode::UnboundedNoResult => "unbounded_no_result",
            TerminationStatusCode::InfeasibleOrUnbounded => "infeasible_or_unbounded",
            TerminationStatusCode::IterationLimit => "iteration_limit",
            TerminationStatusCode::TimeLimit => "time_limit",
            TerminationStatusCode::NodeLimit => "node_limit",
            TerminationStatusCode::SolutionLimit => "solution_limit",
            TerminationStatusCode::MemoryLimit => "memory_limit",
            TerminationStatusCode::ObjectiveLimit => "objective_limit",
            TerminationStatusCode::OtherLimit => "other_limit",
            TerminationStatusCode::SlowProgress => "slow_progress",
            TerminationStatusCode::NumericalError => "numerical_error",
            TerminationStatusCode::InvalidModel => "invalid_model",
            TerminationStatusCode::InvalidOption => "invalid_option",
            TerminationStatusCode::Interrupted => "interrupted",
            TerminationStatusCode::OtherError => "other_error",
        }
    }
}

impl std::fmt::Display for TerminationStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a primal or dual result vector is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResultStatusCode {
    NoSolution,
    FeasiblePoint,
    NearlyFeasiblePoint,
    InfeasiblePoint,
    NearlyInfeasiblePoint,
    /// A ray proving infeasibility of the other side.
    InfeasibilityCertificate,
    NearlyInfeasibilityCertificate,
    ReductionCertificate,
    NearlyReductionCertificate,
    UnknownResultStatus,
}

impl ResultStatusCode {
    pub fn is_feasible_point(self) -> bool {
        matches!(self, ResultStatusCode::FeasiblePoint)
    }

    pub fn is_certificate(self) -> bool {
        matches!(
            self,
            ResultStatusCode::InfeasibilityCertificate
                | ResultStatusCode::NearlyInfeasibilityCertificate
        )
    }

    /// Whether a vector with this status carries values at all.
    pub fn has_values(self) -> bool {
        !matches!(self, ResultStatusCode::NoSolution)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultStatusCode::NoSolution => "no_solution",
            ResultStatusCode::FeasiblePoint => "feasible_point",
            ResultStatusCode::NearlyFeasiblePoint => "nearly_feasible_point",
            ResultStatusCode::InfeasiblePoint => "infeasible_point",
            ResultStatusCode::NearlyInfeasiblePoint => "nearly_infeasible_point",
            ResultStatusCode::InfeasibilityCertificate => "infeasibility_certificate",
            ResultStatusCode::NearlyInfeasibilityCertificate => "nearly_infeasibility_certificate",
            ResultStatusCode::ReductionCertificate => "reduction_certificate",
            ResultStatusCode::NearlyReductionCertificate => "nearly_reduction_certificate",
            ResultStatusCode::UnknownResultStatus => "unknown_result_status",
        }
    }
}

impl std::fmt::Display for ResultStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inference drawn from a `(termination, primal, dual)` status triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Conclusion {
    /// Primal and dual feasible points after `Success`.
    Optimal,
    /// A feasible primal point without a matching dual.
    Feasible,
    /// The dual vector is an infeasibility certificate.
    PrimalInfeasible,
    /// The primal vector is a ray certifying dual infeasibility.
    DualInfeasible,
    NoConclusion,
}

impl Conclusion {
    pub fn classify(
        termination: TerminationStatusCode,
        primal: ResultStatusCode,
        dual: ResultStatusCode,
    ) -> Self {
        if termination == TerminationStatusCode::OptimizeNotCalled {
            return Conclusion::NoConclusion;
        }
        if dual.is_certificate() {
            return Conclusion::PrimalInfeasible;
        }
        if primal.is_certificate() {
            return Conclusion::DualInfeasible;
        }
        if !primal.is_feasible_point() {
            return Conclusion::NoConclusion;
        }
        if termination == TerminationStatusCode::Success && dual.is_feasible_point() {
            Conclusion::Optimal
        } else {
            Conclusion::Feasible
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Conclusion::Optimal => "optimal",
            Conclusion::Feasible => "feasible",
            Conclusion::PrimalInfeasible => "primal_infeasible",
            Conclusion::DualInfeasible => "dual_infeasible",
            Conclusion::NoConclusion => "no_conclusion",
        }
    }
}

impl std::fmt::Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResultStatusCode::{FeasiblePoint, InfeasibilityCertificate, NoSolution};

    #[test]
    fn test_optimal_requires_both_sides_feasible() {
        assert_eq!(
            Conclusion::classify(TerminationStatusCode::Success, FeasiblePoint, FeasiblePoint),
            Conclusion::Optimal
        );
        assert_eq!(
            Conclusion::classify(TerminationStatusCode::Success, FeasiblePoint, NoSolution),
            Conclusion::Feasible
        );
    }

    #[test]
    fn test_limit_with_point_is_only_feasible() {
        assert_eq!(
            Conclusion::classify(TerminationStatusCode::TimeLimit, FeasiblePoint, FeasiblePoint),
            Conclusion::Feasible
        );
    }

    #[test]
    fn test_certificates() {
        assert_eq!(
            Conclusion::classify(
                TerminationStatusCode::Success,
                NoSolution,
                InfeasibilityCertificate
            ),
            Conclusion::PrimalInfeasible
        );
        assert_eq!(
            Conclusion::classify(
                TerminationStatusCode::Success,
                InfeasibilityCertificate,
                NoSolution
            ),
            Conclusion::DualInfeasible
        );
    }

    #[test]
    fn test_nearly_certified_infeasibility_classifies_like_certified() {
        use ResultStatusCode::NearlyInfeasibilityCertificate;
        assert_eq!(
            Conclusion::classify(
                TerminationStatusCode::AlmostSuccess,
                NoSolution,
                NearlyInfeasibilityCertificate
            ),
            Conclusion::PrimalInfeasible
        );
        assert_eq!(
            Conclusion::classify(
                TerminationStatusCode::AlmostSuccess,
                NearlyInfeasibilityCertificate,
                NoSolution
            ),
            Conclusion::DualInfeasible
        );
    }

    #[test]
    fn test_nearly_infeasible_point_carries_values_but_proves_nothing() {
        let status = ResultStatusCode::NearlyInfeasiblePoint;
        assert_eq!(status.as_str(), "nearly_infeasible_point");
        assert_eq!(status.to_string(), "nearly_infeasible_point");
        assert!(status.has_values());
        assert!(!status.is_feasible_point());
        assert!(!status.is_certificate());
        assert_eq!(
            Conclusion::classify(TerminationStatusCode::AlmostSuccess, status, NoSolution),
            Conclusion::NoConclusion
        );
    }

    #[test]
    fn test_not_called_concludes_nothing() {
        assert_eq!(
            Conclusion::classify(
                TerminationStatusCode::OptimizeNotCalled,
                FeasiblePoint,
                FeasiblePoint
            ),
            Conclusion::NoConclusion
        );
    }

    #[test]
    fn test_status_groups() {
        assert!(TerminationStatusCode::NodeLimit.is_limit());
        assert!(!TerminationStatusCode::Success.is_limit());
        assert!(TerminationStatusCode::NumericalError.is_error());
        assert!(!TerminationStatusCode::InfeasibleNoResult.is_error());
        assert!(InfeasibilityCertificate.is_certificate());
        assert!(!NoSolution.has_values());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", TerminationStatusCode::TimeLimit), "time_limit");
        assert_eq!(format!("{}", FeasiblePoint), "feasible_point");
    }
}
