//! Typed results a backend hands back from `optimize()`.

use crate::attribute::{AttributeValue, ResultIndex};
use crate::config::SolverConfig;
use crate::status::{Conclusion, ResultStatusCode, TerminationStatusCode};
use optera_expr::{ConstraintRef, VariableRef};
use std::collections::BTreeMap;

/// One primal/dual result pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultVector {
    pub primal_status: ResultStatusCode,
    pub dual_status: ResultStatusCode,
    pub objective_value: Option<f64>,
    pub dual_objective_value: Option<f64>,
    pub variable_primal: BTreeMap<VariableRef, f64>,
    /// Constraint function values; the instance evaluates missing entries.
    pub constraint_primal: BTreeMap<ConstraintRef, Vec<f64>>,
    pub constraint_dual: BTreeMap<ConstraintRef, Vec<f64>>,
}

impl ResultVector {
    pub fn new(primal_status: ResultStatusCode, dual_status: ResultStatusCode) -> Self {
        Self {
            primal_status,
            dual_status,
            objective_value: None,
            dual_objective_value: None,
            variable_primal: BTreeMap::new(),
            constraint_primal: BTreeMap::new(),
            constraint_dual: BTreeMap::new(),
        }
    }

    pub fn with_objective_value(mut self, value: f64) -> Self {
        self.objective_value = Some(value);
        self
    }

    pub fn with_primal(mut self, values: impl IntoIterator<Item = (VariableRef, f64)>) -> Self {
        self.variable_primal.extend(values);
        self
    }

    pub fn with_duals(mut self, values: impl IntoIterator<Item = (ConstraintRef, Vec<f64>)>) -> Self {
        self.constraint_dual.extend(values);
        self
    }

    pub fn has_primal(&self) -> bool {
        self.primal_status.has_values()
    }

    pub fn has_dual(&self) -> bool {
        self.dual_status.has_values()
    }
}

/// Everything the instance answers result attributes from.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResults {
    pub termination_status: TerminationStatusCode,
    /// Solver-specific explanation of the termination status.
    pub raw_status: String,
    /// Result vectors, best first.
    pub results: Vec<ResultVector>,
    pub objective_bound: Option<f64>,
    pub relative_gap: Option<f64>,
    pub solve_time_seconds: f64,
    pub simplex_iterations: Option<usize>,
    pub barrier_iterations: Option<usize>,
    pub node_count: Option<usize>,
    /// Backend-specific results, answered through `RawResult(name)`.
    pub extra: BTreeMap<String, AttributeValue>,
}

impl SolveResults {
    pub fn new(termination_status: TerminationStatusCode, raw_status: impl Into<String>) -> Self {
        Self {
            termination_status,
            raw_status: raw_status.into(),
            results: Vec::new(),
            objective_bound: None,
            relative_gap: None,
            solve_time_seconds: 0.0,
            simplex_iterations: None,
            barrier_iterations: None,
            node_count: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_result(mut self, result: ResultVector) -> Self {
        self.results.push(result);
        self
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn result(&self, index: ResultIndex) -> Option<&ResultVector> {
        self.results.get(index.position())
    }

    /// `NoSolution` for indices past `result_count()`.
    pub fn primal_status(&self, index: ResultIndex) -> ResultStatusCode {
        self.result(index)
            .map_or(ResultStatusCode::NoSolution, |result| result.primal_status)
    }

    /// `NoSolution` for indices past `result_count()`.
    pub fn dual_status(&self, index: ResultIndex) -> ResultStatusCode {
        self.result(index)
            .map_or(ResultStatusCode::NoSolution, |result| result.dual_status)
    }

    pub fn conclusion(&self, index: ResultIndex) -> Conclusion {
        Conclusion::classify(
            self.termination_status,
            self.primal_status(index),
            self.dual_status(index),
        )
    }
}

/// Model-independent inputs for one `optimize()` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptimizeRequest {
    pub config: SolverConfig,
    pub variable_primal_start: BTreeMap<VariableRef, f64>,
    pub constraint_primal_start: BTreeMap<ConstraintRef, Vec<f64>>,
    pub constraint_dual_start: BTreeMap<ConstraintRef, Vec<f64>>,
}

impl OptimizeRequest {
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn has_warm_start(&self) -> bool {
        !self.variable_primal_start.is_empty()
            || !self.constraint_primal_start.is_empty()
            || !self.constraint_dual_start.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use optera_expr::InstanceId;

    #[test]
    fn test_status_past_result_count_is_no_solution() {
        let results = SolveResults::new(TerminationStatusCode::Success, "optimal").with_result(
            ResultVector::new(ResultStatusCode::FeasiblePoint, ResultStatusCode::FeasiblePoint),
        );
        let second = ResultIndex::new(2).unwrap();
        assert_eq!(results.result_count(), 1);
        assert_eq!(results.primal_status(second), ResultStatusCode::NoSolution);
        assert_eq!(results.conclusion(ResultIndex::FIRST), Conclusion::Optimal);
        assert_eq!(results.conclusion(second), Conclusion::NoConclusion);
    }

    #[test]
    fn test_result_builders() {
        let x = VariableRef::new(InstanceId::fresh(), 0, 0);
        let result = ResultVector::new(ResultStatusCode::FeasiblePoint, ResultStatusCode::NoSolution)
            .with_objective_value(2.5)
            .with_primal([(x, 1.0)]);
        assert!(result.has_primal());
        assert!(!result.has_dual());
        assert_eq!(result.variable_primal.get(&x), Some(&1.0));
    }

    #[test]
    fn test_request_warm_start() {
        let mut request = OptimizeRequest::new(SolverConfig::new().with_silent(true));
        assert!(!request.has_warm_start());
        request
            .variable_primal_start
            .insert(VariableRef::new(InstanceId::fresh(), 0, 0), 1.0);
        assert!(request.has_warm_start());
    }
}
