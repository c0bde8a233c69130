//! The solve lifecycle: `Unoptimized` to `Optimizing` to `Optimized`.

use crate::instance::{InstanceState, SolverInstance};
use optera_solver::{Backend, SolverError, TerminationStatusCode};
use std::time::Instant;

impl<B: Backend> SolverInstance<B> {
    /// Solve the current model and keep the results.
    ///
    /// Solver outcomes, infeasibility included, come back as the returned
    /// termination status and never as errors.
    ///
    /// # Errors
    ///
    /// `InvalidModel` while a constraint or the objective still references a
    /// deleted variable; any backend error, after which the instance holds
    /// no results.
    pub fn optimize(&mut self) -> Result<TerminationStatusCode, SolverError> {
        if self.constraints.has_inconsistent() {
            return Err(SolverError::InvalidModel(
                "a constraint references a deleted variable".to_string(),
            ));
        }
        if !self.objective.consistent {
            return Err(SolverError::InvalidModel(
                "the objective references a deleted variable".to_string(),
            ));
        }

        let request = self.attributes.request();
        let started = Instant::now();
        self.state = InstanceState::Optimizing;
        tracing::debug!(
            component = "instance",
            operation = "optimize",
            status = "start",
            solver = self.backend.solver_name(),
            variables = self.number_of_variables(),
            constraints = self.total_constraints(),
            warm_start = request.has_warm_start(),
            "Starting optimize"
        );

        match self.backend.optimize(&request) {
            Ok(results) => {
                let termination = results.termination_status;
                tracing::debug!(
                    component = "instance",
                    operation = "optimize",
                    status = "success",
                    termination = termination.as_str(),
                    result_count = results.result_count(),
                    duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "Optimize finished"
                );
                self.state = InstanceState::Optimized(results);
                Ok(termination)
            }
            Err(err) => {
                self.state = InstanceState::Unoptimized;
                tracing::warn!(
                    component = "instance",
                    operation = "optimize",
                    status = "error",
                    error_code = err.code(),
                    duration_ms = started.elapsed().as_secs_f64() * 1000.0,
                    "Backend failed during optimize"
                );
                Err(err)
            }
        }
    }
}
