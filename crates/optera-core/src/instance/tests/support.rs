use optera_expr::{
    ConstraintRef, ConstraintType, Function, FunctionChange, FunctionType, Set, SetType,
    VariableRef,
};
use optera_solver::{
    AttributeKind, Backend, OptimizationSense, OptimizeRequest, ResultStatusCode, ResultVector,
    SolveResults, SolverError, TerminationStatusCode,
};
use std::collections::BTreeMap;

/// Accepts everything it is configured to, records every call, and answers
/// `optimize()` from a script.
#[derive(Debug, Default)]
pub(super) struct RecordingBackend {
    pub calls: Vec<String>,
    pub requests: Vec<OptimizeRequest>,
    pub variables: Vec<VariableRef>,
    pub deletion: bool,
    pub modification: bool,
    pub rejected: Vec<ConstraintType>,
    /// Returned by the next `optimize()` calls instead of the default.
    pub script: Option<SolveResults>,
    pub fail_optimize: bool,
    /// `delete_variable` fails for this variable.
    pub fail_delete: Option<VariableRef>,
}

impl RecordingBackend {
    pub fn deletable() -> Self {
        Self {
            deletion: true,
            ..Self::default()
        }
    }

    pub fn modifiable() -> Self {
        Self {
            modification: true,
            ..Self::default()
        }
    }

    pub fn rejecting(constraint_type: ConstraintType) -> Self {
        Self {
            rejected: vec![constraint_type],
            ..Self::default()
        }
    }

    fn record(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }
}

impl Backend for RecordingBackend {
    fn solver_name(&self) -> &str {
        "recording"
    }

    fn supports_constraint(&self, constraint_type: ConstraintType) -> bool {
        constraint_type.function != FunctionType::VectorQuadratic
            && !self.rejected.contains(&constraint_type)
    }

    fn supports_objective(&self, function_type: FunctionType) -> bool {
        function_type.is_scalar()
    }

    fn supports_variable_deletion(&self) -> bool {
        self.deletion
    }

    fn supports_constraint_deletion(&self) -> bool {
        self.deletion
    }

    fn supports_modification(&self, _function_type: FunctionType, _change: &FunctionChange) -> bool {
        self.modification
    }

    fn supports_parameter(&self, kind: &AttributeKind) -> bool {
        matches!(
            kind,
            AttributeKind::Silent | AttributeKind::TimeLimitSec | AttributeKind::NumberOfThreads
        )
    }

    fn add_variable(&mut self, variable: VariableRef) -> Result<(), SolverError> {
        self.record(format!("add_variable {}", variable));
        self.variables.push(variable);
        Ok(())
    }

    fn delete_variable(&mut self, variable: VariableRef) -> Result<(), SolverError> {
        self.record(format!("delete_variable {}", variable));
        if self.fail_delete == Some(variable) {
            return Err(SolverError::BackendFailure(format!("cannot delete {}", variable)));
        }
        self.variables.retain(|candidate| *candidate != variable);
        Ok(())
    }

    fn add_constraint(
        &mut self,
        constraint: ConstraintRef,
        _function: &Function,
        _set: &Set,
    ) -> Result<(), SolverError> {
        self.record(format!("add_constraint {}", constraint));
        Ok(())
    }

    fn delete_constraint(&mut self, constraint: ConstraintRef) -> Result<(), SolverError> {
        self.record(format!("delete_constraint {}", constraint));
        Ok(())
    }

    fn set_constraint_set(&mut self, constraint: ConstraintRef, _set: &Set) -> Result<(), SolverError> {
        self.record(format!("set_constraint_set {}", constraint));
        Ok(())
    }

    fn set_objective(
        &mut self,
        sense: OptimizationSense,
        function: &Function,
    ) -> Result<(), SolverError> {
        self.record(format!("set_objective {} {}", sense, function.function_type()));
        Ok(())
    }

    fn modify_constraint(
        &mut self,
        constraint: ConstraintRef,
        change: &FunctionChange,
    ) -> Result<(), SolverError> {
        self.record(format!("modify_constraint {} {}", constraint, change.name()));
        Ok(())
    }

    fn modify_objective(&mut self, change: &FunctionChange) -> Result<(), SolverError> {
        self.record(format!("modify_objective {}", change.name()));
        Ok(())
    }

    /// Default answer: `Success` with every variable at zero and no duals.
    fn optimize(&mut self, request: &OptimizeRequest) -> Result<SolveResults, SolverError> {
        self.record("optimize");
        self.requests.push(request.clone());
        if self.fail_optimize {
            return Err(SolverError::BackendFailure("scripted failure".into()));
        }
        if let Some(results) = &self.script {
            return Ok(results.clone());
        }
        let result = ResultVector::new(ResultStatusCode::FeasiblePoint, ResultStatusCode::NoSolution)
            .with_primal(self.variables.iter().map(|variable| (*variable, 0.0)));
        Ok(SolveResults::new(TerminationStatusCode::Success, "recorded").with_result(result))
    }
}

/// Exhaustive search over a small candidate grid per variable.
///
/// Binary and bounded integer variables take every value in their range;
/// continuous variables take their finite bounds, or zero when unbounded.
/// Exact for pure integer models, a coarse heuristic otherwise.
#[derive(Debug, Default)]
pub(super) struct EnumerationBackend {
    variables: Vec<VariableRef>,
    constraints: BTreeMap<ConstraintRef, (Function, Set)>,
    objective: Option<(OptimizationSense, Function)>,
    pub solves: usize,
}

const GRID_LIMIT: usize = 1 << 20;
const TOLERANCE: f64 = 1e-9;

impl EnumerationBackend {
    fn candidates(&self, variable: VariableRef) -> Result<Vec<f64>, SolverError> {
        let mut lower = f64::NEG_INFINITY;
        let mut upper = f64::INFINITY;
        let mut integer = false;
        for (function, set) in self.constraints.values() {
            if *function != Function::ScalarVariable(variable) {
                continue;
            }
            match set {
                Set::ZeroOne => {
                    integer = true;
                    lower = lower.max(0.0);
                    upper = upper.min(1.0);
                }
                Set::Integer => integer = true,
                other => {
                    if let Some((lo, hi)) = other.scalar_bounds() {
                        lower = lower.max(lo);
                        upper = upper.min(hi);
                    }
                }
            }
        }

        if integer {
            if !lower.is_finite() || !upper.is_finite() {
                return Err(SolverError::BackendFailure(format!(
                    "integer variable {} needs finite bounds",
                    variable
                )));
            }
            let (first, last) = (lower.ceil() as i64, upper.floor() as i64);
            return Ok((first..=last).map(|value| value as f64).collect());
        }
        let mut values: Vec<f64> = [lower, upper].into_iter().filter(|v| v.is_finite()).collect();
        values.dedup();
        if values.is_empty() {
            values.push(0.0);
        }
        Ok(values)
    }

    fn objective_of(&self, point: &BTreeMap<VariableRef, f64>) -> f64 {
        self.objective
            .as_ref()
            .and_then(|(_, function)| function.evaluate(&|variable| point.get(&variable).copied()))
            .and_then(|values| values.first().copied())
            .unwrap_or(0.0)
    }

    fn feasible(&self, point: &BTreeMap<VariableRef, f64>) -> bool {
        self.constraints.values().all(|(function, set)| {
            function
                .evaluate(&|variable| point.get(&variable).copied())
                .and_then(|values| set.contains(&values, TOLERANCE))
                .unwrap_or(false)
        })
    }
}

impl Backend for EnumerationBackend {
    fn solver_name(&self) -> &str {
        "enumeration"
    }

    fn supports_constraint(&self, constraint_type: ConstraintType) -> bool {
        let scalar_bound = matches!(
            constraint_type.set,
            SetType::LessThan | SetType::GreaterThan | SetType::EqualTo | SetType::Interval
        );
        match constraint_type.function {
            FunctionType::ScalarVariable => {
                scalar_bound || matches!(constraint_type.set, SetType::ZeroOne | SetType::Integer)
            }
            FunctionType::ScalarAffine => scalar_bound,
            _ => false,
        }
    }

    fn supports_objective(&self, function_type: FunctionType) -> bool {
        matches!(
            function_type,
            FunctionType::ScalarVariable | FunctionType::ScalarAffine
        )
    }

    fn supports_variable_deletion(&self) -> bool {
        true
    }

    fn supports_constraint_deletion(&self) -> bool {
        true
    }

    fn supports_modification(&self, function_type: FunctionType, change: &FunctionChange) -> bool {
        function_type == FunctionType::ScalarAffine
            && matches!(
                change,
                FunctionChange::ScalarConstant(_) | FunctionChange::ScalarCoefficient { .. }
            )
    }

    fn add_variable(&mut self, variable: VariableRef) -> Result<(), SolverError> {
        self.variables.push(variable);
        Ok(())
    }

    fn delete_variable(&mut self, variable: VariableRef) -> Result<(), SolverError> {
        self.variables.retain(|candidate| *candidate != variable);
        self.constraints
            .retain(|_, (function, _)| *function != Function::ScalarVariable(variable));
        Ok(())
    }

    fn add_constraint(
        &mut self,
        constraint: ConstraintRef,
        function: &Function,
        set: &Set,
    ) -> Result<(), SolverError> {
        self.constraints
            .insert(constraint, (function.clone(), set.clone()));
        Ok(())
    }

    fn delete_constraint(&mut self, constraint: ConstraintRef) -> Result<(), SolverError> {
        self.constraints.remove(&constraint);
        Ok(())
    }

    fn set_constraint_set(&mut self, constraint: ConstraintRef, set: &Set) -> Result<(), SolverError> {
        match self.constraints.get_mut(&constraint) {
            Some((_, stored)) => {
                *stored = set.clone();
                Ok(())
            }
            None => Err(SolverError::BackendFailure(format!("unknown {}", constraint))),
        }
    }

    fn set_objective(
        &mut self,
        sense: OptimizationSense,
        function: &Function,
    ) -> Result<(), SolverError> {
        self.objective = Some((sense, function.clone()));
        Ok(())
    }

    fn modify_constraint(
        &mut self,
        constraint: ConstraintRef,
        change: &FunctionChange,
    ) -> Result<(), SolverError> {
        let (function, _) = self
            .constraints
            .get_mut(&constraint)
            .ok_or_else(|| SolverError::BackendFailure(format!("unknown {}", constraint)))?;
        function
            .apply_change(change)
            .map_err(|err| SolverError::BackendFailure(err.to_string()))
    }

    fn modify_objective(&mut self, change: &FunctionChange) -> Result<(), SolverError> {
        let (_, function) = self
            .objective
            .as_mut()
            .ok_or_else(|| SolverError::BackendFailure("no objective".into()))?;
        function
            .apply_change(change)
            .map_err(|err| SolverError::BackendFailure(err.to_string()))
    }

    fn optimize(&mut self, _request: &OptimizeRequest) -> Result<SolveResults, SolverError> {
        self.solves += 1;
        let grids = self
            .variables
            .iter()
            .map(|variable| self.candidates(*variable))
            .collect::<Result<Vec<_>, _>>()?;
        let size = grids
            .iter()
            .try_fold(1_usize, |acc, grid| acc.checked_mul(grid.len()))
            .filter(|size| *size <= GRID_LIMIT)
            .ok_or_else(|| SolverError::BackendFailure("search grid too large".into()))?;

        let maximize = matches!(self.objective, Some((OptimizationSense::Max, _)));
        let mut best: Option<(f64, BTreeMap<VariableRef, f64>)> = None;
        for mut code in 0..size {
            let mut point = BTreeMap::new();
            for (variable, grid) in self.variables.iter().zip(&grids) {
                point.insert(*variable, grid[code % grid.len()]);
                code /= grid.len();
            }
            if !self.feasible(&point) {
                continue;
            }
            let value = self.objective_of(&point);
            let better = best.as_ref().is_none_or(|(incumbent, _)| {
                if maximize {
                    value > *incumbent
                } else {
                    value < *incumbent
                }
            });
            if better {
                best = Some((value, point));
            }
        }

        Ok(match best {
            Some((value, point)) => SolveResults::new(TerminationStatusCode::Success, "enumerated")
                .with_result(
                    ResultVector::new(ResultStatusCode::FeasiblePoint, ResultStatusCode::NoSolution)
                        .with_objective_value(value)
                        .with_primal(point),
                ),
            None => SolveResults::new(TerminationStatusCode::InfeasibleNoResult, "no feasible point"),
        })
    }
}
