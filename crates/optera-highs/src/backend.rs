//! `HighsBackend`: a `Backend` over the HiGHS LP/MIP solver.
//!
//! The backend keeps its own [`NativeModel`] and builds a fresh HiGHS
//! problem from it on every `optimize()` call. Variables become columns in
//! creation order; `ScalarVariable` constraints fold into column bounds and
//! integrality; everything else becomes rows.

use crate::ffi::{HighsModel, HighsModelError, HighsOption, highs_version};
use crate::native::{NativeConstraint, NativeModel};
use crate::status;
use highs::HighsModelStatus;
use optera_expr::{
    ConstraintRef, ConstraintType, Function, FunctionChange, FunctionType, Set, SetType,
    VariableRef,
};
use optera_solver::{
    AttributeKind, AttributeValue, Backend, OptimizationSense, OptimizeRequest, ResultStatusCode,
    ResultVector, SolveResults, SolverConfig, SolverError, StaleHandle, TerminationStatusCode,
};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Tolerance used to decide whether a model without columns is feasible.
const EMPTY_MODEL_TOLERANCE: f64 = 1e-9;

/// Magnitude from which HiGHS reads a bound as infinite.
const HIGHS_INFINITY: f64 = 1e20;

impl From<HighsModelError> for SolverError {
    fn from(err: HighsModelError) -> Self {
        SolverError::BackendFailure(err.to_string())
    }
}

/// HiGHS as a `SolverInstance` backend.
#[derive(Debug, Default)]
pub struct HighsBackend {
    model: NativeModel,
}

impl HighsBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Column bounds after folding in every bound and integrality constraint.
#[derive(Debug, Clone, PartialEq)]
struct ColumnData {
    lower: f64,
    upper: f64,
    integer: bool,
    /// Bound constraint that set `lower`, first in handle order on ties.
    lower_source: Option<ConstraintRef>,
    upper_source: Option<ConstraintRef>,
}

impl Default for ColumnData {
    fn default() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            integer: false,
            lower_source: None,
            upper_source: None,
        }
    }
}

/// Where each handle landed in the HiGHS problem.
#[derive(Debug, Default)]
struct Layout {
    column_of: BTreeMap<VariableRef, usize>,
    columns: Vec<ColumnData>,
    rows_of: BTreeMap<ConstraintRef, Vec<usize>>,
}

/// What keeps a pair of bounds from going to HiGHS as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundIssue {
    /// NaN, or a lower bound at `+HIGHS_INFINITY` or an upper bound at
    /// `-HIGHS_INFINITY` and beyond. HiGHS refuses to load these.
    Unloadable,
    /// `lower > upper`.
    Crossing,
}

fn bound_issue(lower: f64, upper: f64) -> Option<BoundIssue> {
    if lower.is_nan() || upper.is_nan() || lower >= HIGHS_INFINITY || upper <= -HIGHS_INFINITY {
        Some(BoundIssue::Unloadable)
    } else if lower > upper {
        Some(BoundIssue::Crossing)
    } else {
        None
    }
}

fn column_index(model: &NativeModel) -> BTreeMap<VariableRef, usize> {
    model
        .columns
        .iter()
        .enumerate()
        .map(|(j, variable)| (*variable, j))
        .collect()
}

fn column_data(model: &NativeModel, column_of: &BTreeMap<VariableRef, usize>) -> Vec<ColumnData> {
    let mut columns = vec![ColumnData::default(); model.columns.len()];
    for (constraint, native) in &model.constraints {
        match native {
            NativeConstraint::Bound {
                variable,
                lower,
                upper,
            } => {
                let Some(column) = column_of.get(variable).and_then(|j| columns.get_mut(*j)) else {
                    continue;
                };
                if *lower > column.lower {
                    column.lower = *lower;
                    column.lower_source = Some(*constraint);
                }
                if *upper < column.upper {
                    column.upper = *upper;
                    column.upper_source = Some(*constraint);
                }
            }
            NativeConstraint::Integrality { variable, binary } => {
                let Some(column) = column_of.get(variable).and_then(|j| columns.get_mut(*j)) else {
                    continue;
                };
                column.integer = true;
                if *binary {
                    column.lower = column.lower.max(0.0);
                    column.upper = column.upper.min(1.0);
                }
            }
            NativeConstraint::Rows(_) => {}
        }
    }
    columns
}

/// Starting value for a column without a user start: zero if it fits,
/// else the bound closest to zero.
fn default_primal_value(lower: f64, upper: f64) -> f64 {
    if lower > 0.0 {
        lower
    } else if upper < 0.0 {
        upper
    } else {
        0.0
    }
}

/// Split a column's reduced cost between the bound constraints that set its
/// lower and upper bounds. Other constraints on the column get zero.
fn bound_dual(column: &ColumnData, constraint: ConstraintRef, reduced_cost: f64) -> f64 {
    let from_lower = if column.lower_source == Some(constraint) {
        reduced_cost.max(0.0)
    } else {
        0.0
    };
    let from_upper = if column.upper_source == Some(constraint) {
        reduced_cost.min(0.0)
    } else {
        0.0
    };
    from_lower + from_upper
}

/// Translate the config into HiGHS options on `model`.
fn apply_config(model: &mut HighsModel, config: &SolverConfig) -> Result<(), HighsModelError> {
    model.set_quiet(config.silent);
    if let Some(seconds) = config.time_limit {
        model.set_option("time_limit", HighsOption::Float(seconds))?;
    }
    if let Some(gap) = config.relative_gap {
        model.set_option("mip_rel_gap", HighsOption::Float(gap))?;
    }
    if let Some(threads) = config.threads {
        let threads = i32::try_from(threads).unwrap_or(i32::MAX);
        model.set_option("threads", HighsOption::Int(threads))?;
    }
    if let Some(presolve) = config.presolve {
        let value = if presolve { "on" } else { "off" };
        model.set_option("presolve", HighsOption::Str(value.to_string()))?;
    }
    if let Some(tolerance) = config.tolerance {
        model.set_option("primal_feasibility_tolerance", HighsOption::Float(tolerance))?;
        model.set_option("dual_feasibility_tolerance", HighsOption::Float(tolerance))?;
    }
    for (name, value) in &config.raw {
        model.set_option(name, raw_option(name, value)?)?;
    }
    Ok(())
}

fn raw_option(name: &str, value: &AttributeValue) -> Result<HighsOption, HighsModelError> {
    let invalid = || HighsModelError::InvalidOption {
        name: name.to_string(),
    };
    match value {
        AttributeValue::Bool(flag) => Ok(HighsOption::Bool(*flag)),
        AttributeValue::Int(int) => i32::try_from(*int).map(HighsOption::Int).map_err(|_| invalid()),
        AttributeValue::Float(float) => Ok(HighsOption::Float(*float)),
        AttributeValue::Text(text) => Ok(HighsOption::Str(text.clone())),
        _ => Err(invalid()),
    }
}

impl HighsBackend {
    fn build(&self, request: &OptimizeRequest) -> Result<(HighsModel, Layout), HighsModelError> {
        let mut highs = HighsModel::new();
        highs.set_maximize(self.model.sense == OptimizationSense::Max);

        let column_of = column_index(&self.model);
        let columns = column_data(&self.model, &column_of);
        for (variable, column) in self.model.columns.iter().zip(&columns) {
            let cost = self
                .model
                .objective
                .terms
                .get(variable)
                .copied()
                .unwrap_or(0.0);
            highs.add_column(column.lower, column.upper, cost, column.integer);
        }

        let mut rows_of = BTreeMap::new();
        for (constraint, native) in &self.model.constraints {
            let NativeConstraint::Rows(rows) = native else {
                continue;
            };
            let mut indices = Vec::with_capacity(rows.len());
            for row in rows {
                let factors: Vec<(usize, f64)> = row
                    .linear
                    .terms
                    .iter()
                    .filter_map(|(variable, coefficient)| {
                        column_of.get(variable).map(|j| (*j, *coefficient))
                    })
                    .collect();
                let (lower, upper) = row.shifted_bounds();
                indices.push(highs.add_row(lower, upper, &factors)?);
            }
            rows_of.insert(*constraint, indices);
        }

        apply_config(&mut highs, &request.config)?;

        if !request.variable_primal_start.is_empty() {
            let start = self
                .model
                .columns
                .iter()
                .zip(&columns)
                .map(|(variable, column)| {
                    request
                        .variable_primal_start
                        .get(variable)
                        .copied()
                        .unwrap_or_else(|| default_primal_value(column.lower, column.upper))
                })
                .collect();
            highs.set_primal_start(start)?;
        }

        debug!(
            component = "highs",
            operation = "build",
            status = "success",
            num_cols = highs.num_columns(),
            num_rows = highs.num_rows(),
            is_mip = highs.is_mip(),
            warm_start = !request.variable_primal_start.is_empty(),
            "Built HiGHS problem"
        );

        Ok((
            highs,
            Layout {
                column_of,
                columns,
                rows_of,
            },
        ))
    }

    /// Results for bounds that never reach HiGHS: `InvalidModel` when HiGHS
    /// would refuse a bound, `InfeasibleNoResult` when column or row bounds
    /// cross.
    fn screen_bounds(&self) -> Option<SolveResults> {
        let columns = column_data(&self.model, &column_index(&self.model));
        let column_issues = self
            .model
            .columns
            .iter()
            .zip(&columns)
            .filter_map(|(variable, column)| {
                bound_issue(column.lower, column.upper).map(|issue| (issue, variable.to_string()))
            });
        let row_issues = self
            .model
            .constraints
            .iter()
            .filter_map(|(constraint, native)| match native {
                NativeConstraint::Rows(rows) => rows
                    .iter()
                    .find_map(|row| {
                        let (lower, upper) = row.shifted_bounds();
                        bound_issue(lower, upper)
                    })
                    .map(|issue| (issue, constraint.to_string())),
                _ => None,
            });
        let issues: Vec<(BoundIssue, String)> = column_issues.chain(row_issues).collect();

        let (termination, message) =
            if let Some((_, at)) = issues.iter().find(|(issue, _)| *issue == BoundIssue::Unloadable) {
                (
                    TerminationStatusCode::InvalidModel,
                    format!("bounds of {} reach the HiGHS infinity {:e}", at, HIGHS_INFINITY),
                )
            } else {
                let (_, at) = issues.first()?;
                (
                    TerminationStatusCode::InfeasibleNoResult,
                    format!("bounds of {} cross", at),
                )
            };
        warn!(
            component = "highs",
            operation = "screen_bounds",
            status = "warn",
            termination = ?termination,
            detail = %message,
            "Answered without calling HiGHS"
        );
        Some(SolveResults::new(termination, message))
    }

    /// A model without columns: every row is a constant.
    fn solve_empty(&self) -> SolveResults {
        let feasible = self.model.constraints.values().all(|native| match native {
            NativeConstraint::Rows(rows) => rows.iter().all(|row| {
                let (lower, upper) = row.shifted_bounds();
                lower <= EMPTY_MODEL_TOLERANCE && -EMPTY_MODEL_TOLERANCE <= upper
            }),
            _ => true,
        });
        if !feasible {
            return SolveResults::new(TerminationStatusCode::InfeasibleNoResult, "empty model infeasible");
        }
        let constraint_primal = self.model.constraints.iter().filter_map(|(constraint, native)| {
            let NativeConstraint::Rows(rows) = native else {
                return None;
            };
            Some((*constraint, rows.iter().map(|row| row.linear.constant).collect::<Vec<f64>>()))
        });
        let mut result = ResultVector::new(ResultStatusCode::FeasiblePoint, ResultStatusCode::NoSolution)
            .with_objective_value(self.model.objective.constant);
        result.constraint_primal.extend(constraint_primal);
        SolveResults::new(TerminationStatusCode::Success, "empty model").with_result(result)
    }

    fn result_vector(
        &self,
        highs: &HighsModel,
        layout: &Layout,
        model_status: HighsModelStatus,
    ) -> Result<ResultVector, HighsModelError> {
        let optimal = model_status == HighsModelStatus::Optimal;
        let primal_status = if optimal {
            ResultStatusCode::FeasiblePoint
        } else {
            status::solution_status(highs.primal_solution_status())
        };
        let dual_status = if !optimal || highs.is_mip() {
            ResultStatusCode::NoSolution
        } else {
            match highs.dual_solution_status() {
                None => ResultStatusCode::FeasiblePoint,
                info => status::solution_status(info),
            }
        };
        let mut result = ResultVector::new(primal_status, dual_status);
        if !primal_status.has_values() {
            return Ok(result);
        }

        let solution = highs.solution_snapshot()?;
        let column_value = |j: usize| solution.col_values.get(j).copied().unwrap_or(0.0);
        result.objective_value = Some(highs.objective_value()? + self.model.objective.constant);
        result.variable_primal = layout
            .column_of
            .iter()
            .map(|(variable, j)| (*variable, column_value(*j)))
            .collect();

        let sign = if self.model.sense == OptimizationSense::Max {
            -1.0
        } else {
            1.0
        };
        let with_duals = result.has_dual();
        for (constraint, native) in &self.model.constraints {
            match native {
                NativeConstraint::Rows(rows) => {
                    let Some(indices) = layout.rows_of.get(constraint) else {
                        continue;
                    };
                    let values = indices
                        .iter()
                        .zip(rows)
                        .map(|(i, row)| {
                            solution.row_values.get(*i).copied().unwrap_or(0.0) + row.linear.constant
                        })
                        .collect();
                    result.constraint_primal.insert(*constraint, values);
                    if with_duals {
                        let duals = indices
                            .iter()
                            .map(|i| sign * solution.row_duals.get(*i).copied().unwrap_or(0.0))
                            .collect();
                        result.constraint_dual.insert(*constraint, duals);
                    }
                }
                NativeConstraint::Bound { variable, .. } => {
                    let Some(j) = layout.column_of.get(variable) else {
                        continue;
                    };
                    result
                        .constraint_primal
                        .insert(*constraint, vec![column_value(*j)]);
                    if with_duals {
                        let reduced_cost = sign * solution.col_duals.get(*j).copied().unwrap_or(0.0);
                        let dual = bound_dual(&layout.columns[*j], *constraint, reduced_cost);
                        result.constraint_dual.insert(*constraint, vec![dual]);
                    }
                }
                NativeConstraint::Integrality { variable, .. } => {
                    if let Some(j) = layout.column_of.get(variable) {
                        result
                            .constraint_primal
                            .insert(*constraint, vec![column_value(*j)]);
                    }
                }
            }
        }
        Ok(result)
    }

    fn native_mut(&mut self, constraint: ConstraintRef) -> Result<&mut NativeConstraint, SolverError> {
        self.model
            .constraints
            .get_mut(&constraint)
            .ok_or(SolverError::StaleReference(StaleHandle::Constraint(constraint)))
    }
}

impl Backend for HighsBackend {
    fn solver_name(&self) -> &str {
        "HiGHS"
    }

    fn supports_constraint(&self, constraint_type: ConstraintType) -> bool {
        let interval = matches!(
            constraint_type.set,
            SetType::LessThan | SetType::GreaterThan | SetType::EqualTo | SetType::Interval
        );
        match constraint_type.function {
            FunctionType::ScalarVariable => {
                interval || matches!(constraint_type.set, SetType::ZeroOne | SetType::Integer)
            }
            FunctionType::ScalarAffine => interval,
            FunctionType::VectorOfVariables | FunctionType::VectorAffine => matches!(
                constraint_type.set,
                SetType::Nonnegatives | SetType::Nonpositives | SetType::Zeros
            ),
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
        match function_type {
            FunctionType::ScalarAffine => matches!(
                change,
                FunctionChange::ScalarConstant(_) | FunctionChange::ScalarCoefficient { .. }
            ),
            FunctionType::VectorAffine => matches!(
                change,
                FunctionChange::VectorConstants(_) | FunctionChange::MultirowCoefficient { .. }
            ),
            _ => false,
        }
    }

    fn supports_parameter(&self, kind: &AttributeKind) -> bool {
        matches!(
            kind,
            AttributeKind::Silent
                | AttributeKind::TimeLimitSec
                | AttributeKind::NumberOfThreads
                | AttributeKind::RelativeGapTolerance
                | AttributeKind::RawParameter(_)
        )
    }

    fn add_variable(&mut self, variable: VariableRef) -> Result<(), SolverError> {
        self.model.columns.push(variable);
        Ok(())
    }

    fn delete_variable(&mut self, variable: VariableRef) -> Result<(), SolverError> {
        if !self.model.columns.contains(&variable) {
            return Err(SolverError::StaleReference(StaleHandle::Variable(variable)));
        }
        self.model.remove_column(variable);
        Ok(())
    }

    fn add_constraint(
        &mut self,
        constraint: ConstraintRef,
        function: &Function,
        set: &Set,
    ) -> Result<(), SolverError> {
        let native = NativeConstraint::from_pair(function, set)
            .ok_or(SolverError::UnsupportedConstraint(constraint.constraint_type()))?;
        self.model.constraints.insert(constraint, native);
        Ok(())
    }

    fn delete_constraint(&mut self, constraint: ConstraintRef) -> Result<(), SolverError> {
        self.model
            .constraints
            .remove(&constraint)
            .map(|_| ())
            .ok_or(SolverError::StaleReference(StaleHandle::Constraint(constraint)))
    }

    fn set_constraint_set(&mut self, constraint: ConstraintRef, set: &Set) -> Result<(), SolverError> {
        self.native_mut(constraint)?.replace_set(set);
        Ok(())
    }

    fn set_objective(
        &mut self,
        sense: OptimizationSense,
        function: &Function,
    ) -> Result<(), SolverError> {
        self.model.set_objective(sense, function)
    }

    fn modify_constraint(
        &mut self,
        constraint: ConstraintRef,
        change: &FunctionChange,
    ) -> Result<(), SolverError> {
        self.native_mut(constraint)?.apply_change(change)
    }

    fn modify_objective(&mut self, change: &FunctionChange) -> Result<(), SolverError> {
        match change {
            FunctionChange::ScalarConstant(constant) => self.model.objective.constant = *constant,
            FunctionChange::ScalarCoefficient {
                variable,
                coefficient,
            } => self.model.objective.set_coefficient(*variable, *coefficient),
            _ => return Err(SolverError::UnsupportedModification(change.name().to_string())),
        }
        Ok(())
    }

    fn optimize(&mut self, request: &OptimizeRequest) -> Result<SolveResults, SolverError> {
        let started = Instant::now();
        let version = highs_version().unwrap_or_else(|| "unknown".to_string());
        debug!(
            component = "highs",
            operation = "optimize",
            status = "start",
            solver_version = %version,
            num_cols = self.model.columns.len(),
            num_constraints = self.model.constraints.len(),
            "Starting solve process"
        );

        if self.model.columns.is_empty() {
            return Ok(self.solve_empty());
        }
        if let Some(results) = self.screen_bounds() {
            return Ok(results);
        }

        let (mut highs, layout) = match self.build(request) {
            Ok(built) => built,
            Err(err @ HighsModelError::InvalidOption { .. }) => {
                warn!(
                    component = "highs",
                    operation = "optimize",
                    status = "warn",
                    error = %err,
                    "Rejected solver option"
                );
                return Ok(SolveResults::new(TerminationStatusCode::InvalidOption, err.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let model_status = match highs.solve() {
            Ok(model_status) => model_status,
            Err(HighsModelError::SolveFailed { status }) => {
                warn!(
                    component = "highs",
                    operation = "optimize",
                    status = "warn",
                    highs_status = %status,
                    "HiGHS run returned an error status"
                );
                return Ok(SolveResults::new(TerminationStatusCode::OtherError, status));
            }
            Err(err @ HighsModelError::InvalidProblem { .. }) => {
                return Ok(SolveResults::new(TerminationStatusCode::InvalidModel, err.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let termination = status::termination_status(model_status);
        let mut results = SolveResults::new(termination, status::raw_status(model_status));
        let reports_point = termination == TerminationStatusCode::Success || termination.is_limit();
        if reports_point {
            let result = self.result_vector(&highs, &layout, model_status)?;
            if result.has_primal() {
                results.results.push(result);
            }
        }
        if highs.is_mip() {
            results.objective_bound = highs
                .mip_dual_bound()
                .map(|bound| bound + self.model.objective.constant);
            results.relative_gap = highs.mip_gap();
            results.node_count = highs.mip_node_count();
        }
        results.simplex_iterations = highs.simplex_iteration_count();
        results.barrier_iterations = highs.barrier_iteration_count();
        results.solve_time_seconds = started.elapsed().as_secs_f64();
        results
            .extra
            .insert("solver_version".to_string(), AttributeValue::Text(version));

        debug!(
            component = "highs",
            operation = "optimize",
            status = "success",
            termination = ?termination,
            result_count = results.result_count(),
            simplex_iterations = results.simplex_iterations,
            duration_ms = started.elapsed().as_millis() as u64,
            "Solve completed"
        );
        Ok(results)
    }
}
