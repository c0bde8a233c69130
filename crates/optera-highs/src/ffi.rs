//! Safe wrapper around the `highs` crate plus the few C API calls it does
//! not expose.
//!
//! Every `unsafe` block in the crate lives here.
#![allow(unsafe_code)]

use highs::{Col, HighsModelStatus, RowProblem, Sense, SolvedModel};
use highs_sys::HighsInt;
use std::ffi::{CStr, CString};
use std::fmt;
use tracing::{debug, trace, warn};

/// Failures of the HiGHS wrapper itself, before or after a solve.
#[derive(Debug, Clone, PartialEq)]
pub enum HighsModelError {
    ColumnIndexOutOfBounds {
        column_index: usize,
        num_columns: usize,
    },
    PrimalStartLengthMismatch {
        expected: usize,
        got: usize,
    },
    /// HiGHS rejected an option name or value.
    InvalidOption {
        name: String,
    },
    SolveRequired {
        operation: &'static str,
    },
    /// HiGHS refused to load the problem, e.g. for a bound beyond its
    /// infinity threshold.
    InvalidProblem {
        status: String,
    },
    /// `Highs_run` returned an error status.
    SolveFailed {
        status: String,
    },
}

impl HighsModelError {
    /// Stable code, also printed as the message prefix.
    pub fn code(&self) -> &'static str {
        match self {
            HighsModelError::ColumnIndexOutOfBounds { .. } => "HIGHS_COLUMN_OUT_OF_BOUNDS",
            HighsModelError::PrimalStartLengthMismatch { .. } => "HIGHS_PRIMAL_START_LENGTH",
            HighsModelError::InvalidOption { .. } => "HIGHS_INVALID_OPTION",
            HighsModelError::SolveRequired { .. } => "HIGHS_SOLVE_REQUIRED",
            HighsModelError::InvalidProblem { .. } => "HIGHS_INVALID_PROBLEM",
            HighsModelError::SolveFailed { .. } => "HIGHS_SOLVE_FAILED",
        }
    }
}

impl fmt::Display for HighsModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code())?;
        match self {
            HighsModelError::ColumnIndexOutOfBounds {
                column_index,
                num_columns,
            } => write!(
                f,
                "row references column {} but the model has {} columns",
                column_index, num_columns
            ),
            HighsModelError::PrimalStartLengthMismatch { expected, got } => write!(
                f,
                "primal start has {1} values for {0} columns",
                expected, got
            ),
            HighsModelError::InvalidOption { name } => {
                write!(f, "HiGHS rejected option '{}'", name)
            }
            HighsModelError::SolveRequired { operation } => {
                write!(f, "{} needs a solved model", operation)
            }
            HighsModelError::InvalidProblem { status } => {
                write!(f, "HiGHS refused the problem: {}", status)
            }
            HighsModelError::SolveFailed { status } => {
                write!(f, "HiGHS failed to run: {}", status)
            }
        }
    }
}

impl std::error::Error for HighsModelError {}

/// A typed HiGHS option value.
#[derive(Debug, Clone, PartialEq)]
pub enum HighsOption {
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(String),
}

/// Primal and dual values of the latest solve, in column and row order.
#[derive(Debug, Clone, Default)]
pub struct SolutionSnapshot {
    pub col_values: Vec<f64>,
    /// Reduced costs.
    pub col_duals: Vec<f64>,
    /// Row activities, without any constant term.
    pub row_values: Vec<f64>,
    pub row_duals: Vec<f64>,
}

/// One HiGHS problem, built row-wise and solved once.
pub struct HighsModel {
    problem: RowProblem,
    columns: Vec<Col>,
    integer_columns: usize,
    maximize: bool,
    quiet: bool,
    options: Vec<(String, HighsOption)>,
    primal_start: Option<Vec<f64>>,
    solved: Option<SolvedModel>,
}

impl HighsModel {
    pub fn new() -> Self {
        HighsModel {
            problem: RowProblem::default(),
            columns: Vec::new(),
            integer_columns: 0,
            maximize: false,
            quiet: true,
            options: Vec::new(),
            primal_start: None,
            solved: None,
        }
    }

    /// Add a column and return its index.
    pub fn add_column(&mut self, lower: f64, upper: f64, cost: f64, integer: bool) -> usize {
        trace!(
            lower,
            upper,
            cost,
            integer,
            component = "highs",
            operation = "add_column",
            status = "success",
            "Adding column"
        );
        let col = if integer {
            self.integer_columns += 1;
            self.problem.add_integer_column(cost, lower..=upper)
        } else {
            self.problem.add_column(cost, lower..=upper)
        };
        self.columns.push(col);
        self.columns.len() - 1
    }

    /// Add a row `lower <= Σ coefficient·column <= upper` and return its index.
    ///
    /// # Errors
    ///
    /// Returns an error if any column index is out of bounds.
    pub fn add_row(
        &mut self,
        lower: f64,
        upper: f64,
        factors: &[(usize, f64)],
    ) -> Result<usize, HighsModelError> {
        let num_columns = self.columns.len();
        let mut row = Vec::with_capacity(factors.len());
        for (column_index, coefficient) in factors.iter().copied() {
            let col = *self.columns.get(column_index).ok_or_else(|| {
                warn!(
                    component = "highs",
                    operation = "add_row",
                    status = "error",
                    column_index,
                    num_columns,
                    "Column index out of bounds for row"
                );
                HighsModelError::ColumnIndexOutOfBounds {
                    column_index,
                    num_columns,
                }
            })?;
            row.push((col, coefficient));
        }
        self.problem.add_row(lower..=upper, row);
        Ok(self.problem.num_rows().saturating_sub(1))
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.problem.num_rows()
    }

    pub fn is_mip(&self) -> bool {
        self.integer_columns > 0
    }

    pub fn set_maximize(&mut self, maximize: bool) {
        self.maximize = maximize;
    }

    /// Keep HiGHS output off (the default) or let it print.
    pub fn set_quiet(&mut self, quiet: bool) {
        self.quiet = quiet;
    }

    /// Queue an option for the next solve.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOption` when HiGHS does not know the name or refuses
    /// the value.
    pub fn set_option(
        &mut self,
        name: impl Into<String>,
        value: HighsOption,
    ) -> Result<(), HighsModelError> {
        let name = name.into();
        if !option_accepted(&name, &value) {
            warn!(
                component = "highs",
                operation = "set_option",
                status = "error",
                option = %name,
                value = ?value,
                "HiGHS rejected option"
            );
            return Err(HighsModelError::InvalidOption { name });
        }
        self.options.push((name, value));
        Ok(())
    }

    /// Set primal start values, one per column.
    ///
    /// # Errors
    ///
    /// Returns an error if the length does not match the number of columns.
    pub fn set_primal_start(&mut self, cols: Vec<f64>) -> Result<(), HighsModelError> {
        if cols.len() != self.columns.len() {
            return Err(HighsModelError::PrimalStartLengthMismatch {
                expected: self.columns.len(),
                got: cols.len(),
            });
        }
        self.primal_start = Some(cols);
        Ok(())
    }

    /// Run HiGHS on the built problem.
    ///
    /// # Errors
    ///
    /// Returns `InvalidProblem` when HiGHS will not load the columns and
    /// rows, `SolveFailed` when the run reports an error status rather than
    /// a model status.
    pub fn solve(&mut self) -> Result<HighsModelStatus, HighsModelError> {
        debug!(
            num_cols = self.columns.len(),
            num_rows = self.problem.num_rows(),
            integer_columns = self.integer_columns,
            component = "highs",
            operation = "solve",
            status = "success",
            "Solving model"
        );

        let sense = if self.maximize {
            Sense::Maximise
        } else {
            Sense::Minimise
        };
        let problem = std::mem::take(&mut self.problem);
        let mut model = problem.try_optimise(sense).map_err(|status| {
            warn!(
                component = "highs",
                operation = "solve",
                status = "error",
                highs_status = ?status,
                "HiGHS refused the problem"
            );
            HighsModelError::InvalidProblem {
                status: format!("{:?}", status),
            }
        })?;
        if self.quiet {
            model.make_quiet();
        }
        for (option, value) in self.options.drain(..) {
            match value {
                HighsOption::Bool(val) => model.set_option(option.as_str(), val),
                HighsOption::Int(val) => model.set_option(option.as_str(), val),
                HighsOption::Float(val) => model.set_option(option.as_str(), val),
                HighsOption::Str(val) => model.set_option(option.as_str(), val.as_str()),
            }
        }
        if let Some(cols) = self.primal_start.take() {
            if let Err(err) = model.try_set_solution(Some(&cols), None, None, None) {
                warn!(
                    component = "highs",
                    operation = "set_primal_start",
                    status = "warn",
                    ?err,
                    "Failed to set warm-start solution; continuing without hints"
                );
            }
        }

        let solved = model.try_solve().map_err(|status| HighsModelError::SolveFailed {
            status: format!("{:?}", status),
        })?;
        let status = solved.status();
        trace!(
            component = "highs",
            operation = "solve",
            status = "success",
            model_status = ?status,
            "Model status received"
        );
        self.solved = Some(solved);
        self.columns.clear();
        Ok(status)
    }

    fn solved(&self, operation: &'static str) -> Result<&SolvedModel, HighsModelError> {
        self.solved
            .as_ref()
            .ok_or(HighsModelError::SolveRequired { operation })
    }

    /// Objective value of the latest solve, without any constant offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been solved yet.
    pub fn objective_value(&self) -> Result<f64, HighsModelError> {
        Ok(self.solved("objective_value")?.objective_value())
    }

    /// Relative MIP gap, when HiGHS reports a finite one.
    pub fn mip_gap(&self) -> Option<f64> {
        self.solved
            .as_ref()
            .map(SolvedModel::mip_gap)
            .filter(|gap| gap.is_finite())
    }

    /// Best bound of a MIP solve.
    pub fn mip_dual_bound(&self) -> Option<f64> {
        self.double_info("mip_dual_bound").filter(|bound| bound.is_finite())
    }

    pub fn simplex_iteration_count(&self) -> Option<usize> {
        self.int_info("simplex_iteration_count")
    }

    pub fn barrier_iteration_count(&self) -> Option<usize> {
        self.int_info("ipm_iteration_count")
    }

    pub fn mip_node_count(&self) -> Option<usize> {
        self.int64_info("mip_node_count")
    }

    /// `primal_solution_status` info: 0 none, 1 infeasible, 2 feasible.
    pub fn primal_solution_status(&self) -> Option<usize> {
        self.int_info("primal_solution_status")
    }

    /// `dual_solution_status` info: 0 none, 1 infeasible, 2 feasible.
    pub fn dual_solution_status(&self) -> Option<usize> {
        self.int_info("dual_solution_status")
    }

    fn int_info(&self, name: &str) -> Option<usize> {
        let solved = self.solved.as_ref()?;
        let c_name = CString::new(name).ok()?;
        let mut value: HighsInt = 0;
        let status = unsafe {
            highs_sys::Highs_getIntInfoValue(solved.as_ptr(), c_name.as_ptr(), &raw mut value)
        };
        if status != highs_sys::STATUS_OK {
            debug!(
                component = "highs",
                operation = "solve_info",
                info = name,
                status_code = status,
                "Info value not available"
            );
            return None;
        }
        usize::try_from(value).ok()
    }

    fn int64_info(&self, name: &str) -> Option<usize> {
        let solved = self.solved.as_ref()?;
        let c_name = CString::new(name).ok()?;
        let mut value: i64 = 0;
        let status = unsafe {
            highs_sys::Highs_getInt64InfoValue(solved.as_ptr(), c_name.as_ptr(), &raw mut value)
        };
        if status == highs_sys::STATUS_OK {
            usize::try_from(value).ok()
        } else {
            None
        }
    }

    fn double_info(&self, name: &str) -> Option<f64> {
        let solved = self.solved.as_ref()?;
        let c_name = CString::new(name).ok()?;
        let mut value: f64 = 0.0;
        let status = unsafe {
            highs_sys::Highs_getDoubleInfoValue(solved.as_ptr(), c_name.as_ptr(), &raw mut value)
        };
        (status == highs_sys::STATUS_OK).then_some(value)
    }

    /// Primal and dual values of the latest solve.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been solved yet.
    pub fn solution_snapshot(&self) -> Result<SolutionSnapshot, HighsModelError> {
        let solution = self.solved("solution_snapshot")?.get_solution();
        Ok(SolutionSnapshot {
            col_values: solution.columns().to_vec(),
            col_duals: solution.dual_columns().to_vec(),
            row_values: solution.rows().to_vec(),
            row_duals: solution.dual_rows().to_vec(),
        })
    }
}

impl Default for HighsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HighsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let objective_value = self.solved.as_ref().map(SolvedModel::objective_value);
        f.debug_struct("HighsModel")
            .field("num_columns", &self.columns.len())
            .field("num_rows", &self.problem.num_rows())
            .field("integer_columns", &self.integer_columns)
            .field("objective_value", &objective_value)
            .finish_non_exhaustive()
    }
}

/// Try the option on a scratch HiGHS instance so that a bad name or value
/// is reported instead of aborting the real solve.
fn option_accepted(name: &str, value: &HighsOption) -> bool {
    let Ok(c_name) = CString::new(name) else {
        return false;
    };
    let text = match value {
        HighsOption::Str(text) => match CString::new(text.as_str()) {
            Ok(text) => Some(text),
            Err(_) => return false,
        },
        _ => None,
    };
    unsafe {
        let highs = highs_sys::Highs_create();
        if highs.is_null() {
            return false;
        }
        let status = match (value, text) {
            (HighsOption::Bool(flag), _) => {
                highs_sys::Highs_setBoolOptionValue(highs, c_name.as_ptr(), HighsInt::from(*flag))
            }
            (HighsOption::Int(int), _) => {
                highs_sys::Highs_setIntOptionValue(highs, c_name.as_ptr(), HighsInt::from(*int))
            }
            (HighsOption::Float(float), _) => {
                highs_sys::Highs_setDoubleOptionValue(highs, c_name.as_ptr(), *float)
            }
            (HighsOption::Str(_), text) => match text {
                Some(text) => {
                    highs_sys::Highs_setStringOptionValue(highs, c_name.as_ptr(), text.as_ptr())
                }
                None => {
                    highs_sys::Highs_destroy(highs);
                    return false;
                }
            },
        };
        highs_sys::Highs_destroy(highs);
        status == highs_sys::STATUS_OK
    }
}

/// Version of the linked HiGHS library.
pub fn highs_version() -> Option<String> {
    unsafe {
        let ptr = highs_sys::Highs_version();
        if ptr.is_null() {
            None
        } else {
            CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
        }
    }
}
