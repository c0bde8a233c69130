//! The attribute protocol.
//!
//! Reads and writes are checked against the kind tables in `optera_solver`
//! (scope, access, value type, availability) before any store is touched.
//! Result kinds are answered from the stored `SolveResults`, optimizer
//! parameters from the instance's `SolverConfig`.

use crate::instance::SolverInstance;
use optera_expr::{ConstraintRef, VariableRef};
use optera_solver::{
    AttributeAccess, AttributeKind, AttributeTarget, AttributeValue, Availability, Backend,
    Conclusion, OptimizeRequest, ResultIndex, ResultStatusCode, ResultVector, SolverConfig,
    SolverError, TerminationStatusCode, ValueType,
};
use std::collections::BTreeMap;

/// Values written through `set_attribute` that are not part of the model.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeStore {
    pub config: SolverConfig,
    pub name: String,
    pub variable_names: BTreeMap<VariableRef, String>,
    pub constraint_names: BTreeMap<ConstraintRef, String>,
    pub variable_primal_start: BTreeMap<VariableRef, f64>,
    pub constraint_primal_start: BTreeMap<ConstraintRef, Vec<f64>>,
    pub constraint_dual_start: BTreeMap<ConstraintRef, Vec<f64>>,
}

impl AttributeStore {
    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn forget_variable(&mut self, variable: VariableRef) {
        self.variable_names.remove(&variable);
        self.variable_primal_start.remove(&variable);
    }

    pub fn forget_constraint(&mut self, constraint: ConstraintRef) {
        self.constraint_names.remove(&constraint);
        self.constraint_primal_start.remove(&constraint);
        self.constraint_dual_start.remove(&constraint);
    }

    pub fn request(&self) -> OptimizeRequest {
        OptimizeRequest {
            config: self.config.clone(),
            variable_primal_start: self.variable_primal_start.clone(),
            constraint_primal_start: self.constraint_primal_start.clone(),
            constraint_dual_start: self.constraint_dual_start.clone(),
        }
    }
}

fn check_scope(kind: &AttributeKind, target: AttributeTarget) -> Result<(), SolverError> {
    if kind.scope() == target.scope() {
        Ok(())
    } else {
        Err(SolverError::AttributeScopeMismatch {
            kind: kind.clone(),
            expected: kind.scope(),
            target,
        })
    }
}

fn invalid(kind: &AttributeKind, reason: impl Into<String>) -> SolverError {
    SolverError::InvalidAttributeValue {
        kind: kind.clone(),
        reason: reason.into(),
    }
}

/// Check the value against the kind's type, widening integers for float kinds.
fn coerce(kind: &AttributeKind, value: AttributeValue) -> Result<AttributeValue, SolverError> {
    if value.is_null() {
        return if kind.accepts_null() {
            Ok(value)
        } else {
            Err(invalid(kind, "value cannot be reset to null"))
        };
    }
    let expected = kind.value_type();
    match value {
        AttributeValue::Int(int) if expected == ValueType::Float => {
            Ok(AttributeValue::Float(int as f64))
        }
        value if value.matches(expected) => Ok(value),
        value => Err(invalid(
            kind,
            format!("expected {:?}, got {:?}", expected, value),
        )),
    }
}

fn nonnegative(kind: &AttributeKind, value: f64) -> Result<f64, SolverError> {
    if value.is_nan() || value < 0.0 {
        Err(invalid(kind, format!("{} must be nonnegative", value)))
    } else {
        Ok(value)
    }
}

fn finite_vector(kind: &AttributeKind, values: Vec<f64>, length: usize) -> Result<Vec<f64>, SolverError> {
    if values.len() != length {
        return Err(invalid(
            kind,
            format!("expected {} values, got {}", length, values.len()),
        ));
    }
    if let Some(value) = values.iter().find(|value| !value.is_finite()) {
        return Err(invalid(kind, format!("non-finite entry {}", value)));
    }
    Ok(values)
}

impl<B: Backend> SolverInstance<B> {
    fn resolve_target(&self, target: AttributeTarget) -> Result<(), SolverError> {
        match target {
            AttributeTarget::Model => Ok(()),
            AttributeTarget::Variable(variable) => self.ensure_variable(variable),
            AttributeTarget::Constraint(constraint) => self.ensure_constraint(constraint).map(|_| ()),
        }
    }

    /// Result vector `index` of the last solve.
    fn result_vector(
        &self,
        kind: &AttributeKind,
        index: ResultIndex,
    ) -> Result<&ResultVector, SolverError> {
        let results = self
            .results()
            .ok_or_else(|| SolverError::AttributeNotAvailable(kind.clone()))?;
        results
            .result(index)
            .ok_or(SolverError::ResultIndexOutOfBounds {
                requested: index.get(),
                count: results.result_count(),
            })
    }

    fn primal_vector(
        &self,
        kind: &AttributeKind,
        index: ResultIndex,
    ) -> Result<&ResultVector, SolverError> {
        let result = self.result_vector(kind, index)?;
        if result.has_primal() {
            Ok(result)
        } else {
            Err(SolverError::AttributeNotAvailable(kind.clone()))
        }
    }

    /// `OptimizeNotCalled` until `optimize()` succeeds, and again after any
    /// change to the model.
    pub fn termination_status(&self) -> TerminationStatusCode {
        self.results()
            .map_or(TerminationStatusCode::OptimizeNotCalled, |results| {
                results.termination_status
            })
    }

    pub fn raw_status_string(&self) -> Option<&str> {
        self.results().map(|results| results.raw_status.as_str())
    }

    pub fn result_count(&self) -> usize {
        self.results().map_or(0, |results| results.result_count())
    }

    /// `NoSolution` past `result_count()`.
    pub fn primal_status(&self, index: ResultIndex) -> ResultStatusCode {
        self.results()
            .map_or(ResultStatusCode::NoSolution, |results| {
                results.primal_status(index)
            })
    }

    /// `NoSolution` past `result_count()`.
    pub fn dual_status(&self, index: ResultIndex) -> ResultStatusCode {
        self.results()
            .map_or(ResultStatusCode::NoSolution, |results| results.dual_status(index))
    }

    pub fn conclusion(&self, index: ResultIndex) -> Conclusion {
        Conclusion::classify(
            self.termination_status(),
            self.primal_status(index),
            self.dual_status(index),
        )
    }

    /// Objective value of result `index`, evaluated from the primal values
    /// when the backend did not report it.
    pub fn objective_value(&self, index: ResultIndex) -> Result<f64, SolverError> {
        let kind = AttributeKind::ObjectiveValue(index);
        let result = self.primal_vector(&kind, index)?;
        if let Some(value) = result.objective_value {
            return Ok(value);
        }
        self.objective_function()?
            .evaluate(&|variable| result.variable_primal.get(&variable).copied())
            .and_then(|values| values.first().copied())
            .ok_or(SolverError::AttributeNotAvailable(kind))
    }

    pub fn variable_primal(
        &self,
        variable: VariableRef,
        index: ResultIndex,
    ) -> Result<f64, SolverError> {
        self.ensure_variable(variable)?;
        let kind = AttributeKind::VariablePrimal(index);
        let result = self.primal_vector(&kind, index)?;
        result
            .variable_primal
            .get(&variable)
            .copied()
            .ok_or(SolverError::AttributeNotAvailable(kind))
    }

    /// Constraint function value of result `index`, evaluated from the
    /// primal values when the backend did not report it.
    pub fn constraint_primal(
        &self,
        constraint: ConstraintRef,
        index: ResultIndex,
    ) -> Result<Vec<f64>, SolverError> {
        let entry = self.ensure_constraint(constraint)?;
        let kind = AttributeKind::ConstraintPrimal(index);
        let result = self.primal_vector(&kind, index)?;
        if let Some(values) = result.constraint_primal.get(&constraint) {
            return Ok(values.clone());
        }
        entry
            .function
            .evaluate(&|variable| result.variable_primal.get(&variable).copied())
            .ok_or(SolverError::AttributeNotAvailable(kind))
    }

    pub fn constraint_dual(
        &self,
        constraint: ConstraintRef,
        index: ResultIndex,
    ) -> Result<Vec<f64>, SolverError> {
        self.ensure_constraint(constraint)?;
        let kind = AttributeKind::ConstraintDual(index);
        let result = self.result_vector(&kind, index)?;
        if !result.has_dual() {
            return Err(SolverError::AttributeNotAvailable(kind));
        }
        result
            .constraint_dual
            .get(&constraint)
            .cloned()
            .ok_or(SolverError::AttributeNotAvailable(kind))
    }

    pub fn variable_name(&self, variable: VariableRef) -> Option<&str> {
        self.attributes.variable_names.get(&variable).map(String::as_str)
    }

    pub fn constraint_name(&self, constraint: ConstraintRef) -> Option<&str> {
        self.attributes
            .constraint_names
            .get(&constraint)
            .map(String::as_str)
    }

    /// First live variable carrying `name`, in creation order.
    pub fn variable_by_name(&self, name: &str) -> Option<VariableRef> {
        self.list_of_variables()
            .into_iter()
            .find(|variable| self.variable_name(*variable) == Some(name))
    }

    /// First live constraint carrying `name`, in creation order.
    pub fn constraint_by_name(&self, name: &str) -> Option<ConstraintRef> {
        self.constraints
            .iter(self.id)
            .map(|(constraint, _)| constraint)
            .find(|constraint| self.constraint_name(*constraint) == Some(name))
    }

    /// Read an attribute.
    ///
    /// # Errors
    ///
    /// `AttributeScopeMismatch` when the target does not fit the kind,
    /// `StaleReference` for a dead target, `AttributeNotAvailable` when the
    /// value does not exist in the current state, `ResultIndexOutOfBounds`
    /// for a result index past `ResultCount`.
    pub fn get_attribute(
        &self,
        kind: &AttributeKind,
        target: impl Into<AttributeTarget>,
    ) -> Result<AttributeValue, SolverError> {
        let target = target.into();
        check_scope(kind, target)?;
        self.resolve_target(target)?;
        let not_available = || SolverError::AttributeNotAvailable(kind.clone());
        if kind.availability() == Availability::AfterSolve && self.results().is_none() {
            return Err(not_available());
        }
        let config = &self.attributes.config;

        let value = match (kind, target) {
            (AttributeKind::TerminationStatus, _) => {
                AttributeValue::TerminationStatus(self.termination_status())
            }
            (AttributeKind::RawStatusString, _) => {
                AttributeValue::Text(self.raw_status_string().ok_or_else(not_available)?.into())
            }
            (AttributeKind::ResultCount, _) => AttributeValue::Count(self.result_count()),
            (AttributeKind::PrimalStatus(index), _) => {
                AttributeValue::ResultStatus(self.primal_status(*index))
            }
            (AttributeKind::DualStatus(index), _) => {
                AttributeValue::ResultStatus(self.dual_status(*index))
            }
            (AttributeKind::ObjectiveValue(index), _) => {
                AttributeValue::Float(self.objective_value(*index)?)
            }
            (AttributeKind::DualObjectiveValue(index), _) => AttributeValue::Float(
                self.result_vector(kind, *index)?
                    .dual_objective_value
                    .ok_or_else(not_available)?,
            ),
            (AttributeKind::ObjectiveBound, _) => AttributeValue::Float(
                self.results()
                    .and_then(|results| results.objective_bound)
                    .ok_or_else(not_available)?,
            ),
            (AttributeKind::RelativeGap, _) => AttributeValue::Float(
                self.results()
                    .and_then(|results| results.relative_gap)
                    .ok_or_else(not_available)?,
            ),
            (AttributeKind::SolveTimeSec, _) => AttributeValue::Float(
                self.results()
                    .map(|results| results.solve_time_seconds)
                    .ok_or_else(not_available)?,
            ),
            (AttributeKind::SimplexIterations, _) => AttributeValue::Count(
                self.results()
                    .and_then(|results| results.simplex_iterations)
                    .ok_or_else(not_available)?,
            ),
            (AttributeKind::BarrierIterations, _) => AttributeValue::Count(
                self.results()
                    .and_then(|results| results.barrier_iterations)
                    .ok_or_else(not_available)?,
            ),
            (AttributeKind::NodeCount, _) => AttributeValue::Count(
                self.results()
                    .and_then(|results| results.node_count)
                    .ok_or_else(not_available)?,
            ),
            (AttributeKind::RawResult(name), _) => self
                .results()
                .and_then(|results| results.extra.get(name))
                .cloned()
                .ok_or_else(not_available)?,
            (AttributeKind::ObjectiveSense, _) => AttributeValue::Sense(self.objective.sense),
            (AttributeKind::ObjectiveFunctionType, _) => {
                AttributeValue::FunctionType(self.objective.function.function_type())
            }
            (AttributeKind::NumberOfVariables, _) => {
                AttributeValue::Count(self.number_of_variables())
            }
            (AttributeKind::ListOfConstraintTypesPresent, _) => {
                AttributeValue::ConstraintTypes(self.list_of_constraint_types_present())
            }
            (AttributeKind::Name, _) => AttributeValue::Text(self.attributes.name.clone()),
            (AttributeKind::SolverName, _) => {
                AttributeValue::Text(self.backend.solver_name().to_string())
            }
            (AttributeKind::Silent, _) => AttributeValue::Bool(config.silent),
            (AttributeKind::TimeLimitSec, _) => {
                config.time_limit.map_or(AttributeValue::Null, AttributeValue::Float)
            }
            (AttributeKind::NumberOfThreads, _) => config
                .threads
                .map_or(AttributeValue::Null, |threads| AttributeValue::Int(i64::from(threads))),
            (AttributeKind::RelativeGapTolerance, _) => config
                .relative_gap
                .map_or(AttributeValue::Null, AttributeValue::Float),
            (AttributeKind::RawParameter(name), _) => {
                config.raw.get(name).cloned().unwrap_or(AttributeValue::Null)
            }
            (AttributeKind::VariableName, AttributeTarget::Variable(variable)) => {
                AttributeValue::Text(self.variable_name(variable).unwrap_or_default().to_string())
            }
            (AttributeKind::VariablePrimalStart, AttributeTarget::Variable(variable)) => self
                .attributes
                .variable_primal_start
                .get(&variable)
                .map_or(AttributeValue::Null, |value| AttributeValue::Float(*value)),
            (AttributeKind::VariablePrimal(index), AttributeTarget::Variable(variable)) => {
                AttributeValue::Float(self.variable_primal(variable, *index)?)
            }
            (AttributeKind::ConstraintName, AttributeTarget::Constraint(constraint)) => {
                AttributeValue::Text(
                    self.constraint_name(constraint)
                        .unwrap_or_default()
                        .to_string(),
                )
            }
            (AttributeKind::ConstraintPrimalStart, AttributeTarget::Constraint(constraint)) => self
                .attributes
                .constraint_primal_start
                .get(&constraint)
                .map_or(AttributeValue::Null, |values| AttributeValue::Vector(values.clone())),
            (AttributeKind::ConstraintDualStart, AttributeTarget::Constraint(constraint)) => self
                .attributes
                .constraint_dual_start
                .get(&constraint)
                .map_or(AttributeValue::Null, |values| AttributeValue::Vector(values.clone())),
            (AttributeKind::ConstraintPrimal(index), AttributeTarget::Constraint(constraint)) => {
                AttributeValue::Vector(self.constraint_primal(constraint, *index)?)
            }
            (AttributeKind::ConstraintDual(index), AttributeTarget::Constraint(constraint)) => {
                AttributeValue::Vector(self.constraint_dual(constraint, *index)?)
            }
            _ => return Err(not_available()),
        };
        Ok(value)
    }

    /// Whether `get_attribute(kind, target)` would succeed right now.
    pub fn can_get_attribute(&self, kind: &AttributeKind, target: impl Into<AttributeTarget>) -> bool {
        self.get_attribute(kind, target).is_ok()
    }

    /// Whether `kind` is writable on `target` for this backend.
    pub fn can_set_attribute(&self, kind: &AttributeKind, target: impl Into<AttributeTarget>) -> bool {
        let target = target.into();
        check_scope(kind, target).is_ok()
            && kind.access() == AttributeAccess::ReadWrite
            && (!kind.is_optimizer_parameter() || self.backend.supports_parameter(kind))
            && self.resolve_target(target).is_ok()
    }

    /// Write an attribute.
    ///
    /// Kinds whose `invalidates_results()` is set drop stored results once
    /// the write succeeds; names, starts and optimizer parameters do not.
    ///
    /// # Errors
    ///
    /// `AttributeScopeMismatch` when the target does not fit the kind,
    /// `AttributeNotSettable` for read-only kinds and parameters the backend
    /// does not honor, `InvalidAttributeValue` for a wrongly typed or
    /// out-of-range value, `StaleReference` for a dead target.
    pub fn set_attribute(
        &mut self,
        kind: &AttributeKind,
        target: impl Into<AttributeTarget>,
        value: impl Into<AttributeValue>,
    ) -> Result<(), SolverError> {
        let target = target.into();
        check_scope(kind, target)?;
        if kind.access() == AttributeAccess::ReadOnly
            || (kind.is_optimizer_parameter() && !self.backend.supports_parameter(kind))
        {
            return Err(SolverError::AttributeNotSettable(kind.clone()));
        }
        let value = coerce(kind, value.into())?;
        self.resolve_target(target)?;

        match (kind, target, value) {
            (AttributeKind::ObjectiveSense, _, AttributeValue::Sense(sense)) => {
                self.set_objective_sense(sense)?;
            }
            (AttributeKind::Name, _, AttributeValue::Text(name)) => self.attributes.name = name,
            (AttributeKind::Silent, _, AttributeValue::Bool(silent)) => {
                self.attributes.config.silent = silent;
            }
            (AttributeKind::TimeLimitSec, _, AttributeValue::Null) => {
                self.attributes.config.time_limit = None;
            }
            (AttributeKind::TimeLimitSec, _, AttributeValue::Float(seconds)) => {
                self.attributes.config.time_limit = Some(nonnegative(kind, seconds)?);
            }
            (AttributeKind::NumberOfThreads, _, AttributeValue::Null) => {
                self.attributes.config.threads = None;
            }
            (AttributeKind::NumberOfThreads, _, AttributeValue::Int(threads)) => {
                let threads = u32::try_from(threads)
                    .ok()
                    .filter(|threads| *threads >= 1)
                    .ok_or_else(|| invalid(kind, format!("{} is not a thread count", threads)))?;
                self.attributes.config.threads = Some(threads);
            }
            (AttributeKind::RelativeGapTolerance, _, AttributeValue::Null) => {
                self.attributes.config.relative_gap = None;
            }
            (AttributeKind::RelativeGapTolerance, _, AttributeValue::Float(gap)) => {
                if !gap.is_finite() {
                    return Err(invalid(kind, "gap tolerance must be finite"));
                }
                self.attributes.config.relative_gap = Some(nonnegative(kind, gap)?);
            }
            (AttributeKind::RawParameter(name), _, AttributeValue::Null) => {
                self.attributes.config.raw.remove(name);
            }
            (AttributeKind::RawParameter(name), _, value) => {
                self.attributes.config.raw.insert(name.clone(), value);
            }
            (AttributeKind::VariableName, AttributeTarget::Variable(variable), AttributeValue::Text(name)) => {
                if name.is_empty() {
                    self.attributes.variable_names.remove(&variable);
                } else {
                    self.attributes.variable_names.insert(variable, name);
                }
            }
            (AttributeKind::VariablePrimalStart, AttributeTarget::Variable(variable), AttributeValue::Null) => {
                self.attributes.variable_primal_start.remove(&variable);
            }
            (
                AttributeKind::VariablePrimalStart,
                AttributeTarget::Variable(variable),
                AttributeValue::Float(start),
            ) => {
                if !start.is_finite() {
                    return Err(invalid(kind, format!("non-finite start {}", start)));
                }
                self.attributes.variable_primal_start.insert(variable, start);
            }
            (AttributeKind::ConstraintName, AttributeTarget::Constraint(constraint), AttributeValue::Text(name)) => {
                if name.is_empty() {
                    self.attributes.constraint_names.remove(&constraint);
                } else {
                    self.attributes.constraint_names.insert(constraint, name);
                }
            }
            (
                AttributeKind::ConstraintPrimalStart | AttributeKind::ConstraintDualStart,
                AttributeTarget::Constraint(constraint),
                value,
            ) => {
                let values = match value {
                    AttributeValue::Vector(values) => {
                        let length = self
                            .constraints
                            .get(constraint)
                            .map_or(0, |entry| entry.function.output_dimension());
                        Some(finite_vector(kind, values, length)?)
                    }
                    _ => None,
                };
                let starts = if matches!(kind, AttributeKind::ConstraintDualStart) {
                    &mut self.attributes.constraint_dual_start
                } else {
                    &mut self.attributes.constraint_primal_start
                };
                match values {
                    Some(values) => {
                        starts.insert(constraint, values);
                    }
                    None => {
                        starts.remove(&constraint);
                    }
                }
            }
            _ => return Err(SolverError::AttributeNotSettable(kind.clone())),
        }
        if kind.invalidates_results() {
            self.invalidate_results("set_attribute");
        }

        tracing::debug!(
            component = "instance",
            operation = "set_attribute",
            status = "success",
            attribute = %kind,
            "Set attribute"
        );
        Ok(())
    }
}
