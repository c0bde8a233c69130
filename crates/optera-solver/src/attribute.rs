//! Attribute kinds, targets and values.
//!
//! Every kind fixes its scope, value type, access and availability. The
//! instance answers queries from these tables before touching any store.

use crate::status::{ResultStatusCode, TerminationStatusCode};
use optera_expr::{ConstraintRef, ConstraintType, FunctionType, VariableRef};
use serde::Serialize;
use std::num::NonZeroU32;

/// 1-based index of a result vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResultIndex(NonZeroU32);

impl ResultIndex {
    pub const FIRST: ResultIndex = ResultIndex(NonZeroU32::MIN);

    /// `None` for index 0.
    pub fn new(index: u32) -> Option<Self> {
        NonZeroU32::new(index).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// 0-based position into a result list.
    pub fn position(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl Default for ResultIndex {
    fn default() -> Self {
        Self::FIRST
    }
}

impl std::fmt::Display for ResultIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptimizationSense {
    Min,
    Max,
    /// No objective: any feasible point is acceptable.
    Feasibility,
}

impl OptimizationSense {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationSense::Min => "min",
            OptimizationSense::Max => "max",
            OptimizationSense::Feasibility => "feasibility",
        }
    }
}

impl std::fmt::Display for OptimizationSense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeScope {
    Model,
    Variable,
    Constraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeAccess {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Availability {
    Always,
    /// Only while the instance holds results from `optimize()`.
    AfterSolve,
}

/// Type of value an attribute kind holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    Text,
    TerminationStatus,
    ResultStatus,
    Sense,
    FunctionType,
    Vector,
    ConstraintTypes,
    Count,
    /// Backend-defined raw values.
    Any,
}

/// Closed set of attribute kinds plus `Raw*` escape hatches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum AttributeKind {
    // model, results
    TerminationStatus,
    RawStatusString,
    ResultCount,
    PrimalStatus(ResultIndex),
    DualStatus(ResultIndex),
    ObjectiveValue(ResultIndex),
    DualObjectiveValue(ResultIndex),
    ObjectiveBound,
    RelativeGap,
    SolveTimeSec,
    SimplexIterations,
    BarrierIterations,
    NodeCount,
    RawResult(String),
    // model, description
    ObjectiveSense,
    ObjectiveFunctionType,
    NumberOfVariables,
    ListOfConstraintTypesPresent,
    Name,
    // optimizer
    SolverName,
    Silent,
    TimeLimitSec,
    NumberOfThreads,
    RelativeGapTolerance,
    RawParameter(String),
    // variable
    VariableName,
    VariablePrimalStart,
    VariablePrimal(ResultIndex),
    // constraint
    ConstraintName,
    ConstraintPrimalStart,
    ConstraintDualStart,
    ConstraintPrimal(ResultIndex),
    ConstraintDual(ResultIndex),
}

impl AttributeKind {
    pub fn scope(&self) -> AttributeScope {
        match self {
            AttributeKind::VariableName
            | AttributeKind::VariablePrimalStart
            | AttributeKind::VariablePrimal(_) => AttributeScope::Variable,
            AttributeKind::ConstraintName
            | AttributeKind::ConstraintPrimalStart
            | AttributeKind::ConstraintDualStart
            | AttributeKind::ConstraintPrimal(_)
            | AttributeKind::ConstraintDual(_) => AttributeScope::Constraint,
            _ => AttributeScope::Model,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            AttributeKind::TerminationStatus => ValueType::TerminationStatus,
            AttributeKind::PrimalStatus(_) | AttributeKind::DualStatus(_) => ValueType::ResultStatus,
            AttributeKind::RawStatusString
            | AttributeKind::Name
            | AttributeKind::SolverName
            | AttributeKind::VariableName
            | AttributeKind::ConstraintName => ValueType::Text,
            AttributeKind::ResultCount
            | AttributeKind::SimplexIterations
            | AttributeKind::BarrierIterations
            | AttributeKind::NodeCount
            | AttributeKind::NumberOfVariables => ValueType::Count,
            AttributeKind::ObjectiveValue(_)
            | AttributeKind::DualObjectiveValue(_)
            | AttributeKind::ObjectiveBound
            | AttributeKind::RelativeGap
            | AttributeKind::SolveTimeSec
            | AttributeKind::TimeLimitSec
            | AttributeKind::RelativeGapTolerance
            | AttributeKind::VariablePrimalStart
            | AttributeKind::VariablePrimal(_) => ValueType::Float,
            AttributeKind::ObjectiveSense => ValueType::Sense,
            AttributeKind::ObjectiveFunctionType => ValueType::FunctionType,
            AttributeKind::ListOfConstraintTypesPresent => ValueType::ConstraintTypes,
            AttributeKind::Silent => ValueType::Bool,
            AttributeKind::NumberOfThreads => ValueType::Int,
            AttributeKind::RawParameter(_) | AttributeKind::RawResult(_) => ValueType::Any,
            AttributeKind::ConstraintPrimalStart
            | AttributeKind::ConstraintDualStart
            | AttributeKind::ConstraintPrimal(_)
            | AttributeKind::ConstraintDual(_) => ValueType::Vector,
        }
    }

    pub fn access(&self) -> AttributeAccess {
        match self {
            AttributeKind::ObjectiveSense
            | AttributeKind::Name
            | AttributeKind::Silent
            | AttributeKind::TimeLimitSec
            | AttributeKind::NumberOfThreads
            | AttributeKind::RelativeGapTolerance
            | AttributeKind::RawParameter(_)
            | AttributeKind::VariableName
            | AttributeKind::VariablePrimalStart
            | AttributeKind::ConstraintName
            | AttributeKind::ConstraintPrimalStart
            | AttributeKind::ConstraintDualStart => AttributeAccess::ReadWrite,
            _ => AttributeAccess::ReadOnly,
        }
    }

    pub fn availability(&self) -> Availability {
        match self {
            AttributeKind::RawStatusString
            | AttributeKind::ObjectiveValue(_)
            | AttributeKind::DualObjectiveValue(_)
            | AttributeKind::ObjectiveBound
            | AttributeKind::RelativeGap
            | AttributeKind::SolveTimeSec
            | AttributeKind::SimplexIterations
            | AttributeKind::BarrierIterations
            | AttributeKind::NodeCount
            | AttributeKind::RawResult(_)
            | AttributeKind::VariablePrimal(_)
            | AttributeKind::ConstraintPrimal(_)
            | AttributeKind::ConstraintDual(_) => Availability::AfterSolve,
            _ => Availability::Always,
        }
    }

    /// Result vector a result-valued kind refers to.
    pub fn result_index(&self) -> Option<ResultIndex> {
        match self {
            AttributeKind::PrimalStatus(index)
            | AttributeKind::DualStatus(index)
            | AttributeKind::ObjectiveValue(index)
            | AttributeKind::DualObjectiveValue(index)
            | AttributeKind::VariablePrimal(index)
            | AttributeKind::ConstraintPrimal(index)
            | AttributeKind::ConstraintDual(index) => Some(*index),
            _ => None,
        }
    }

    /// Optimizer parameters forwarded to the backend in `SolverConfig`.
    pub fn is_optimizer_parameter(&self) -> bool {
        matches!(
            self,
            AttributeKind::Silent
                | AttributeKind::TimeLimitSec
                | AttributeKind::NumberOfThreads
                | AttributeKind::RelativeGapTolerance
                | AttributeKind::RawParameter(_)
        )
    }

    /// Writable kinds that may be reset to `AttributeValue::Null`.
    pub fn accepts_null(&self) -> bool {
        matches!(
            self,
            AttributeKind::TimeLimitSec
                | AttributeKind::NumberOfThreads
                | AttributeKind::RelativeGapTolerance
                | AttributeKind::RawParameter(_)
                | AttributeKind::VariablePrimalStart
                | AttributeKind::ConstraintPrimalStart
                | AttributeKind::ConstraintDualStart
        )
    }

    /// Writes that change the mathematical model and so drop results.
    pub fn invalidates_results(&self) -> bool {
        matches!(self, AttributeKind::ObjectiveSense)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::TerminationStatus => "TerminationStatus",
            AttributeKind::RawStatusString => "RawStatusString",
            AttributeKind::ResultCount => "ResultCount",
            AttributeKind::PrimalStatus(_) => "PrimalStatus",
            AttributeKind::DualStatus(_) => "DualStatus",
            AttributeKind::ObjectiveValue(_) => "ObjectiveValue",
            AttributeKind::DualObjectiveValue(_) => "DualObjectiveValue",
            AttributeKind::ObjectiveBound => "ObjectiveBound",
            AttributeKind::RelativeGap => "RelativeGap",
            AttributeKind::SolveTimeSec => "SolveTimeSec",
            AttributeKind::SimplexIterations => "SimplexIterations",
            AttributeKind::BarrierIterations => "BarrierIterations",
            AttributeKind::NodeCount => "NodeCount",
            AttributeKind::RawResult(_) => "RawResult",
            AttributeKind::ObjectiveSense => "ObjectiveSense",
            AttributeKind::ObjectiveFunctionType => "ObjectiveFunctionType",
            AttributeKind::NumberOfVariables => "NumberOfVariables",
            AttributeKind::ListOfConstraintTypesPresent => "ListOfConstraintTypesPresent",
            AttributeKind::Name => "Name",
            AttributeKind::SolverName => "SolverName",
            AttributeKind::Silent => "Silent",
            AttributeKind::TimeLimitSec => "TimeLimitSec",
            AttributeKind::NumberOfThreads => "NumberOfThreads",
            AttributeKind::RelativeGapTolerance => "RelativeGapTolerance",
            AttributeKind::RawParameter(_) => "RawParameter",
            AttributeKind::VariableName => "VariableName",
            AttributeKind::VariablePrimalStart => "VariablePrimalStart",
            AttributeKind::VariablePrimal(_) => "VariablePrimal",
            AttributeKind::ConstraintName => "ConstraintName",
            AttributeKind::ConstraintPrimalStart => "ConstraintPrimalStart",
            AttributeKind::ConstraintDualStart => "ConstraintDualStart",
            AttributeKind::ConstraintPrimal(_) => "ConstraintPrimal",
            AttributeKind::ConstraintDual(_) => "ConstraintDual",
        }
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeKind::RawParameter(key) | AttributeKind::RawResult(key) => {
                write!(f, "{}({})", self.name(), key)
            }
            _ => match self.result_index() {
                Some(index) => write!(f, "{}({})", self.name(), index),
                None => f.write_str(self.name()),
            },
        }
    }
}

/// What an attribute is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AttributeTarget {
    Model,
    Variable(VariableRef),
    Constraint(ConstraintRef),
}

impl AttributeTarget {
    pub fn scope(self) -> AttributeScope {
        match self {
            AttributeTarget::Model => AttributeScope::Model,
            AttributeTarget::Variable(_) => AttributeScope::Variable,
            AttributeTarget::Constraint(_) => AttributeScope::Constraint,
        }
    }
}

impl From<VariableRef> for AttributeTarget {
    fn from(variable: VariableRef) -> Self {
        AttributeTarget::Variable(variable)
    }
}

impl From<ConstraintRef> for AttributeTarget {
    fn from(constraint: ConstraintRef) -> Self {
        AttributeTarget::Constraint(constraint)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AttributeValue {
    /// Unset optional value.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    TerminationStatus(TerminationStatusCode),
    ResultStatus(ResultStatusCode),
    Sense(OptimizationSense),
    FunctionType(FunctionType),
    Vector(Vec<f64>),
    ConstraintTypes(Vec<ConstraintType>),
    Count(usize),
}

impl AttributeValue {
    /// Whether the value can be stored under an attribute of type `expected`.
    pub fn matches(&self, expected: ValueType) -> bool {
        matches!(
            (self, expected),
            (_, ValueType::Any)
                | (AttributeValue::Bool(_), ValueType::Bool)
                | (AttributeValue::Int(_), ValueType::Int)
                | (AttributeValue::Float(_), ValueType::Float)
                | (AttributeValue::Text(_), ValueType::Text)
                | (AttributeValue::TerminationStatus(_), ValueType::TerminationStatus)
                | (AttributeValue::ResultStatus(_), ValueType::ResultStatus)
                | (AttributeValue::Sense(_), ValueType::Sense)
                | (AttributeValue::FunctionType(_), ValueType::FunctionType)
                | (AttributeValue::Vector(_), ValueType::Vector)
                | (AttributeValue::ConstraintTypes(_), ValueType::ConstraintTypes)
                | (AttributeValue::Count(_), ValueType::Count)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Floats, and integers widened to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Float(value) => Some(*value),
            AttributeValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_count(&self) -> Option<usize> {
        match self {
            AttributeValue::Count(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            AttributeValue::Vector(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_termination_status(&self) -> Option<TerminationStatusCode> {
        match self {
            AttributeValue::TerminationStatus(status) => Some(*status),
            _ => None,
        }
    }

    pub fn as_result_status(&self) -> Option<ResultStatusCode> {
        match self {
            AttributeValue::ResultStatus(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(values: Vec<f64>) -> Self {
        AttributeValue::Vector(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_index_is_one_based() {
        assert!(ResultIndex::new(0).is_none());
        assert_eq!(ResultIndex::FIRST.get(), 1);
        assert_eq!(ResultIndex::new(3).map(ResultIndex::position), Some(2));
    }

    #[test]
    fn test_kind_tables() {
        let primal = AttributeKind::VariablePrimal(ResultIndex::FIRST);
        assert_eq!(primal.scope(), AttributeScope::Variable);
        assert_eq!(primal.access(), AttributeAccess::ReadOnly);
        assert_eq!(primal.availability(), Availability::AfterSolve);
        assert_eq!(primal.result_index(), Some(ResultIndex::FIRST));

        assert_eq!(AttributeKind::Silent.access(), AttributeAccess::ReadWrite);
        assert!(AttributeKind::Silent.is_optimizer_parameter());
        assert_eq!(AttributeKind::ResultCount.availability(), Availability::Always);
        assert_eq!(
            AttributeKind::ConstraintDual(ResultIndex::FIRST).value_type(),
            ValueType::Vector
        );
    }

    #[test]
    fn test_value_matches_type() {
        assert!(AttributeValue::Bool(true).matches(ValueType::Bool));
        assert!(!AttributeValue::Int(1).matches(ValueType::Float));
        assert!(AttributeValue::Text("x".into()).matches(ValueType::Any));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(
            AttributeKind::PrimalStatus(ResultIndex::FIRST).to_string(),
            "PrimalStatus(1)"
        );
        assert_eq!(
            AttributeKind::RawParameter("presolve".into()).to_string(),
            "RawParameter(presolve)"
        );
        assert_eq!(AttributeKind::SolveTimeSec.to_string(), "SolveTimeSec");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(AttributeValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttributeValue::from("name").as_str(), Some("name"));
        assert_eq!(AttributeValue::Null.as_bool(), None);
    }
}
