//! The backend's own copy of the model: columns, bounds, integrality and
//! linear rows, edited in place and turned into a HiGHS problem per solve.

use optera_expr::{
    ConstraintRef, Function, FunctionChange, ScalarAffineFunction, Set, VariableRef,
};
use optera_solver::{OptimizationSense, SolverError};
use std::collections::BTreeMap;

/// Sparse linear expression with a constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Linear {
    pub terms: BTreeMap<VariableRef, f64>,
    pub constant: f64,
}

impl Linear {
    pub fn from_affine(function: &ScalarAffineFunction) -> Self {
        let mut terms = BTreeMap::new();
        for term in function.terms() {
            *terms.entry(term.variable).or_insert(0.0) += term.coefficient;
        }
        terms.retain(|_, coefficient| *coefficient != 0.0);
        Self {
            terms,
            constant: function.constant_term(),
        }
    }

    pub fn single(variable: VariableRef) -> Self {
        Self {
            terms: BTreeMap::from([(variable, 1.0)]),
            constant: 0.0,
        }
    }

    pub fn set_coefficient(&mut self, variable: VariableRef, coefficient: f64) {
        if coefficient == 0.0 {
            self.terms.remove(&variable);
        } else {
            self.terms.insert(variable, coefficient);
        }
    }
}

/// One HiGHS row: `lower <= linear <= upper`, constant included.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NativeRow {
    pub linear: Linear,
    pub lower: f64,
    pub upper: f64,
}

impl NativeRow {
    /// Row bounds with the constant moved to the right-hand side.
    pub fn shifted_bounds(&self) -> (f64, f64) {
        (
            self.lower - self.linear.constant,
            self.upper - self.linear.constant,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NativeConstraint {
    /// A `ScalarVariable` bound, folded into the column bounds.
    Bound {
        variable: VariableRef,
        lower: f64,
        upper: f64,
    },
    /// `ZeroOne` or `Integer` on a column.
    Integrality { variable: VariableRef, binary: bool },
    Rows(Vec<NativeRow>),
}

fn interval(set: &Set) -> Option<(f64, f64)> {
    match set {
        Set::LessThan { .. } | Set::GreaterThan { .. } | Set::EqualTo { .. } | Set::Interval { .. } => {
            set.scalar_bounds()
        }
        _ => None,
    }
}

fn cone_bounds(set: &Set) -> Option<(f64, f64)> {
    match set {
        Set::Nonnegatives { .. } => Some((0.0, f64::INFINITY)),
        Set::Nonpositives { .. } => Some((f64::NEG_INFINITY, 0.0)),
        Set::Zeros { .. } => Some((0.0, 0.0)),
        _ => None,
    }
}

impl NativeConstraint {
    /// Native form of an accepted (function, set) pair; `None` for pairs
    /// HiGHS cannot represent.
    pub fn from_pair(function: &Function, set: &Set) -> Option<Self> {
        match (function, set) {
            (Function::ScalarVariable(variable), Set::ZeroOne) => Some(NativeConstraint::Integrality {
                variable: *variable,
                binary: true,
            }),
            (Function::ScalarVariable(variable), Set::Integer) => Some(NativeConstraint::Integrality {
                variable: *variable,
                binary: false,
            }),
            (Function::ScalarVariable(variable), set) => {
                interval(set).map(|(lower, upper)| NativeConstraint::Bound {
                    variable: *variable,
                    lower,
                    upper,
                })
            }
            (Function::ScalarAffine(affine), set) => interval(set).map(|(lower, upper)| {
                NativeConstraint::Rows(vec![NativeRow {
                    linear: Linear::from_affine(affine),
                    lower,
                    upper,
                }])
            }),
            (Function::VectorOfVariables(variables), set) => {
                cone_bounds(set).map(|(lower, upper)| {
                    NativeConstraint::Rows(
                        variables
                            .iter()
                            .map(|variable| NativeRow {
                                linear: Linear::single(*variable),
                                lower,
                                upper,
                            })
                            .collect(),
                    )
                })
            }
            (Function::VectorAffine(affine), set) => cone_bounds(set).map(|(lower, upper)| {
                NativeConstraint::Rows(
                    affine
                        .rows()
                        .iter()
                        .map(|row| NativeRow {
                            linear: Linear::from_affine(row),
                            lower,
                            upper,
                        })
                        .collect(),
                )
            }),
            _ => None,
        }
    }

    /// Apply an in-place function edit.
    pub fn apply_change(&mut self, change: &FunctionChange) -> Result<(), SolverError> {
        let not_applicable =
            || SolverError::UnsupportedModification(format!("{} on a native constraint", change.name()));
        let NativeConstraint::Rows(rows) = self else {
            return Err(not_applicable());
        };
        match change {
            FunctionChange::ScalarConstant(constant) if rows.len() == 1 => {
                rows[0].linear.constant = *constant;
            }
            FunctionChange::ScalarCoefficient {
                variable,
                coefficient,
            } if rows.len() == 1 => rows[0].linear.set_coefficient(*variable, *coefficient),
            FunctionChange::VectorConstants(constants) if constants.len() == rows.len() => {
                for (row, constant) in rows.iter_mut().zip(constants) {
                    row.linear.constant = *constant;
                }
            }
            FunctionChange::MultirowCoefficient {
                variable,
                new_coefficients,
            } => {
                if new_coefficients.iter().any(|(row, _)| *row >= rows.len()) {
                    return Err(not_applicable());
                }
                for (row, coefficient) in new_coefficients {
                    rows[*row].linear.set_coefficient(*variable, *coefficient);
                }
            }
            _ => return Err(not_applicable()),
        }
        Ok(())
    }

    /// Replace bounds after a set replacement of the same type.
    pub fn replace_set(&mut self, set: &Set) {
        match self {
            NativeConstraint::Bound { lower, upper, .. } => {
                if let Some((new_lower, new_upper)) = interval(set) {
                    *lower = new_lower;
                    *upper = new_upper;
                }
            }
            NativeConstraint::Rows(rows) => {
                if let Some((lower, upper)) = interval(set).or_else(|| cone_bounds(set)) {
                    for row in rows {
                        row.lower = lower;
                        row.upper = upper;
                    }
                }
            }
            NativeConstraint::Integrality { .. } => {}
        }
    }

    /// The column this constraint sits on, for bound and integrality constraints.
    pub fn column_variable(&self) -> Option<VariableRef> {
        match self {
            NativeConstraint::Bound { variable, .. }
            | NativeConstraint::Integrality { variable, .. } => Some(*variable),
            NativeConstraint::Rows(_) => None,
        }
    }
}

/// Columns in creation order, constraints by handle, and the objective.
#[derive(Debug, Clone)]
pub(crate) struct NativeModel {
    pub columns: Vec<VariableRef>,
    pub constraints: BTreeMap<ConstraintRef, NativeConstraint>,
    pub sense: OptimizationSense,
    pub objective: Linear,
}

impl Default for NativeModel {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            constraints: BTreeMap::new(),
            sense: OptimizationSense::Feasibility,
            objective: Linear::default(),
        }
    }
}

impl NativeModel {
    /// Drop a column, its bound and integrality constraints, and its terms
    /// everywhere else.
    pub fn remove_column(&mut self, variable: VariableRef) {
        self.columns.retain(|column| *column != variable);
        self.constraints
            .retain(|_, constraint| constraint.column_variable() != Some(variable));
        for constraint in self.constraints.values_mut() {
            if let NativeConstraint::Rows(rows) = constraint {
                for row in rows {
                    row.linear.terms.remove(&variable);
                }
            }
        }
        self.objective.terms.remove(&variable);
    }

    pub fn set_objective(
        &mut self,
        sense: OptimizationSense,
        function: &Function,
    ) -> Result<(), SolverError> {
        let affine = function
            .as_scalar_affine()
            .ok_or(SolverError::UnsupportedObjective(function.function_type()))?;
        self.sense = sense;
        self.objective = Linear::from_affine(&affine);
        Ok(())
    }
}
