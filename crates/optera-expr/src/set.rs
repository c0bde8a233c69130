//! Sets a function is constrained to lie in.
//!
//! Scalar sets pair with scalar functions, everything else with vector
//! functions of matching output dimension. `Extension` carries variants the
//! core does not know about; backends decide whether they recognize the name.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub enum Set {
    LessThan { upper: f64 },
    GreaterThan { lower: f64 },
    EqualTo { value: f64 },
    Interval { lower: f64, upper: f64 },
    Nonnegatives { dimension: usize },
    Nonpositives { dimension: usize },
    Zeros { dimension: usize },
    Reals { dimension: usize },
    /// `(t, x)` with `t >= ||x||₂`.
    SecondOrderCone { dimension: usize },
    /// Closure of `{(x, y, z) : y > 0, y·exp(x/y) <= z}`.
    ExponentialCone,
    /// Closure of `{(u, v, w) : u < 0, -u·exp(v/u) <= e·w}`.
    DualExponentialCone,
    /// Upper triangle of a symmetric PSD matrix, column by column.
    PositiveSemidefiniteConeTriangle { side_dimension: usize },
    /// Same layout with off-diagonal entries scaled by √2.
    PositiveSemidefiniteConeScaled { side_dimension: usize },
    Integer,
    ZeroOne,
    /// `x = 0` or `lower <= x <= upper`.
    Semicontinuous { lower: f64, upper: f64 },
    /// `x = 0` or integral `lower <= x <= upper`.
    Semiinteger { lower: f64, upper: f64 },
    /// At most one nonzero entry; `weights` orders the entries.
    Sos1 { weights: Vec<f64> },
    /// At most two nonzero entries, adjacent in weight order.
    Sos2 { weights: Vec<f64> },
    Extension {
        name: &'static str,
        dimension: usize,
        parameters: Vec<f64>,
    },
}

/// Static type of a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[non_exhaustive]
pub enum SetType {
    LessThan,
    GreaterThan,
    EqualTo,
    Interval,
    Nonnegatives,
    Nonpositives,
    Zeros,
    Reals,
    SecondOrderCone,
    ExponentialCone,
    DualExponentialCone,
    PositiveSemidefiniteConeTriangle,
    PositiveSemidefiniteConeScaled,
    Integer,
    ZeroOne,
    Semicontinuous,
    Semiinteger,
    Sos1,
    Sos2,
    Extension(&'static str),
}

impl SetType {
    pub fn as_str(self) -> &'static str {
        match self {
            SetType::LessThan => "LessThan",
            SetType::GreaterThan => "GreaterThan",
            SetType::EqualTo => "EqualTo",
            SetType::Interval => "Interval",
            SetType::Nonnegatives => "Nonnegatives",
            SetType::Nonpositives => "Nonpositives",
            SetType::Zeros => "Zeros",
            SetType::Reals => "Reals",
            SetType::SecondOrderCone => "SecondOrderCone",
            SetType::ExponentialCone => "ExponentialCone",
            SetType::DualExponentialCone => "DualExponentialCone",
            SetType::PositiveSemidefiniteConeTriangle => "PositiveSemidefiniteConeTriangle",
            SetType::PositiveSemidefiniteConeScaled => "PositiveSemidefiniteConeScaled",
            SetType::Integer => "Integer",
            SetType::ZeroOne => "ZeroOne",
            SetType::Semicontinuous => "Semicontinuous",
            SetType::Semiinteger => "Semiinteger",
            SetType::Sos1 => "SOS1",
            SetType::Sos2 => "SOS2",
            SetType::Extension(name) => name,
        }
    }

    /// Scalar sets pair with scalar functions. Extension sets are always vector-shaped.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            SetType::LessThan
                | SetType::GreaterThan
                | SetType::EqualTo
                | SetType::Interval
                | SetType::Integer
                | SetType::ZeroOne
                | SetType::Semicontinuous
                | SetType::Semiinteger
        )
    }
}

impl std::fmt::Display for SetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetError {
    /// A bound or parameter is NaN, or infinite where a finite value is required.
    NonFiniteBound { set: SetType, value: f64 },
    /// `lower > upper`.
    InvalidBounds { set: SetType, lower: f64, upper: f64 },
    /// Dimension outside the range the set admits.
    InvalidDimension { set: SetType, dimension: usize },
    /// SOS weights must be distinct.
    DuplicateSosWeights,
}

impl SetError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SetError::NonFiniteBound { .. } => "SET_NON_FINITE_BOUND",
            SetError::InvalidBounds { .. } => "SET_INVALID_BOUNDS",
            SetError::InvalidDimension { .. } => "SET_INVALID_DIMENSION",
            SetError::DuplicateSosWeights => "SET_DUPLICATE_SOS_WEIGHTS",
        }
    }
}

impl std::fmt::Display for SetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetError::NonFiniteBound { set, value } => write!(
                f,
                "[{}] {} requires finite parameters (got {})",
                self.code(),
                set,
                value
            ),
            SetError::InvalidBounds { set, lower, upper } => write!(
                f,
                "[{}] {} lower bound {} exceeds upper bound {}",
                self.code(),
                set,
                lower,
                upper
            ),
            SetError::InvalidDimension { set, dimension } => write!(
                f,
                "[{}] {} does not admit dimension {}",
                self.code(),
                set,
                dimension
            ),
            SetError::DuplicateSosWeights => {
                write!(f, "[{}] SOS weights must be distinct", self.code())
            }
        }
    }
}

impl std::error::Error for SetError {}

fn finite(set: SetType, value: f64) -> Result<(), SetError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SetError::NonFiniteBound { set, value })
    }
}

fn ordered(set: SetType, lower: f64, upper: f64) -> Result<(), SetError> {
    if lower > upper {
        Err(SetError::InvalidBounds { set, lower, upper })
    } else {
        Ok(())
    }
}

fn at_least(set: SetType, dimension: usize, minimum: usize) -> Result<(), SetError> {
    if dimension < minimum {
        Err(SetError::InvalidDimension { set, dimension })
    } else {
        Ok(())
    }
}

fn is_integral(value: f64, tolerance: f64) -> bool {
    (value - value.round()).abs() <= tolerance
}

impl Set {
    pub fn set_type(&self) -> SetType {
        match self {
            Set::LessThan { .. } => SetType::LessThan,
            Set::GreaterThan { .. } => SetType::GreaterThan,
            Set::EqualTo { .. } => SetType::EqualTo,
            Set::Interval { .. } => SetType::Interval,
            Set::Nonnegatives { .. } => SetType::Nonnegatives,
            Set::Nonpositives { .. } => SetType::Nonpositives,
            Set::Zeros { .. } => SetType::Zeros,
            Set::Reals { .. } => SetType::Reals,
            Set::SecondOrderCone { .. } => SetType::SecondOrderCone,
            Set::ExponentialCone => SetType::ExponentialCone,
            Set::DualExponentialCone => SetType::DualExponentialCone,
            Set::PositiveSemidefiniteConeTriangle { .. } => SetType::PositiveSemidefiniteConeTriangle,
            Set::PositiveSemidefiniteConeScaled { .. } => SetType::PositiveSemidefiniteConeScaled,
            Set::Integer => SetType::Integer,
            Set::ZeroOne => SetType::ZeroOne,
            Set::Semicontinuous { .. } => SetType::Semicontinuous,
            Set::Semiinteger { .. } => SetType::Semiinteger,
            Set::Sos1 { .. } => SetType::Sos1,
            Set::Sos2 { .. } => SetType::Sos2,
            Set::Extension { name, .. } => SetType::Extension(*name),
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.set_type().is_scalar()
    }

    /// Number of scalar entries a member of the set has.
    pub fn dimension(&self) -> usize {
        match self {
            Set::LessThan { .. }
            | Set::GreaterThan { .. }
            | Set::EqualTo { .. }
            | Set::Interval { .. }
            | Set::Integer
            | Set::ZeroOne
            | Set::Semicontinuous { .. }
            | Set::Semiinteger { .. } => 1,
            Set::Nonnegatives { dimension }
            | Set::Nonpositives { dimension }
            | Set::Zeros { dimension }
            | Set::Reals { dimension }
            | Set::SecondOrderCone { dimension }
            | Set::Extension { dimension, .. } => *dimension,
            Set::ExponentialCone | Set::DualExponentialCone => 3,
            Set::PositiveSemidefiniteConeTriangle { side_dimension }
            | Set::PositiveSemidefiniteConeScaled { side_dimension } => {
                side_dimension * (side_dimension + 1) / 2
            }
            Set::Sos1 { weights } | Set::Sos2 { weights } => weights.len(),
        }
    }

    /// `(lower, upper)` of scalar interval-like sets; infinite where unbounded.
    pub fn scalar_bounds(&self) -> Option<(f64, f64)> {
        match self {
            Set::LessThan { upper } => Some((f64::NEG_INFINITY, *upper)),
            Set::GreaterThan { lower } => Some((*lower, f64::INFINITY)),
            Set::EqualTo { value } => Some((*value, *value)),
            Set::Interval { lower, upper } => Some((*lower, *upper)),
            _ => None,
        }
    }

    /// Check parameters. `Interval` admits infinite bounds; every other
    /// scalar bound must be finite.
    pub fn validate(&self) -> Result<(), SetError> {
        let set = self.set_type();
        match self {
            Set::LessThan { upper: value }
            | Set::GreaterThan { lower: value }
            | Set::EqualTo { value } => finite(set, *value),
            Set::Interval { lower, upper } => {
                for value in [*lower, *upper] {
                    if value.is_nan() {
                        return Err(SetError::NonFiniteBound { set, value });
                    }
                }
                ordered(set, *lower, *upper)
            }
            Set::Semicontinuous { lower, upper } | Set::Semiinteger { lower, upper } => {
                finite(set, *lower)?;
                finite(set, *upper)?;
                ordered(set, *lower, *upper)
            }
            Set::Nonnegatives { dimension }
            | Set::Nonpositives { dimension }
            | Set::Zeros { dimension }
            | Set::Reals { dimension } => at_least(set, *dimension, 1),
            Set::SecondOrderCone { dimension } => at_least(set, *dimension, 2),
            Set::PositiveSemidefiniteConeTriangle { side_dimension }
            | Set::PositiveSemidefiniteConeScaled { side_dimension } => {
                at_least(set, *side_dimension, 1)
            }
            Set::Sos1 { weights } | Set::Sos2 { weights } => {
                let minimum = if matches!(self, Set::Sos2 { .. }) { 2 } else { 1 };
                at_least(set, weights.len(), minimum)?;
                for weight in weights {
                    finite(set, *weight)?;
                }
                let mut sorted = weights.clone();
                sorted.sort_by(f64::total_cmp);
                if sorted.windows(2).any(|pair| pair[0] == pair[1]) {
                    return Err(SetError::DuplicateSosWeights);
                }
                Ok(())
            }
            Set::Extension {
                dimension,
                parameters,
                ..
            } => {
                at_least(set, *dimension, 1)?;
                parameters.iter().try_for_each(|value| finite(set, *value))
            }
            Set::ExponentialCone | Set::DualExponentialCone | Set::Integer | Set::ZeroOne => Ok(()),
        }
    }

    /// Membership test within `tolerance`.
    ///
    /// Returns `None` where the core cannot decide membership (semidefinite
    /// cones and extension sets). A value vector of the wrong length is never
    /// a member, and nothing is a member of a cone without a `t` entry.
    pub fn contains(&self, values: &[f64], tolerance: f64) -> Option<bool> {
        if matches!(
            self,
            Set::PositiveSemidefiniteConeTriangle { .. }
                | Set::PositiveSemidefiniteConeScaled { .. }
                | Set::Extension { .. }
        ) {
            return None;
        }
        if values.len() != self.dimension() {
            return Some(false);
        }
        let member = match self {
            Set::LessThan { upper } => values[0] <= upper + tolerance,
            Set::GreaterThan { lower } => values[0] >= lower - tolerance,
            Set::EqualTo { value } => (values[0] - value).abs() <= tolerance,
            Set::Interval { lower, upper } => {
                values[0] >= lower - tolerance && values[0] <= upper + tolerance
            }
            Set::Nonnegatives { .. } => values.iter().all(|v| *v >= -tolerance),
            Set::Nonpositives { .. } => values.iter().all(|v| *v <= tolerance),
            Set::Zeros { .. } => values.iter().all(|v| v.abs() <= tolerance),
            Set::Reals { .. } => true,
            Set::SecondOrderCone { .. } => match values.split_first() {
                Some((t, x)) => *t >= x.iter().map(|v| v * v).sum::<f64>().sqrt() - tolerance,
                None => false,
            },
            Set::ExponentialCone => {
                let (x, y, z) = (values[0], values[1], values[2]);
                if y > tolerance {
                    y * (x / y).exp() <= z + tolerance
                } else {
                    x <= tolerance && y.abs() <= tolerance && z >= -tolerance
                }
            }
            Set::DualExponentialCone => {
                let (u, v, w) = (values[0], values[1], values[2]);
                if u < -tolerance {
                    -u * (v / u).exp() <= std::f64::consts::E * w + tolerance
                } else {
                    u.abs() <= tolerance && v >= -tolerance && w >= -tolerance
                }
            }
            Set::Integer => is_integral(values[0], tolerance),
            Set::ZeroOne => values[0].abs() <= tolerance || (values[0] - 1.0).abs() <= tolerance,
            Set::Semicontinuous { lower, upper } => {
                values[0].abs() <= tolerance
                    || (values[0] >= lower - tolerance && values[0] <= upper + tolerance)
            }
            Set::Semiinteger { lower, upper } => {
                values[0].abs() <= tolerance
                    || (values[0] >= lower - tolerance
                        && values[0] <= upper + tolerance
                        && is_integral(values[0], tolerance))
            }
            Set::Sos1 { .. } => values.iter().filter(|v| v.abs() > tolerance).count() <= 1,
            Set::Sos2 { weights } => {
                let mut order: Vec<usize> = (0..weights.len()).collect();
                order.sort_by(|a, b| weights[*a].total_cmp(&weights[*b]));
                let nonzero: Vec<usize> = order
                    .iter()
                    .enumerate()
                    .filter(|(_, index)| values[**index].abs() > tolerance)
                    .map(|(position, _)| position)
                    .collect();
                match nonzero.as_slice() {
                    [] | [_] => true,
                    [a, b] => b - a == 1,
                    _ => false,
                }
            }
            Set::PositiveSemidefiniteConeTriangle { .. }
            | Set::PositiveSemidefiniteConeScaled { .. }
            | Set::Extension { .. } => return None,
        };
        Some(member)
    }

    /// Dual cone used for constraint duals.
    ///
    /// Scalar bound sets map to the one-dimensional cone their dual lives in
    /// (`GreaterThan` → nonnegative, `LessThan` → nonpositive, `EqualTo` →
    /// free). Returns `None` for sets without a conic dual.
    pub fn dual_cone(&self) -> Option<Set> {
        match self {
            Set::GreaterThan { .. } => Some(Set::Nonnegatives { dimension: 1 }),
            Set::LessThan { .. } => Some(Set::Nonpositives { dimension: 1 }),
            Set::EqualTo { .. } => Some(Set::Reals { dimension: 1 }),
            Set::Nonnegatives { dimension } => Some(Set::Nonnegatives {
                dimension: *dimension,
            }),
            Set::Nonpositives { dimension } => Some(Set::Nonpositives {
                dimension: *dimension,
            }),
            Set::Zeros { dimension } => Some(Set::Reals {
                dimension: *dimension,
            }),
            Set::Reals { dimension } => Some(Set::Zeros {
                dimension: *dimension,
            }),
            Set::SecondOrderCone { dimension } => Some(Set::SecondOrderCone {
                dimension: *dimension,
            }),
            Set::ExponentialCone => Some(Set::DualExponentialCone),
            Set::DualExponentialCone => Some(Set::ExponentialCone),
            Set::PositiveSemidefiniteConeScaled { side_dimension } => {
                Some(Set::PositiveSemidefiniteConeScaled {
                    side_dimension: *side_dimension,
                })
            }
            _ => None,
        }
    }
}
