//! Optimizer parameters handed to a backend on every solve.

use crate::attribute::AttributeValue;
use std::collections::BTreeMap;

/// Optimizer parameters of a `SolverInstance`.
///
/// The `Silent`, `TimeLimitSec`, `NumberOfThreads`, `RelativeGapTolerance`
/// and `RawParameter` attributes read and write these fields. Unset fields
/// leave the backend's own default in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConfig {
    /// Wall-clock limit in seconds.
    pub time_limit: Option<f64>,
    pub relative_gap: Option<f64>,
    /// Keep the backend quiet on stdout.
    pub silent: bool,
    pub threads: Option<u32>,
    pub presolve: Option<bool>,
    /// Primal and dual feasibility tolerance.
    pub tolerance: Option<f64>,
    /// Backend-specific parameters by name.
    pub raw: BTreeMap<String, AttributeValue>,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_relative_gap(mut self, gap: f64) -> Self {
        self.relative_gap = Some(gap);
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_threads(mut self, count: u32) -> Self {
        self.threads = Some(count);
        self
    }

    pub fn with_presolve(mut self, enabled: bool) -> Self {
        self.presolve = Some(enabled);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set a parameter only the backend understands.
    pub fn with_raw(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.raw.insert(name.into(), value.into());
        self
    }

    /// `true` when nothing departs from the backend defaults.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        assert!(SolverConfig::new().is_empty());
        assert!(!SolverConfig::new().with_silent(true).is_empty());
        assert!(!SolverConfig::new().with_raw("presolve", "off").is_empty());
    }

    #[test]
    fn test_builders_fill_fields() {
        let config = SolverConfig::new()
            .with_time_limit(60.0)
            .with_relative_gap(0.01)
            .with_threads(4)
            .with_presolve(false)
            .with_tolerance(1e-7)
            .with_raw("simplex_strategy", 4_i64);

        assert_eq!(config.time_limit, Some(60.0));
        assert_eq!(config.relative_gap, Some(0.01));
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.presolve, Some(false));
        assert_eq!(config.tolerance, Some(1e-7));
        assert!(!config.silent);
        assert_eq!(
            config.raw.get("simplex_strategy"),
            Some(&AttributeValue::Int(4))
        );
    }
}
