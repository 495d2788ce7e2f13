//! Errors reported by the expression engine, the chain builder and the solver

use crate::expression::VarId;

/// Unified error for chain configuration, preprocessing and stepping.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Variable id outside `0..degrees_of_freedom`.
    InvalidVariable { var: VarId, degrees_of_freedom: usize },
    /// Constraint with `min > max` (or a bound that is NaN).
    InvalidRange { var: VarId, min: f64, max: f64 },
    /// Configuration or `preprocess` attempted after preprocessing.
    AlreadyPreprocessed,
    /// Stepping or evaluation attempted before `preprocess`.
    NotReady,
    DimensionMismatch { expected: usize, found: usize },
    /// Expression refers to a variable the assignment does not cover.
    UnboundVariable(VarId),
    /// Rotation axis of zero length or with non-finite components.
    InvalidAxis { x: f64, y: f64, z: f64 },
    NonFinite(String),
    InvalidParameter(String),
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            SolverError::InvalidVariable { var, degrees_of_freedom } =>
                write!(f, "Invalid variable: {} (chain has {} degrees of freedom)", var, degrees_of_freedom),
            SolverError::InvalidRange { var, min, max } =>
                write!(f, "Invalid range for variable {}: min {} > max {}", var, min, max),
            SolverError::AlreadyPreprocessed =>
                write!(f, "Chain is already preprocessed and cannot be changed"),
            SolverError::NotReady =>
                write!(f, "Chain is not preprocessed yet"),
            SolverError::DimensionMismatch { expected, found } =>
                write!(f, "Dimension mismatch: expected {}, found {}", expected, found),
            SolverError::UnboundVariable(var) =>
                write!(f, "Unbound variable: {}", var),
            SolverError::InvalidAxis { x, y, z } =>
                write!(f, "Invalid rotation axis: ({}, {}, {})", x, y, z),
            SolverError::NonFinite(ref what) =>
                write!(f, "Non-finite value: {}", what),
            SolverError::InvalidParameter(ref msg) =>
                write!(f, "Invalid solver parameter: {}", msg),
        }
    }
}

impl std::error::Error for SolverError {}

/// Fails with [SolverError::NonFinite] naming the offending input if any value is NaN or infinite.
pub(crate) fn check_finite(what: &str, values: &[f64]) -> Result<(), SolverError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SolverError::NonFinite(format!("{} {:?}", what, values)))
    }
}
