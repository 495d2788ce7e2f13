//! Error handling for chain description files

use std::io;

use crate::solver_error::SolverError;

/// Unified error to report failures while reading and applying a chain description.
#[derive(Debug)]
pub enum ChainFileError {
    IoError(io::Error),
    ParseError(String),
    MissingField(String),
    InvalidLength { field: String, expected: usize, found: usize },
    /// The description is well-formed but describes an invalid chain.
    Solver(SolverError),
}

impl std::fmt::Display for ChainFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ChainFileError::IoError(ref err) =>
                write!(f, "IO Error: {}", err),
            ChainFileError::ParseError(ref msg) =>
                write!(f, "Parse Error: {}", msg),
            ChainFileError::MissingField(ref field) =>
                write!(f, "Missing Field: {}", field),
            ChainFileError::InvalidLength { ref field, expected, found } =>
                write!(f, "Invalid Length of {}: expected {}, found {}", field, expected, found),
            ChainFileError::Solver(ref err) =>
                write!(f, "Chain Configuration Error: {}", err),
        }
    }
}

impl std::error::Error for ChainFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            ChainFileError::IoError(ref err) => Some(err),
            ChainFileError::Solver(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ChainFileError {
    fn from(err: io::Error) -> Self {
        ChainFileError::IoError(err)
    }
}

impl From<SolverError> for ChainFileError {
    fn from(err: SolverError) -> Self {
        ChainFileError::Solver(err)
    }
}
