//! Error types for Esfera

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Parameter {index} has {ndim} dimensions, need at least {min} (two batch dimensions plus one reduced dimension)")]
    InsufficientRank { index: usize, ndim: usize, min: usize },

    #[error("No parameters to optimize")]
    EmptyParameters,

    #[error("Parameter count mismatch: expected {expected}, got {got}")]
    ParameterCountMismatch { expected: usize, got: usize },

    #[error("Invalid gradient: {0}")]
    InvalidGradient(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Post-process failed: {0}")]
    PostProcess(String),
}

pub type Result<T> = std::result::Result<T, Error>;
