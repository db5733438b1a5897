use thiserror::Error;

/// Main error type for the tuning engine
#[derive(Error, Debug)]
pub enum NtError {
    #[error("Search space error: {0}")]
    SearchSpace(#[from] SearchSpaceError),

    #[error("Point error: {0}")]
    Point(#[from] PointError),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Search-space definition errors
#[derive(Error, Debug)]
pub enum SearchSpaceError {
    #[error("Search space has no dimensions")]
    NoDimensions,

    #[error("Dimension {dim} ({name}) has no legal values")]
    EmptyDimension { dim: usize, name: String },

    #[error("Duplicate dimension name: {name}")]
    DuplicateName { name: String },

    #[error("Unknown test function: {name}")]
    UnknownFunction { name: String },

    #[error("Invalid search space definition: {message}")]
    InvalidDefinition { message: String },
}

/// Errors raised when a point does not fit its search space
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PointError {
    #[error("Point has {actual} dimensions, search space has {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index {index} out of range for dimension {dim} with {n_values} values")]
    IndexOutOfRange {
        dim: usize,
        index: usize,
        n_values: usize,
    },
}

/// Result type alias for engine operations
pub type NtResult<T> = Result<T, NtError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::NtError::Validation(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::NtError::Config(format!($($arg)*))
    };
}

/// Macro for creating evaluation errors
#[macro_export]
macro_rules! evaluation_error {
    ($($arg:tt)*) => {
        $crate::NtError::Evaluation(format!($($arg)*))
    };
}
