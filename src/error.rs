//! Error types.
//!
//! - [`FitError`] is returned by the fitting core, loaders and writers.
//! - [`AppError`] is what the `sfit` binary reports: a message plus the process
//!   exit code it should terminate with.

use std::path::Path;

/// Errors that can occur while loading data or fitting a surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    /// A negative polynomial degree was requested.
    #[error("Invalid polynomial degree {degree}: degree must be >= 0")]
    InvalidDegree { degree: i32 },

    /// Fewer distinct points than basis terms: the normal equations cannot be
    /// solved uniquely.
    #[error(
        "Insufficient data for degree {degree}: {required} basis terms need at least {required} distinct points, got {distinct} distinct out of {points}"
    )]
    InsufficientData {
        points: usize,
        distinct: usize,
        required: usize,
        degree: u32,
    },

    /// The assembled normal-equations matrix is singular or numerically unsolvable.
    #[error(
        "Normal equations are singular for degree {degree} with {points} points (condition estimate {condition:.3e}); points may be degenerate, e.g. collinear"
    )]
    SingularSystem {
        degree: u32,
        points: usize,
        condition: f64,
    },

    /// A post-fit consistency check exceeded its tolerance.
    #[error(
        "Fit validation failed ({check}): max deviation {max_deviation:.3e} exceeds relative tolerance {tolerance:.1e} (degree {degree}, {points} points)"
    )]
    FitValidation {
        check: &'static str,
        max_deviation: f64,
        tolerance: f64,
        degree: u32,
        points: usize,
    },

    /// The input text could not be parsed. `line` is 1-based; 0 refers to the
    /// file as a whole.
    #[error("Malformed input at line {line}: {message}")]
    MalformedInput { line: usize, message: String },

    /// A data point has a NaN or infinite coordinate.
    #[error("Data point {index} has a non-finite coordinate")]
    NonFinitePoint { index: usize },

    /// Grid resampling parameters are unusable.
    #[error("Invalid grid: {message}")]
    InvalidGrid { message: String },

    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },
}

impl FitError {
    pub fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        FitError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FitError>;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::InvalidDegree { .. }
            | FitError::MalformedInput { .. }
            | FitError::NonFinitePoint { .. }
            | FitError::InvalidGrid { .. }
            | FitError::Io { .. } => 2,
            FitError::InsufficientData { .. } => 3,
            FitError::SingularSystem { .. } | FitError::FitValidation { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
