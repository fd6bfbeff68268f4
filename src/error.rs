use std::path::PathBuf;

use thiserror::Error;

use crate::parameters::BoundsError;

/// Error types for the dcm-fit library.
#[derive(Error, Debug)]
pub enum DcmFitError {
    /// The data file for an intensity does not exist.
    #[error("Data not found: {}", path.display())]
    DataNotFound { path: PathBuf },

    /// The data file exists but could not be interpreted.
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// No energy-axis sample lies above one of the region-of-interest bounds.
    #[error("Region of interest error: no axis energy above {bound} (first = {first:?}, last = {last:?})")]
    RegionOfInterest {
        bound: f64,
        first: Option<usize>,
        last: Option<usize>,
    },

    /// The solver did not converge.
    #[error("Fit failed to converge: {0}")]
    FitConvergence(String),

    /// Error indicating a mismatch in matrix or vector dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Linear algebra error.
    #[error("Linear algebra error: {0}")]
    LinearAlgebraError(String),

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV reading/writing error.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type alias for dcm-fit operations.
pub type Result<T> = std::result::Result<T, DcmFitError>;

impl DcmFitError {
    /// Whether the error is a solver failure that a retry might recover from.
    pub fn is_convergence_failure(&self) -> bool {
        matches!(
            self,
            DcmFitError::FitConvergence(_)
                | DcmFitError::SingularMatrix
                | DcmFitError::LinearAlgebraError(_)
        )
    }
}
