//! Error definitions for Multiple Correspondence Analysis
use thiserror::Error;

pub type Result<T> = std::result::Result<T, McaError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum McaError {
    /// The input has no columns to analyse
    #[error("the table has no columns")]
    NoColumns,
    #[error("at least 1 sample needed")]
    NotEnoughSamples,
    #[error("invalid number of columns {0}, expected a positive number not larger than {1}")]
    InvalidColumnCount(usize, usize),
    #[error("number of columns before coding must be positive")]
    ZeroColumnCount,
    #[error("the column selection is empty")]
    EmptyColumnSelection,
    #[error("unknown column `{0}`")]
    UnknownColumn(String),
    #[error("level `{1}` was not observed in column `{0}` during fitting")]
    UnknownLevel(String, String),
    #[error("column selection requires a categorical table, the records are already coded")]
    ColumnsRequireTable,
    #[error("model was fitted on coded records and cannot encode categorical tables")]
    NoCoding,
    #[error("indicator matrix contains a negative entry at ({0}, {1})")]
    NegativeEntry(usize, usize),
    #[error("the entries of the indicator matrix sum to zero")]
    ZeroTotalCount,
    #[error("tolerance must be a finite, non-negative number")]
    InvalidTolerance,
    #[error("truncated decomposition needs at least two rows and columns, got {0}x{1}")]
    TooSmallForTruncation(usize, usize),
    #[error("singular vectors were not computed")]
    MissingSingularVectors,
    /// `percent` lies outside of `[0, 1]`
    #[error("percent should be a real number between 0 and 1, got {0}")]
    InvalidPercent(f64),
    #[error("number of factors should be a positive integer")]
    NonPositiveFactors,
    #[error("expected {expected} {axis}, got {actual}")]
    ShapeMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Greenacre correction requires at least two categorical variables, got {0}")]
    TooFewVariables(usize),
    #[cfg(feature = "blas")]
    #[error(transparent)]
    LinalgBlasError(#[from] ndarray_linalg::error::LinalgError),
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
    #[error(transparent)]
    NdShape(#[from] ndarray::ShapeError),
}
