use gaze_core::Real;
use thiserror::Error;

/// Errors that stop a calibration before the optimizer runs.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The sample set is empty.
    #[error("no calibration samples")]
    NoSamples,
    /// Variable vector and bounds array have a different number of rows.
    #[error("variable vector has {values} rows but bounds array has {bounds}")]
    RowCountMismatch { values: usize, bounds: usize },
    /// A row holds a different number of scalars than its bounds row.
    #[error("row {row}: {values} values but {bounds} bounds")]
    RowLengthMismatch {
        row: usize,
        values: usize,
        bounds: usize,
    },
    /// No scalar to optimize.
    #[error("variable vector is empty")]
    NoVariables,
    /// Bound is not finite or `lower > upper`.
    #[error("invalid bound [{lower}, {upper}] at row {row}, column {col}")]
    InvalidBound {
        row: usize,
        col: usize,
        lower: Real,
        upper: Real,
    },
    /// Initial value is NaN or infinite.
    #[error("initial value at row {row}, column {col} is not finite")]
    NonFiniteInitial { row: usize, col: usize },
    /// Every sample failed at the initial parameters.
    #[error("all {0} samples failed at the initial parameters")]
    NoUsableSamples(usize),
}
