use thiserror::Error;

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, NnError>;

/// Every failure the matrix kernel and the network can report.
#[derive(Error, Debug)]
pub enum NnError {
    /// A constructor was handed a zero dimension or an element count that
    /// does not fill `rows * cols`.
    #[error("invalid dimension {rows}x{cols} ({elements} elements supplied)")]
    InvalidDimension { rows: usize, cols: usize, elements: usize },

    #[error("index ({row}, {col}) out of range for {rows}x{cols} matrix")]
    IndexOutOfRange { row: usize, col: usize, rows: usize, cols: usize },

    /// Operand shapes are incompatible for `op`.
    #[error("{op}: dimension mismatch between {lhs:?} and {rhs:?}")]
    DimensionMismatch {
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    #[error("{op}: matrix is {rows}x{cols}, not square")]
    NotSquare { op: &'static str, rows: usize, cols: usize },

    #[error("division by {divisor}, which is below machine epsilon")]
    DivisionByZero { divisor: f64 },

    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
