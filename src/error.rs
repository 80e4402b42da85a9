//! Error types for sparse products

use thiserror::Error;

/// Result type alias using the crate's Error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Inner dimensions of the operands disagree (`a.cols != b.rows`).
    #[error("Dimension mismatch: cannot multiply {left:?} by {right:?}")]
    DimensionMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    /// An append went past the preallocated bound. This means the worst case
    /// sizing of an output matrix was not honored and is never expected.
    #[error("Capacity exceeded: matrix holds at most {capacity} entries")]
    CapacityExceeded { capacity: usize },

    /// Coordinate outside of the declared shape.
    #[error("Index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// nnz(A) * nnz(B) does not fit in a usize.
    #[error("Capacity overflow: {left_nnz} * {right_nnz} entries")]
    CapacityOverflow { left_nnz: usize, right_nnz: usize },

    /// Asked to place entries in a matrix with no rows or no columns.
    #[error("Cannot place {nnz} entries in a {rows}x{cols} matrix")]
    EmptyShape { rows: usize, cols: usize, nnz: usize },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
