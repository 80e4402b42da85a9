//! Multiplication of sparse matrices stored as coordinate lists (COO).
//!
//! <br>
//!
//! A COO matrix is nothing more than an unordered list of `(row, col, value)`
//! triplets along with its shape. Computing `C = A * B` in this format means,
//! for every row `i` of `A`, expanding each stored `A[i, k]` against every
//! stored `B[k, j]` and summing the products that land on the same `(i, j)`.
//! COO carries no row or column index so the straightforward form of this
//! expansion scans both operands for every row.
//!
//! The rows of `A` are independent of each other and are distributed over a
//! pool of worker threads. The only shared mutable state is the output
//! matrix, and the accumulation into it is done in one of two ways (see
//! [`parallel_ops::Accumulation`]): merged directly into the shared product
//! under a lock, or built per row by each worker and concatenated afterwards.
//! Either way the product holds at most one entry per coordinate and never
//! stores an entry created by a zero contribution.
//!
//! ```
//! use coo_spgemm::{multiply, SparseMatrix};
//!
//! let a = SparseMatrix::from_triplets(1, 2, [(0, 0, 2.0), (0, 1, 4.0)]).unwrap();
//! let b = SparseMatrix::from_triplets(2, 1, [(0, 0, 3.0), (1, 0, 5.0)]).unwrap();
//! let c = multiply(&a, &b).unwrap();
//! assert_eq!(c.nnz(), 1);
//! assert_eq!(c.entries()[0].value, 26.0);
//! ```

use ndarray::Array2;
use sprs::CsMatBase;

use lazy_static::lazy_static;

#[macro_use]
extern crate log;
extern crate approx;

pub mod error;
pub mod matrix;
pub mod multiply;
pub mod parallel_ops;
pub mod utils;

pub use error::{Error, Result};
pub use matrix::{Entry, SparseMatrix};
pub use parallel_ops::{multiply, multiply_with, Accumulation, MultiplyConfig};

pub type CsrMatrix = CsMatBase<f64, usize, Vec<usize>, Vec<usize>, Vec<f64>, usize>;
pub type Matrix = Array2<f64>;

lazy_static! {
    /// Default size of the worker pool.
    pub static ref N_CPUS: usize = num_cpus::get();
}
