//! Parallel driver of the sparse product. The rows of the left operand are
//! split over a fixed-size pool of workers, each row handled by exactly one
//! worker, and the pool is joined before the product is handed back.

use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use strum_macros::{Display, EnumString};

use crate::error::{Error, Result};
use crate::matrix::SparseMatrix;
use crate::multiply::{multiply_row, multiply_row_sharded, RowIndex};
use crate::N_CPUS;

/// How workers combine their contributions into the product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Accumulation {
    /// Every worker merges into the shared output under one lock.
    #[default]
    Locked,
    /// Every worker builds its own rows, concatenated after the join. Only
    /// rows of the left operand holding entries are visited.
    Sharded,
}

#[derive(Debug, Clone)]
pub struct MultiplyConfig {
    pub num_threads: usize,
    pub accumulation: Accumulation,
}

impl Default for MultiplyConfig {
    fn default() -> Self {
        Self {
            num_threads: *N_CPUS,
            accumulation: Accumulation::default(),
        }
    }
}

impl MultiplyConfig {
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }
}

/// Product `a * b` with the default configuration.
pub fn multiply(a: &SparseMatrix, b: &SparseMatrix) -> Result<SparseMatrix> {
    multiply_with(a, b, &MultiplyConfig::default())
}

/// Product `a * b` in COO form. The entries of the result are unordered and
/// their physical order may differ between runs; their values do not.
pub fn multiply_with(
    a: &SparseMatrix,
    b: &SparseMatrix,
    config: &MultiplyConfig,
) -> Result<SparseMatrix> {
    if a.cols() != b.rows() {
        return Err(Error::DimensionMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }

    // every (a, b) entry pair yields at most one coordinate before merging
    let capacity = a
        .nnz()
        .checked_mul(b.nnz())
        .ok_or(Error::CapacityOverflow {
            left_nnz: a.nnz(),
            right_nnz: b.nnz(),
        })?;
    debug!(
        "output {}x{} bounded by {} entries",
        a.rows(),
        b.cols(),
        capacity
    );
    let c = SparseMatrix::with_capacity(a.rows(), b.cols(), capacity);
    if capacity == 0 {
        return Ok(c);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build()?;
    debug!(
        "{} rows over {} workers, {} accumulation",
        a.rows(),
        pool.current_num_threads(),
        config.accumulation
    );

    match config.accumulation {
        Accumulation::Locked => multiply_locked(&pool, a, b, c),
        Accumulation::Sharded => multiply_sharded(&pool, a, b, c),
    }
}

fn multiply_locked(
    pool: &rayon::ThreadPool,
    a: &SparseMatrix,
    b: &SparseMatrix,
    c: SparseMatrix,
) -> Result<SparseMatrix> {
    let c = Mutex::new(c);
    pool.install(|| {
        (0..a.rows())
            .into_par_iter()
            .try_for_each(|i| multiply_row(i, a, b, &c))
    })?;
    Ok(c.into_inner().unwrap_or_else(PoisonError::into_inner))
}

fn multiply_sharded(
    pool: &rayon::ThreadPool,
    a: &SparseMatrix,
    b: &SparseMatrix,
    mut c: SparseMatrix,
) -> Result<SparseMatrix> {
    let a_rows = RowIndex::new(a);
    let b_rows = RowIndex::new(b);
    let occupied: Vec<usize> = a_rows.occupied().collect();
    let shards: Vec<_> = pool.install(|| {
        occupied
            .into_par_iter()
            .map(|i| multiply_row_sharded(i, a, &a_rows, b, &b_rows))
            .collect()
    });
    for entry in shards.into_iter().flatten() {
        c.append(entry.row, entry.col, entry.value)?;
    }
    Ok(c)
}
