//! Per-row kernels of the sparse product. Each computes
//! `C[row, :] += A[row, :] * B` for a single row of the left operand.
//!
//! Two accumulation strategies share the same merge semantics: contributions
//! to the same output coordinate are summed, and a coordinate is only created
//! by a nonzero contribution, so no explicit zero is ever materialized.
//!
//! * [`multiply_row`] merges straight into the shared output behind a mutex,
//!   scanning the populated entries linearly for a matching coordinate.
//! * [`multiply_row_sharded`] accumulates into a row-local map. Rows never
//!   overlap between workers so the caller concatenates shards without locks.

use std::sync::{Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;

use crate::error::Result;
use crate::matrix::{Entry, SparseMatrix};

/// Positions of each row's entries in a COO matrix. Only rows holding at
/// least one entry are keyed, so the index is sized by nnz, not by the shape.
pub struct RowIndex {
    rows: IndexMap<usize, Vec<usize>>,
}

impl RowIndex {
    pub fn new(mat: &SparseMatrix) -> Self {
        let mut rows: IndexMap<usize, Vec<usize>> = IndexMap::new();
        for (pos, entry) in mat.entries().iter().enumerate() {
            rows.entry(entry.row).or_default().push(pos);
        }
        Self { rows }
    }

    /// Entry positions stored for `row`, empty when the row holds none.
    pub fn row(&self, row: usize) -> &[usize] {
        self.rows.get(&row).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows holding at least one entry, in order of first appearance.
    pub fn occupied(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.keys().copied()
    }
}

/// Recovers the guard if another worker panicked while merging; that panic
/// resurfaces from the pool anyway.
#[inline]
fn lock_output(c: &Mutex<SparseMatrix>) -> MutexGuard<'_, SparseMatrix> {
    c.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Adds `value` to the entry at `(row, col)` or appends it if absent.
/// Zero contributions to an absent coordinate are dropped.
fn merge(c: &mut SparseMatrix, row: usize, col: usize, value: f64) -> Result<()> {
    if let Some(entry) = c
        .entries_mut()
        .iter_mut()
        .find(|e| e.row == row && e.col == col)
    {
        entry.value += value;
        return Ok(());
    }
    if value != 0.0 {
        c.append(row, col, value)?;
    }
    Ok(())
}

/// Computes the contribution of row `row` of `a` and merges it into `c`.
///
/// Both operands are scanned in full, there is no row index in COO. Each
/// search-or-append runs with `c` locked so two workers can never both decide
/// a coordinate is missing. Rows of `b` are matched purely by equality with
/// the column of the `a` entry.
pub fn multiply_row(
    row: usize,
    a: &SparseMatrix,
    b: &SparseMatrix,
    c: &Mutex<SparseMatrix>,
) -> Result<()> {
    for a_entry in a.entries().iter().filter(|e| e.row == row) {
        for b_entry in b.entries().iter().filter(|e| e.row == a_entry.col) {
            let product = a_entry.value * b_entry.value;
            let mut c = lock_output(c);
            merge(&mut c, row, b_entry.col, product)?;
        }
    }
    Ok(())
}

/// Computes the contribution of row `row` of `a` without touching shared
/// state. Returns the merged entries of that output row in the order their
/// columns were first produced.
pub fn multiply_row_sharded(
    row: usize,
    a: &SparseMatrix,
    a_rows: &RowIndex,
    b: &SparseMatrix,
    b_rows: &RowIndex,
) -> Vec<Entry> {
    let a_entries = a.entries();
    let b_entries = b.entries();
    let mut row_values: IndexMap<usize, f64> = IndexMap::new();

    for &i in a_rows.row(row) {
        let a_entry = &a_entries[i];
        for &j in b_rows.row(a_entry.col) {
            let b_entry = &b_entries[j];
            let product = a_entry.value * b_entry.value;
            if let Some(value) = row_values.get_mut(&b_entry.col) {
                *value += product;
            } else if product != 0.0 {
                row_values.insert(b_entry.col, product);
            }
        }
    }

    if !row_values.is_empty() {
        trace!("row {row}: {} output entries", row_values.len());
    }

    row_values
        .into_iter()
        .map(|(col, value)| Entry::new(row, col, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_relative_eq;

    fn mat(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> SparseMatrix {
        SparseMatrix::from_triplets(rows, cols, triplets.iter().copied()).unwrap()
    }

    #[test]
    fn collisions_are_summed() {
        let a = mat(1, 2, &[(0, 0, 2.0), (0, 1, 4.0)]);
        let b = mat(2, 1, &[(0, 0, 3.0), (1, 0, 5.0)]);
        let c = Mutex::new(SparseMatrix::with_capacity(1, 1, 4));

        multiply_row(0, &a, &b, &c).unwrap();

        let c = c.into_inner().unwrap();
        assert_eq!(c.nnz(), 1);
        assert_eq!((c.entries()[0].row, c.entries()[0].col), (0, 0));
        assert_relative_eq!(c.entries()[0].value, 26.0);
    }

    #[test]
    fn empty_row_contributes_nothing() {
        let a = mat(2, 2, &[(0, 0, 1.0)]);
        let b = mat(2, 2, &[(0, 1, 1.0)]);
        let c = Mutex::new(SparseMatrix::with_capacity(2, 2, 1));

        multiply_row(1, &a, &b, &c).unwrap();

        assert!(c.into_inner().unwrap().is_empty());
    }

    #[test]
    fn zero_products_are_not_appended() {
        let a = mat(1, 2, &[(0, 0, 0.0), (0, 1, 1.0)]);
        let b = mat(2, 2, &[(0, 0, 5.0), (1, 1, 2.0)]);
        let c = Mutex::new(SparseMatrix::with_capacity(1, 2, 4));

        multiply_row(0, &a, &b, &c).unwrap();

        let c = c.into_inner().unwrap();
        assert_eq!(c.entries(), &[Entry::new(0, 1, 2.0)]);
    }

    #[test]
    fn zero_product_still_accumulates_into_existing_entry() {
        let a = mat(1, 2, &[(0, 0, 1.0), (0, 1, 0.0)]);
        let b = mat(2, 1, &[(0, 0, 3.0), (1, 0, 7.0)]);
        let c = Mutex::new(SparseMatrix::with_capacity(1, 1, 4));

        multiply_row(0, &a, &b, &c).unwrap();

        let c = c.into_inner().unwrap();
        assert_eq!(c.entries(), &[Entry::new(0, 0, 3.0)]);
    }

    #[test]
    fn too_small_output_fails_loudly() {
        let a = mat(1, 2, &[(0, 0, 1.0), (0, 1, 1.0)]);
        let b = mat(2, 2, &[(0, 0, 1.0), (1, 1, 1.0)]);
        let c = Mutex::new(SparseMatrix::with_capacity(1, 2, 1));

        let result = multiply_row(0, &a, &b, &c);

        assert!(matches!(result, Err(Error::CapacityExceeded { capacity: 1 })));
    }

    #[test]
    fn sharded_matches_locked() {
        let a = mat(
            3,
            3,
            &[(0, 0, 1.0), (0, 2, 2.0), (1, 1, 3.0), (2, 0, 4.0), (0, 0, 0.5)],
        );
        let b = mat(3, 2, &[(0, 0, 1.0), (1, 1, 2.0), (2, 0, 3.0), (2, 1, -1.0)]);
        let a_rows = RowIndex::new(&a);
        let b_rows = RowIndex::new(&b);

        for row in 0..a.rows() {
            let locked = Mutex::new(SparseMatrix::with_capacity(3, 2, a.nnz() * b.nnz()));
            multiply_row(row, &a, &b, &locked).unwrap();
            let locked = locked.into_inner().unwrap();

            let sharded = multiply_row_sharded(row, &a, &a_rows, &b, &b_rows);
            assert_eq!(sharded.len(), locked.nnz());
            for entry in &sharded {
                let other = locked
                    .entries()
                    .iter()
                    .find(|e| e.col == entry.col)
                    .unwrap();
                assert_eq!(other.row, row);
                assert_relative_eq!(other.value, entry.value);
            }
        }
    }

    #[test]
    fn row_index_lists_positions() {
        let a = mat(3, 3, &[(2, 0, 1.0), (0, 1, 1.0), (2, 2, 1.0)]);
        let index = RowIndex::new(&a);
        assert_eq!(index.row(0), &[1]);
        assert!(index.row(1).is_empty());
        assert_eq!(index.row(2), &[0, 2]);
        assert!(index.row(7).is_empty());
        assert_eq!(index.occupied().collect::<Vec<_>>(), vec![2, 0]);
    }

    #[test]
    fn row_index_is_sized_by_entries() {
        let tall = mat(1_000_000_000, 2, &[(999_999_999, 1, 1.0), (5, 0, 2.0)]);
        let index = RowIndex::new(&tall);
        assert_eq!(index.occupied().count(), 2);
        assert_eq!(index.row(999_999_999), &[0]);
        assert_eq!(index.row(5), &[1]);
    }
}
