//! Coordinate list (COO) storage shared by the generator, the multiplication
//! routines and the display helpers.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One stored value of a sparse matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub row: usize,
    pub col: usize,
    pub value: f64,
}

impl Entry {
    pub fn new(row: usize, col: usize, value: f64) -> Self {
        Self { row, col, value }
    }
}

/// Sparse matrix as an unordered list of `(row, col, value)` triplets.
///
/// Entries are only ever appended. Duplicate coordinates are allowed and mean
/// the sum of their values. The number of entries never exceeds `capacity`;
/// storage grows on demand up to that bound rather than being reserved
/// upfront, since the bound for a product can be very large.
///
/// Deserialized matrices are rebuilt through [`SparseMatrix::append`], so
/// they are held to the same bounds and capacity checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawSparseMatrix")]
pub struct SparseMatrix {
    rows: usize,
    cols: usize,
    capacity: usize,
    entries: Vec<Entry>,
}

/// Unchecked wire form of [`SparseMatrix`].
#[derive(Deserialize)]
struct RawSparseMatrix {
    rows: usize,
    cols: usize,
    capacity: usize,
    entries: Vec<Entry>,
}

impl TryFrom<RawSparseMatrix> for SparseMatrix {
    type Error = Error;

    fn try_from(raw: RawSparseMatrix) -> Result<Self> {
        let mut mat = Self::with_capacity(raw.rows, raw.cols, raw.capacity);
        for e in raw.entries {
            mat.append(e.row, e.col, e.value)?;
        }
        Ok(mat)
    }
}

impl SparseMatrix {
    /// Empty matrix with no practical limit on the number of entries.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::with_capacity(rows, cols, usize::MAX)
    }

    /// Empty matrix that accepts at most `capacity` entries.
    pub fn with_capacity(rows: usize, cols: usize, capacity: usize) -> Self {
        Self {
            rows,
            cols,
            capacity,
            entries: Vec::new(),
        }
    }

    /// Builds a matrix from `(row, col, value)` triplets, checking each one
    /// against the shape.
    pub fn from_triplets<I>(rows: usize, cols: usize, triplets: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut mat = Self::new(rows, cols);
        for (row, col, value) in triplets {
            mat.append(row, col, value)?;
        }
        Ok(mat)
    }

    /// Stores a new entry in the next free slot.
    pub fn append(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.entries.len() == self.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.entries.push(Entry { row, col, value });
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of populated entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// In place access for the product merge step, which owns the
    /// search-then-update logic.
    pub(crate) fn entries_mut(&mut self) -> &mut [Entry] {
        &mut self.entries
    }
}
