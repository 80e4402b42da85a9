//! Helpers around the product that don't have a specific home: random inputs,
//! ordered display of results and conversions used to check them.

use std::time::Duration;

use ndarray::Array2;
use rand::Rng;
use sprs::TriMat;

use crate::error::{Error, Result};
use crate::matrix::{Entry, SparseMatrix};
use crate::{CsrMatrix, Matrix};

/// Random `rows x cols` matrix with `nnz` entries at uniformly chosen
/// coordinates (repeats possible) and values uniform in `[0, 1)`.
pub fn random_coo<R: Rng>(
    rows: usize,
    cols: usize,
    nnz: usize,
    rng: &mut R,
) -> Result<SparseMatrix> {
    if nnz > 0 && (rows == 0 || cols == 0) {
        return Err(Error::EmptyShape { rows, cols, nnz });
    }
    let mut mat = SparseMatrix::with_capacity(rows, cols, nnz);
    for _ in 0..nnz {
        let row = rng.gen_range(0..rows);
        let col = rng.gen_range(0..cols);
        let value: f64 = rng.gen();
        mat.append(row, col, value)?;
    }
    Ok(mat)
}

/// Copy of the entries ordered by row, then column.
pub fn sorted_view(mat: &SparseMatrix) -> Vec<Entry> {
    let mut entries = mat.entries().to_vec();
    entries.sort_by_key(|e| (e.row, e.col));
    entries
}

/// Header plus at most `limit` entries in storage order, with a trailing
/// `...` line when some were left out.
pub fn preview(mat: &SparseMatrix, name: &str, limit: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Matrix {} (rows: {}, cols: {}, entries: {}):\n",
        name,
        mat.rows(),
        mat.cols(),
        mat.nnz()
    ));
    for (i, e) in mat.entries().iter().take(limit).enumerate() {
        out.push_str(&format!(
            "  entry {}: row: {}, col: {}, value: {:.2}\n",
            i + 1,
            e.row,
            e.col,
            e.value
        ));
    }
    if mat.nnz() > limit {
        out.push_str("  ...\n");
    }
    out
}

pub fn print_preview(mat: &SparseMatrix, name: &str, limit: usize) {
    print!("{}", preview(mat, name, limit));
}

/// Every entry of `mat` in row-major order.
pub fn print_sorted(mat: &SparseMatrix, name: &str) {
    println!("Matrix {} (rows: {}, cols: {}):", name, mat.rows(), mat.cols());
    for e in sorted_view(mat) {
        println!("  row {} col {}: value {:.2}", e.row, e.col, e.value);
    }
}

/// Dense expansion, duplicate coordinates summed.
pub fn to_dense(mat: &SparseMatrix) -> Matrix {
    let mut dense = Array2::zeros(mat.shape());
    for e in mat.entries() {
        dense[[e.row, e.col]] += e.value;
    }
    dense
}

/// Compressed row copy, used as a reference for checking products.
pub fn to_csr(mat: &SparseMatrix) -> CsrMatrix {
    let mut tri = TriMat::with_capacity(mat.shape(), mat.nnz());
    for e in mat.entries() {
        tri.add_triplet(e.row, e.col, e.value);
    }
    tri.to_csr::<usize>()
}

/// Largest absolute difference between `mat` and a CSR matrix of the same
/// shape.
pub fn max_abs_diff(mat: &SparseMatrix, reference: &CsrMatrix) -> f64 {
    let dense = to_dense(mat);
    let reference = reference.to_dense();
    dense
        .iter()
        .zip(reference.iter())
        .fold(0.0_f64, |acc, (x, y)| acc.max((x - y).abs()))
}

pub fn format_duration(duration: &Duration) -> String {
    let millis = duration.subsec_millis();
    let seconds = duration.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let minutes = minutes % 60;
    let seconds = seconds % 60;

    format!(
        "{} hours, {} minutes, {}.{:03} seconds",
        hours, minutes, seconds, millis
    )
}
