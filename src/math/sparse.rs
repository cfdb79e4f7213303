//! Sparse storage for the global stiffness system
//!
//! Element blocks are scattered into a triplet list, converted once to CSR and
//! factorized in a variable band (skyline) profile. Frame stiffness matrices
//! are mostly empty, so only the profile below the diagonal is ever stored.

use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use thiserror::Error;

use super::Mat6;

/// Triplet accumulator for the global matrix
///
/// Duplicate entries are summed on conversion.
pub struct SparseMatrixBuilder {
    coo: CooMatrix<f64>,
}

impl SparseMatrixBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            coo: CooMatrix::new(size, size),
        }
    }

    /// Accumulate a single value; exact zeros are skipped
    #[inline]
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        if value.abs() > 1e-15 {
            self.coo.push(row, col, value);
        }
    }

    /// Scatter a 6x6 node block at (`row`, `col`)
    #[inline]
    pub fn add_block(&mut self, row: usize, col: usize, block: &Mat6) {
        for (j, column) in block.column_iter().enumerate() {
            for (i, &value) in column.iter().enumerate() {
                self.add(row + i, col + j, value);
            }
        }
    }

    pub fn to_csr(&self) -> CsrMatrix<f64> {
        CsrMatrix::from(&self.coo)
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        DMatrix::from(&self.coo)
    }

    /// Number of stored triplets, duplicates included
    pub fn nnz(&self) -> usize {
        self.coo.nnz()
    }

    /// Fraction of the full matrix that holds no triplet
    pub fn sparsity(&self) -> f64 {
        let full = (self.coo.nrows() * self.coo.ncols()) as f64;
        if full == 0.0 {
            0.0
        } else {
            1.0 - self.coo.nnz() as f64 / full
        }
    }
}

/// Square sub-matrix on a subset of DOFs
///
/// `map[i]` is the new index of DOF `i`, or `None` when the DOF is dropped.
pub fn submatrix(csr: &CsrMatrix<f64>, map: &[Option<usize>], size: usize) -> CsrMatrix<f64> {
    let mut coo = CooMatrix::new(size, size);
    for (row, col, &val) in csr.triplet_iter() {
        if let (Some(r), Some(c)) = (map[row], map[col]) {
            coo.push(r, c, val);
        }
    }
    CsrMatrix::from(&coo)
}

pub fn csr_to_dense(csr: &CsrMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from(csr)
}

/// Pivot breakdown during Cholesky factorization
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("non-positive pivot {pivot:e} at equation {equation}")]
pub struct PivotFailure {
    /// Equation (row) index in the factorized matrix
    pub equation: usize,
    pub pivot: f64,
}

/// In-place L·Lᵀ factorization of a symmetric positive definite matrix
///
/// Row `i` of the lower triangle is stored contiguously in `values`, from its
/// first structural non-zero up to and including the diagonal.
pub struct SparseCholeskySolver {
    values: Vec<f64>,
    // Row i occupies values[row_start[i]..row_start[i + 1]]
    row_start: Vec<usize>,
    tolerance: f64,
}

impl SparseCholeskySolver {
    pub fn new(csr: &CsrMatrix<f64>) -> Self {
        let n = csr.nrows();

        let mut first: Vec<usize> = (0..n).collect();
        for (row, col, _) in csr.triplet_iter() {
            if col < first[row] {
                first[row] = col;
            }
        }

        let mut row_start = Vec::with_capacity(n + 1);
        row_start.push(0);
        for (i, &f) in first.iter().enumerate() {
            let next = row_start[i] + (i - f + 1);
            row_start.push(next);
        }

        let mut values = vec![0.0; row_start[n]];
        for (row, col, &val) in csr.triplet_iter() {
            if col <= row {
                values[row_start[row] + col - first[row]] += val;
            }
        }

        Self {
            values,
            row_start,
            tolerance: 1e-10,
        }
    }

    /// Relative pivot tolerance
    ///
    /// A pivot is rejected when it is not larger than `tolerance` times the
    /// original diagonal entry of its row.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Number of stored profile entries
    pub fn profile(&self) -> usize {
        self.values.len()
    }

    fn size(&self) -> usize {
        self.row_start.len() - 1
    }

    #[inline]
    fn first_col(&self, row: usize) -> usize {
        row + 1 - (self.row_start[row + 1] - self.row_start[row])
    }

    pub fn factorize(&mut self) -> Result<(), PivotFailure> {
        for i in 0..self.size() {
            let fi = self.first_col(i);
            let starts = &self.row_start;
            let (done, rest) = self.values.split_at_mut(starts[i]);
            let row_i = &mut rest[..i - fi + 1];

            for j in fi..i {
                let row_j = &done[starts[j]..starts[j + 1]];
                let fj = j + 1 - row_j.len();
                let from = fi.max(fj);
                let dot: f64 = row_i[from - fi..j - fi]
                    .iter()
                    .zip(&row_j[from - fj..j - fj])
                    .map(|(a, b)| a * b)
                    .sum();
                let l_jj = row_j[j - fj];
                row_i[j - fi] = (row_i[j - fi] - dot) / l_jj;
            }

            let (off_diag, diag) = row_i.split_at_mut(i - fi);
            let a_ii = diag[0];
            let pivot = a_ii - off_diag.iter().map(|l| l * l).sum::<f64>();
            if !pivot.is_finite() || pivot <= self.tolerance * a_ii.abs() {
                return Err(PivotFailure { equation: i, pivot });
            }
            diag[0] = pivot.sqrt();
        }
        Ok(())
    }

    /// Solve L·Lᵀ·x = b with the factorized profile
    pub fn solve(&self, b: &DVector<f64>) -> DVector<f64> {
        let n = self.size();
        let mut x = b.clone();

        for i in 0..n {
            let fi = self.first_col(i);
            let row = &self.values[self.row_start[i]..self.row_start[i + 1]];
            let (off_diag, diag) = row.split_at(i - fi);
            let dot: f64 = off_diag.iter().zip(x.rows_range(fi..i).iter()).map(|(l, y)| l * y).sum();
            x[i] = (x[i] - dot) / diag[0];
        }

        for i in (0..n).rev() {
            let fi = self.first_col(i);
            let row = &self.values[self.row_start[i]..self.row_start[i + 1]];
            let (off_diag, diag) = row.split_at(i - fi);
            x[i] /= diag[0];
            let xi = x[i];
            for (k, l) in off_diag.iter().enumerate() {
                x[fi + k] -= l * xi;
            }
        }

        x
    }
}

/// y = A·x for a CSR matrix
pub fn csr_matvec(csr: &CsrMatrix<f64>, x: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        csr.nrows(),
        csr.row_iter().map(|row| {
            row.col_indices()
                .iter()
                .zip(row.values())
                .map(|(&col, &val)| val * x[col])
                .sum::<f64>()
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Spring chain with a gap in the band between DOF 0 and DOF 3
    fn chain() -> SparseMatrixBuilder {
        let mut builder = SparseMatrixBuilder::new(4);
        for (i, j) in [(0, 1), (1, 2), (0, 3)] {
            builder.add(i, i, 2.0);
            builder.add(j, j, 2.0);
            builder.add(i, j, -1.0);
            builder.add(j, i, -1.0);
        }
        builder.add(2, 2, 1.0);
        builder
    }

    #[test]
    fn duplicate_triplets_are_summed() {
        let mut builder = SparseMatrixBuilder::new(4);
        builder.add(0, 0, 4.0);
        builder.add(0, 0, 1.0);
        builder.add(3, 3, 1.0);
        builder.add(2, 2, 0.0);

        assert_eq!(builder.nnz(), 3);
        assert_relative_eq!(builder.to_dense()[(0, 0)], 5.0);
        assert_relative_eq!(csr_to_dense(&builder.to_csr())[(0, 0)], 5.0);
        assert_relative_eq!(builder.sparsity(), 1.0 - 3.0 / 16.0);
    }

    #[test]
    fn profile_covers_band_gaps() {
        let solver = SparseCholeskySolver::new(&chain().to_csr());
        // Rows hold 1, 2, 2 and 4 entries; row 3 reaches back to column 0
        assert_eq!(solver.profile(), 9);
    }

    #[test]
    fn factorized_solve_matches_matrix() {
        let csr = chain().to_csr();
        let b = DVector::from_vec(vec![1.0, -2.0, 3.0, 0.5]);

        let mut solver = SparseCholeskySolver::new(&csr);
        solver.factorize().unwrap();
        let x = solver.solve(&b);

        assert!((csr_matvec(&csr, &x) - &b).norm() < 1e-12);
        let dense = csr_to_dense(&csr).lu().solve(&b).unwrap();
        for i in 0..4 {
            assert_relative_eq!(x[i], dense[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn singular_matrix_reports_pivot() {
        let mut builder = SparseMatrixBuilder::new(2);
        builder.add(0, 0, 1.0);
        builder.add(0, 1, -1.0);
        builder.add(1, 0, -1.0);
        builder.add(1, 1, 1.0);

        let mut solver = SparseCholeskySolver::new(&builder.to_csr());
        let err = solver.factorize().unwrap_err();
        assert_eq!(err.equation, 1);
    }

    #[test]
    fn submatrix_drops_unmapped_dofs() {
        let csr = chain().to_csr();
        let sub = csr_to_dense(&submatrix(&csr, &[Some(0), None, Some(1), None], 2));
        assert_relative_eq!(sub[(0, 0)], 4.0);
        assert_relative_eq!(sub[(0, 1)], 0.0);
        assert_relative_eq!(sub[(1, 1)], 3.0);
    }
}
