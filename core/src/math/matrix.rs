use crate::prelude::{TrackError, TrackResult};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, ArrayView1, ArrayView2};

/// Singular values below this fraction of the largest one are treated as zero.
const RANK_TOLERANCE: f64 = 1e-12;
const MAX_SVD_ITERATIONS: usize = 1_000;

/// Solution of a linear least-squares problem.
#[derive(Debug, Clone)]
pub struct LeastSquares {
    pub x: Array1<f64>,
    /// Sum of squared residuals `|a x - b|^2`.
    pub residual: f64,
    pub rank: usize,
}

pub struct MatrixHelper;

impl MatrixHelper {
    pub fn to_dmatrix(m: ArrayView2<f64>) -> DMatrix<f64> {
        let (rows, cols) = m.dim();
        DMatrix::from_fn(rows, cols, |i, j| m[[i, j]])
    }

    /// Minimum-norm least-squares solution of `a x = b`.
    ///
    /// Solved through the SVD of `a`; rank-deficient systems drop the null
    /// directions and return the solution with the smallest norm.
    pub fn least_squares(a: ArrayView2<f64>, b: ArrayView1<f64>) -> TrackResult<LeastSquares> {
        let lhs = Self::to_dmatrix(a);
        let rhs = DVector::from_iterator(b.len(), b.iter().copied());

        let svd = lhs
            .try_svd(true, true, f64::EPSILON, MAX_SVD_ITERATIONS)
            .ok_or_else(|| TrackError::Numerical("SVD did not converge".into()))?;
        let largest = svd.singular_values.iter().fold(0.0_f64, |acc, v| acc.max(*v));
        let cutoff = largest * RANK_TOLERANCE;
        let rank = svd.singular_values.iter().filter(|&&v| v > cutoff).count();

        let solution = svd
            .solve(&rhs, cutoff)
            .map_err(|err| TrackError::Numerical(err.to_string()))?;
        let x = Array1::from_iter(solution.iter().copied());

        let diff = a.dot(&x) - &b;
        let residual = diff.dot(&diff);
        Ok(LeastSquares { x, residual, rank })
    }
}
