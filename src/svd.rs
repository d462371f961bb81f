use faer::Mat;
use nalgebra::{DMatrix, DVector};

use crate::error::Error;

/// Full singular value decomposition of one channel matrix, kept around so
/// that approximations of different ranks only cost a product of slices.
#[derive(Clone, Debug)]
pub struct ChannelDecomposition {
    u: DMatrix<f64>,
    singular_values: DVector<f64>,
    v_t: DMatrix<f64>,
}

impl ChannelDecomposition {
    /// Decomposes `matrix` with the thin SVD of faer, reordered so that the
    /// singular values descend.
    pub fn new(matrix: DMatrix<f64>) -> crate::Result<Self> {
        if matrix.is_empty() {
            return Err(Error::EmptyImage);
        }
        let (rows, columns) = matrix.shape();
        let rank = rows.min(columns);
        let svd = Mat::<f64>::from_fn(rows, columns, |row, column| matrix[(row, column)])
            .thin_svd();
        let (u, sigma, v) = (svd.u(), svd.s_diagonal(), svd.v());

        let mut order: Vec<usize> = (0..rank).collect();
        order.sort_by(|a, b| sigma.read(*b).total_cmp(&sigma.read(*a)));
        let singular_values = DVector::from_iterator(rank, order.iter().map(|i| sigma.read(*i)));
        if singular_values.iter().any(|sigma| !sigma.is_finite()) {
            return Err(Error::DecompositionFailed("matrix"));
        }
        Ok(Self {
            u: DMatrix::from_fn(rows, rank, |row, k| u.read(row, order[k])),
            singular_values,
            v_t: DMatrix::from_fn(rank, columns, |k, column| v.read(column, order[k])),
        })
    }

    pub fn max_rank(&self) -> usize {
        self.singular_values.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.u.nrows(), self.v_t.ncols())
    }

    /// Singular values in descending order.
    pub fn singular_values(&self) -> &[f64] {
        self.singular_values.as_slice()
    }

    /// Best rank-`rank` approximation in the Frobenius norm:
    /// `U[:, :k] * diag(S[:k]) * Vt[:k, :]`.
    pub fn approximate(&self, rank: usize) -> crate::Result<DMatrix<f64>> {
        check_rank(rank, self.max_rank())?;
        let mut left = self.u.columns(0, rank).into_owned();
        for (mut column, sigma) in left.column_iter_mut().zip(self.singular_values.iter()) {
            column *= *sigma;
        }
        Ok(left * self.v_t.rows(0, rank))
    }
}

pub fn check_rank(rank: usize, max_rank: usize) -> crate::Result<()> {
    if rank == 0 || rank > max_rank {
        return Err(Error::InvalidRank { rank, max_rank });
    }
    Ok(())
}

/// One-shot variant of [`ChannelDecomposition::approximate`]. Prefer keeping
/// the decomposition when several ranks are evaluated on the same matrix.
pub fn approximate(matrix: &DMatrix<f64>, rank: usize) -> crate::Result<DMatrix<f64>> {
    check_rank(rank, matrix.nrows().min(matrix.ncols()))?;
    ChannelDecomposition::new(matrix.clone())?.approximate(rank)
}
