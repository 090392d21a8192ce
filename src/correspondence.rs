//! Correspondence matrix and standardized residuals
//!
//! The indicator matrix `X` is turned into a joint probability table `Z = X / sum(X)`. Its
//! marginals are the row masses `r` and the column masses `c`, and the deviation from
//! independence, scaled by the inverse square roots of the masses, is the standardized residual
//! matrix `D_r (Z - r c^T) D_c` which gets decomposed afterwards.
//!
//! Masses are regularized by machine epsilon before inversion. A row or column without any
//! counts therefore does not fail, but receives a scaling factor of `1 / eps`.
use std::ops::Mul;

use linfa::Float;
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};
use sprs::CsMat;

use crate::error::{McaError, Result};
use crate::utils::outer;

/// Diagonal matrix `diag(1 / (eps + sqrt(m)))` of a mass vector `m`
///
/// The scaling is either kept as a dense vector or as a sparse diagonal matrix. The latter is
/// used by the truncated solver, which targets wide tables.
#[derive(Debug, Clone)]
pub enum DiagonalScaling<F> {
    Dense(Array1<F>),
    Sparse(CsMat<F>),
}

impl<F: Float> DiagonalScaling<F> {
    pub fn from_masses(masses: &Array1<F>, sparse: bool) -> Self {
        let diag = inverse_sqrt(masses);

        if sparse {
            let n = diag.len();
            let indptr = (0..=n).collect::<Vec<_>>();
            let indices = (0..n).collect::<Vec<_>>();

            DiagonalScaling::Sparse(CsMat::new((n, n), indptr, indices, diag.to_vec()))
        } else {
            DiagonalScaling::Dense(diag)
        }
    }

    /// Entries on the diagonal
    pub fn diag(&self) -> Array1<F> {
        match self {
            DiagonalScaling::Dense(diag) => diag.clone(),
            DiagonalScaling::Sparse(mat) => {
                let mut diag = Array1::zeros(mat.rows());
                for (val, (row, col)) in mat.iter() {
                    if row == col {
                        diag[row] = *val;
                    }
                }

                diag
            }
        }
    }

    /// Left-multiplies `rhs` with the diagonal matrix
    pub fn dot(&self, rhs: &ArrayView2<F>) -> Array2<F> {
        match self {
            DiagonalScaling::Dense(diag) => rhs * &diag.view().insert_axis(Axis(1)),
            DiagonalScaling::Sparse(mat) => mat.mul(rhs),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, DiagonalScaling::Sparse(_))
    }
}

fn inverse_sqrt<F: Float>(masses: &Array1<F>) -> Array1<F> {
    masses.mapv(|m| (F::epsilon() + m.sqrt()).recip())
}

/// Correspondence matrix of an indicator table together with its masses
#[derive(Debug, Clone)]
pub struct CorrespondenceMatrix<F> {
    total: F,
    row_masses: Array1<F>,
    col_masses: Array1<F>,
    row_scaling: DiagonalScaling<F>,
    col_scaling: Array1<F>,
    residuals: Array2<F>,
}

impl<F: Float> CorrespondenceMatrix<F> {
    /// Computes masses and standardized residuals of an indicator matrix
    ///
    /// # Parameters
    ///
    /// * `x`: non-negative indicator or count matrix
    /// * `sparse`: keep the row scaling as a sparse diagonal matrix
    pub fn new<D: Data<Elem = F>>(x: &ArrayBase<D, Ix2>, sparse: bool) -> Result<Self> {
        let total = x.sum();
        if !(total > F::zero()) {
            return Err(McaError::ZeroTotalCount);
        }

        let z = x.mapv(|v| v / total);
        let row_masses = z.sum_axis(Axis(1));
        let col_masses = z.sum_axis(Axis(0));

        let empty_rows = row_masses.iter().filter(|m| **m == F::zero()).count();
        let empty_cols = col_masses.iter().filter(|m| **m == F::zero()).count();
        if empty_rows > 0 || empty_cols > 0 {
            warn!(
                "{} rows and {} columns have zero mass, their scaling is regularized by machine epsilon",
                empty_rows, empty_cols
            );
        }

        let row_scaling = DiagonalScaling::from_masses(&row_masses, sparse);
        let col_scaling = inverse_sqrt(&col_masses);

        let centered = z - outer(&row_masses, &col_masses);
        let mut residuals = row_scaling.dot(&centered.view());
        residuals *= &col_scaling;

        debug!(
            "correspondence matrix of shape {:?} with total count {}",
            residuals.dim(),
            total
        );

        Ok(CorrespondenceMatrix {
            total,
            row_masses,
            col_masses,
            row_scaling,
            col_scaling,
            residuals,
        })
    }

    /// Sum of all entries of the indicator matrix
    pub fn total(&self) -> F {
        self.total
    }

    pub fn row_masses(&self) -> &Array1<F> {
        &self.row_masses
    }

    pub fn col_masses(&self) -> &Array1<F> {
        &self.col_masses
    }

    /// `D_r`
    pub fn row_scaling(&self) -> &DiagonalScaling<F> {
        &self.row_scaling
    }

    /// Diagonal of `D_c`
    pub fn col_scaling(&self) -> &Array1<F> {
        &self.col_scaling
    }

    /// Standardized residual matrix `D_r (Z - r c^T) D_c`
    pub fn residuals(&self) -> ArrayView2<F> {
        self.residuals.view()
    }

    pub(crate) fn into_parts(self) -> (Array1<F>, Array1<F>, DiagonalScaling<F>, Array1<F>) {
        (
            self.row_masses,
            self.col_masses,
            self.row_scaling,
            self.col_scaling,
        )
    }
}
