//! Singular value decomposition of the standardized residuals
//!
//! Two solvers are available. The full decomposition computes every singular triplet with a dense
//! SVD routine, the truncated decomposition only the leading triplets with LOBPCG. Both return
//! the singular values in descending order and keep the singular vectors aligned with them.
use std::cmp::Ordering;

use linfa::dataset::{WithLapack, WithoutLapack};
use linfa::Float;
#[cfg(not(feature = "blas"))]
use linfa_linalg::lobpcg::{Order as TruncatedOrder, TruncatedSvd};
#[cfg(not(feature = "blas"))]
use linfa_linalg::svd::*;
use log::{debug, trace};
use ndarray::{s, Array1, Array2, ArrayView2, Axis};
#[cfg(feature = "blas")]
use ndarray_linalg::{svd::*, TruncatedOrder, TruncatedSvd};
#[cfg(not(feature = "blas"))]
use rand::SeedableRng;
#[cfg(not(feature = "blas"))]
use rand_xoshiro::Xoshiro256Plus;

use crate::error::{McaError, Result};

/// Singular triplets `(P, s, Q)` of a matrix `A = P diag(s) Q`
///
/// The left singular vectors are stored as columns of `P`, the right singular vectors as rows of
/// `Q`. A full decomposition keeps the complete orthogonal bases, so `P` and `Q` may have more
/// columns, respectively rows, than there are singular values.
#[derive(Debug, Clone, PartialEq)]
pub struct SvdTriple<F> {
    pub(crate) p: Array2<F>,
    pub(crate) s: Array1<F>,
    pub(crate) q: Array2<F>,
}

impl<F: Float> SvdTriple<F> {
    /// Computes all singular triplets of `matrix`
    pub fn full(matrix: ArrayView2<F>) -> Result<Self> {
        let (nrows, ncols) = matrix.dim();
        trace!("full singular value decomposition of {}x{} matrix", nrows, ncols);

        // decompose the tall orientation and swap the factors back afterwards
        let triple = if nrows < ncols {
            let SvdTriple { p, s, q } = Self::dense_svd(matrix.t())?;
            SvdTriple {
                p: q.reversed_axes(),
                s,
                q: p.reversed_axes(),
            }
        } else {
            Self::dense_svd(matrix)?
        };

        Ok(triple.sort_descending())
    }

    fn dense_svd(matrix: ArrayView2<F>) -> Result<Self> {
        let matrix = matrix.to_owned().with_lapack();

        #[cfg(feature = "blas")]
        let (u, s, vt) = matrix.svd(true, true)?;
        #[cfg(not(feature = "blas"))]
        let (u, s, vt) = matrix.svd(true, true)?.sort_svd_desc();

        let u = u.ok_or(McaError::MissingSingularVectors)?;
        let vt = vt.ok_or(McaError::MissingSingularVectors)?;

        let p: Array2<F> = u.without_lapack();
        let q: Array2<F> = vt.without_lapack();
        let s = s.mapv(F::cast);

        Ok(SvdTriple { p, s, q })
    }

    /// Computes the leading `n_triplets` singular triplets of `matrix`
    ///
    /// The number of triplets is clamped to `1..min(nrows, ncols)`. Matrices which are too small
    /// for the iterative solver to converge reliably are decomposed fully and truncated afterwards.
    /// LOBPCG is only used when `min(nrows, ncols) >= 5 * n_triplets + 1`, so asking for every
    /// triplet always falls back to the dense solver.
    pub fn truncated(matrix: ArrayView2<F>, n_triplets: usize) -> Result<Self> {
        let (nrows, ncols) = matrix.dim();
        let min_dim = nrows.min(ncols);
        if min_dim < 2 {
            return Err(McaError::TooSmallForTruncation(nrows, ncols));
        }

        let n_triplets = n_triplets.clamp(1, min_dim - 1);

        if min_dim < 5 * n_triplets + 1 {
            debug!(
                "matrix of shape {}x{} too small for LOBPCG with {} triplets, use dense solver",
                nrows, ncols, n_triplets
            );
            return Ok(Self::full(matrix)?.truncate(n_triplets));
        }

        trace!(
            "truncated singular value decomposition of {}x{} matrix with {} triplets",
            nrows,
            ncols,
            n_triplets
        );

        // the pure Rust LOBPCG is only magnitude corrected for concrete floats
        #[cfg(not(feature = "blas"))]
        let (p, s, q) = {
            let result = TruncatedSvd::new_with_rng(
                matrix.mapv(|x| <f64 as Float>::cast(x)),
                TruncatedOrder::Largest,
                Xoshiro256Plus::seed_from_u64(42),
            )
            .decompose(n_triplets)?;

            let (u, s, vt) = result.values_vectors();
            (u.mapv(F::cast), s.mapv(F::cast), vt.mapv(F::cast))
        };
        #[cfg(feature = "blas")]
        let (p, s, q) = {
            let result =
                TruncatedSvd::new(matrix.to_owned().with_lapack(), TruncatedOrder::Largest)
                    .decompose(n_triplets)?;

            let (u, s, vt) = result.values_vectors();
            let p: Array2<F> = u.without_lapack();
            let q: Array2<F> = vt.without_lapack();
            (p, s.mapv(F::cast), q)
        };

        Ok(SvdTriple { p, s, q }.sort_descending())
    }

    /// Keeps the leading `n` triplets
    pub fn truncate(self, n: usize) -> Self {
        let n = n.min(self.s.len());

        SvdTriple {
            p: self.p.slice_move(s![.., ..n]),
            s: self.s.slice_move(s![..n]),
            q: self.q.slice_move(s![..n, ..]),
        }
    }

    /// Reorders the triplets by descending singular value
    ///
    /// Basis vectors without singular value stay in place.
    fn sort_descending(self) -> Self {
        let SvdTriple { p, s, q } = self;

        let mut order = (0..s.len()).collect::<Vec<_>>();
        order.sort_by(|a, b| s[*b].partial_cmp(&s[*a]).unwrap_or(Ordering::Equal));

        if order.iter().enumerate().all(|(i, j)| i == *j) {
            return SvdTriple { p, s, q };
        }

        let s = order.iter().map(|i| s[*i]).collect::<Array1<_>>();
        let p_order = order
            .iter()
            .copied()
            .chain(s.len()..p.ncols())
            .collect::<Vec<_>>();
        let q_order = order
            .iter()
            .copied()
            .chain(s.len()..q.nrows())
            .collect::<Vec<_>>();

        SvdTriple {
            p: p.select(Axis(1), &p_order),
            s,
            q: q.select(Axis(0), &q_order),
        }
    }

    /// Left singular vectors as columns
    pub fn p(&self) -> &Array2<F> {
        &self.p
    }

    /// Singular values in descending order
    pub fn s(&self) -> &Array1<F> {
        &self.s
    }

    /// Right singular vectors as rows
    pub fn q(&self) -> &Array2<F> {
        &self.q
    }

    /// Number of items, the width of the left singular basis
    pub fn n_items(&self) -> usize {
        self.p.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand_xoshiro::Xoshiro256Plus;

    use crate::correspondence::CorrespondenceMatrix;
    use crate::utils::rectangular_diag;

    fn reconstruct(svd: &SvdTriple<f64>) -> Array2<f64> {
        let n = svd.s().len();
        let p = svd.p().slice(s![.., ..n]);
        let q = svd.q().slice(s![..n, ..]);

        p.dot(&rectangular_diag(svd.s().view(), n, n)).dot(&q)
    }

    #[test]
    fn full_reconstructs_matrix() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        for shape in &[(6, 4), (4, 6), (5, 5)] {
            let x = Array2::random_using(*shape, Uniform::new(-1., 1.), &mut rng);
            let svd = SvdTriple::full(x.view()).unwrap();

            assert_eq!(svd.s().len(), shape.0.min(shape.1));
            assert_eq!(svd.p().nrows(), shape.0);
            assert_eq!(svd.q().ncols(), shape.1);
            assert!(svd.s().windows(2).into_iter().all(|w| w[0] >= w[1]));
            assert_abs_diff_eq!(reconstruct(&svd), x, epsilon = 1e-10);
        }
    }

    #[test]
    fn full_of_standardized_residuals() {
        let x = array![[1., 0., 1., 0.], [1., 0., 0., 1.], [0., 1., 0., 1.]];
        let corr = CorrespondenceMatrix::new(&x, false).unwrap();
        let svd = SvdTriple::full(corr.residuals()).unwrap();

        assert_abs_diff_eq!(
            svd.s().view(),
            array![3f64.sqrt() / 2., 0.5, 0.0],
            epsilon = 1e-7
        );
        assert_eq!(svd.n_items(), 3);
    }

    #[test]
    fn truncated_falls_back_to_dense_on_small_matrices() {
        let mut rng = Xoshiro256Plus::seed_from_u64(7);
        let x = Array2::random_using((8, 5), Uniform::new(-1., 1.), &mut rng);

        let full = SvdTriple::full(x.view()).unwrap();
        let truncated = SvdTriple::truncated(x.view(), 2).unwrap();

        assert_eq!(truncated.s().len(), 2);
        assert_eq!(truncated.n_items(), 2);
        assert_eq!(truncated.q().dim(), (2, 5));
        assert_abs_diff_eq!(
            truncated.s().view(),
            full.s().slice(s![..2]),
            epsilon = 1e-12
        );
    }

    #[test]
    fn truncated_clamps_number_of_triplets() {
        let x = Array2::from_shape_fn((4, 3), |(i, j)| (i * 3 + j) as f64 % 5.);

        assert_eq!(SvdTriple::truncated(x.view(), 10).unwrap().s().len(), 2);
        assert_eq!(SvdTriple::truncated(x.view(), 0).unwrap().s().len(), 1);
    }

    #[test]
    fn truncated_matches_full_on_leading_values() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let x = Array2::random_using((120, 40), Uniform::new(0., 1.), &mut rng);
        let corr = CorrespondenceMatrix::new(&x, true).unwrap();

        let full = SvdTriple::full(corr.residuals()).unwrap();
        let truncated = SvdTriple::truncated(corr.residuals(), 3).unwrap();

        assert!(truncated.s().len() <= 3);
        assert!(truncated.s().windows(2).into_iter().all(|w| w[0] >= w[1]));
        for (a, b) in truncated.s().iter().zip(full.s().iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-3);
        }
    }

    #[test]
    fn truncated_lobpcg_in_single_precision() {
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        let x = Array2::random_using((90, 30), Uniform::new(0f32, 1.), &mut rng);
        let corr = CorrespondenceMatrix::new(&x, true).unwrap();

        let full = SvdTriple::full(corr.residuals()).unwrap();
        let truncated = SvdTriple::truncated(corr.residuals(), 2).unwrap();

        assert_eq!(truncated.q().ncols(), 30);
        assert_eq!(truncated.p().nrows(), 90);
        for (a, b) in truncated.s().iter().zip(full.s().iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-2);
        }
    }

    #[test]
    fn truncation_needs_two_dimensions() {
        let x = Array2::<f64>::ones((1, 5));
        assert!(matches!(
            SvdTriple::truncated(x.view(), 1),
            Err(McaError::TooSmallForTruncation(1, 5))
        ));
    }

    #[test]
    fn sorting_keeps_vectors_aligned() {
        let svd = SvdTriple {
            p: array![[1., 0., 0.], [0., 1., 0.], [0., 0., 1.]],
            s: array![1., 3.],
            q: array![[1., 0.], [0., 1.]],
        }
        .sort_descending();

        assert_abs_diff_eq!(svd.s, array![3., 1.]);
        assert_abs_diff_eq!(svd.p, array![[0., 1., 0.], [1., 0., 0.], [0., 0., 1.]]);
        assert_abs_diff_eq!(svd.q, array![[0., 1.], [1., 0.]]);
    }
}
