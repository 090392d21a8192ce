//! Eigenvalue corrections
//!
//! Dummy coding `K` categorical variables inflates the total inertia of the indicator matrix and
//! lets the principal inertias look artificially small. The Benzécri correction rescales the
//! eigenvalues above the average `1 / K` and discards the rest, the Greenacre correction adjusts
//! the total inertia for the off-diagonal blocks of the Burt table.
use linfa::Float;
use ndarray::{Array1, ArrayView1};

/// Benzécri corrected eigenvalues
///
/// Every squared singular value `e` larger than `1 / K` is replaced by
/// `(K / (K - 1) * (e - 1 / K))^2`, all others by zero. With less than two variables no
/// eigenvalue survives the correction.
pub fn benzecri<F: Float>(singular_values: &Array1<F>, n_variables: usize) -> Array1<F> {
    if n_variables < 2 {
        return Array1::zeros(singular_values.len());
    }

    let k = F::cast(n_variables);
    let inv_k = k.recip();
    let factor = k / (k - F::one());

    singular_values.mapv(|s| {
        let e = s * s;
        if e > inv_k {
            (factor * (e - inv_k)).powi(2)
        } else {
            F::zero()
        }
    })
}

/// Total inertia after Greenacre's adjustment
///
/// `K / (K - 1) * (sum(s^4) - (J - K) / K^2)`, undefined for less than two variables.
pub fn greenacre_inertia<F: Float>(
    singular_values: &Array1<F>,
    n_variables: usize,
    n_columns: usize,
) -> F {
    let k = F::cast(n_variables);
    let j = F::cast(n_columns);
    let fourth_powers = singular_values.iter().map(|s| s.powi(4)).sum::<F>();

    k / (k - F::one()) * (fourth_powers - (j - k) / (k * k))
}

/// Number of leading eigenvalues above the tolerance
///
/// The rank ends at the first eigenvalue below `tol`. If no eigenvalue falls below, or already
/// the first one does, all eigenvalues are kept.
pub fn numerical_rank<F: Float>(eigenvalues: &Array1<F>, tol: F) -> usize {
    match eigenvalues.iter().position(|e| *e < tol) {
        Some(0) | None => eigenvalues.len(),
        Some(idx) => idx,
    }
}

/// Smallest number of leading inertias whose cumulative sum reaches `percent` of their total
pub fn retained_dimensions<F: Float>(inertias: ArrayView1<F>, percent: F) -> usize {
    let threshold = inertias.sum() * percent;

    let mut cumulative = F::zero();
    inertias
        .iter()
        .position(|l| {
            cumulative += *l;
            cumulative >= threshold
        })
        .map(|idx| idx + 1)
        .unwrap_or_else(|| inertias.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn benzecri_correction() {
        let s = array![3f64.sqrt() / 2., 0.5, 0.0];
        assert_abs_diff_eq!(benzecri(&s, 2), array![0.25, 0.0, 0.0], epsilon = 1e-12);

        // 1 / K = 0.25, the boundary itself is discarded
        let s = array![0.8, 0.5, 0.3];
        let k: f64 = 4.0 / 3.0;
        assert_abs_diff_eq!(
            benzecri(&s, 4),
            array![(k * (0.64 - 0.25)).powi(2), 0.0, 0.0],
            epsilon = 1e-12
        );
    }

    #[test]
    fn benzecri_single_variable_is_zero() {
        let s = array![0.9, 0.4];
        assert_abs_diff_eq!(benzecri(&s, 1), array![0.0, 0.0]);
        assert_abs_diff_eq!(benzecri(&s, 0), array![0.0, 0.0]);
    }

    #[test]
    fn greenacre_adjusted_inertia() {
        let s = array![3f64.sqrt() / 2., 0.5, 0.0];
        // 2 * (9/16 + 1/16 - 2/4)
        assert_abs_diff_eq!(greenacre_inertia(&s, 2, 4), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn rank_stops_at_first_small_eigenvalue() {
        assert_eq!(numerical_rank(&array![0.5, 0.2, 1e-6, 0.1], 1e-4), 2);
        assert_eq!(numerical_rank(&array![0.5, 0.2, 0.1], 1e-4), 3);
        assert_eq!(numerical_rank(&array![1e-6, 0.2], 1e-4), 2);
        assert_eq!(numerical_rank(&array![0.5, 0.2], 0.3), 1);
    }

    #[test]
    fn retained_dimensions_by_cumulative_inertia() {
        let l = array![0.5, 0.3, 0.15, 0.05];

        assert_eq!(retained_dimensions(l.view(), 0.0), 1);
        assert_eq!(retained_dimensions(l.view(), 0.4), 1);
        assert_eq!(retained_dimensions(l.view(), 0.7), 2);
        assert_eq!(retained_dimensions(l.view(), 0.85), 3);
        assert_eq!(retained_dimensions(l.view(), 0.99), 4);
        assert_eq!(retained_dimensions(l.view(), 1.0), 4);
    }
}
