//! Multiple Correspondence Analysis
//!
use linfa::dataset::Records;
use linfa::{traits::Fit, DatasetBase, Float, ParamGuard};
use log::debug;
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix2};

use crate::correction;
use crate::correspondence::{CorrespondenceMatrix, DiagonalScaling};
use crate::decomposition::SvdTriple;
use crate::error::{McaError, Result};
use crate::preprocessing::{CategoricalTable, CodedInput, DummyCoding};
use crate::utils::rectangular_diag;

use super::hyperparams::{McaParams, McaValidParams, SvdSolver};

/// Margin of the indicator matrix a computation refers to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Margin {
    /// Observations
    Rows,
    /// Coded categorical levels
    Columns,
}

/// Fitted Multiple Correspondence Analysis
///
/// The model keeps the masses and the singular value decomposition of the standardized residuals
/// of an indicator matrix. Factor scores are derived on request with a variable number of
/// retained axes and cached, the diagnostics reuse the cached scores when they are wide enough.
///
/// # Example
///
/// ```
/// use linfa::{traits::Fit, DatasetBase};
/// use linfa_mca::{CategoricalTable, Mca};
/// use ndarray::array;
///
/// let table = CategoricalTable::new(
///     vec!["shape".into(), "colour".into()],
///     array![
///         ["round", "red"],
///         ["round", "red"],
///         ["square", "green"],
///         ["square", "red"],
///         ["round", "green"],
///     ]
///     .mapv(String::from),
/// )?;
///
/// let mut mca = Mca::<f64>::params().fit(&DatasetBase::new(table, ()))?;
///
/// let scores = mca.row_factor_scores(0.9, None)?;
/// assert_eq!(scores.nrows(), 5);
/// # Ok::<(), linfa_mca::McaError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Mca<F> {
    pub(super) n_variables: usize,
    pub(super) n_columns: usize,
    pub(super) benzecri: bool,
    pub(super) coding: Option<DummyCoding>,
    pub(super) row_masses: Array1<F>,
    pub(super) col_masses: Array1<F>,
    pub(super) row_scaling: DiagonalScaling<F>,
    pub(super) col_scaling: Array1<F>,
    pub(super) svd: SvdTriple<F>,
    /// Benzécri corrected eigenvalues, independent of the correction setting
    pub(super) corrected: Array1<F>,
    pub(super) eigenvalues: Array1<F>,
    pub(super) inertia: F,
    pub(super) rank: usize,
    pub(super) retained: Option<usize>,
    pub(super) row_scores: Option<Array2<F>>,
    pub(super) col_scores: Option<Array2<F>>,
}

/// Fits the model on an indicator matrix which was coded by the caller
///
/// # Parameters
///
/// * `dataset`: non-negative indicator or count matrix, rows are observations
///
/// # Returns
///
/// The fitted model, or an error if the matrix is empty, contains negative entries or sums to
/// zero, or a column selection was configured
impl<F: Float, D: Data<Elem = F>, T> Fit<ArrayBase<D, Ix2>, T, McaError> for McaValidParams<F> {
    type Object = Mca<F>;

    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        if self.columns().is_some() {
            return Err(McaError::ColumnsRequireTable);
        }

        let input = CodedInput::from_coded(dataset.records(), self.n_cols())?;
        Mca::from_coded(self, input)
    }
}

/// Dummy codes the configured columns of a categorical table and fits the model on them
impl<F: Float, T> Fit<CategoricalTable, T, McaError> for McaValidParams<F> {
    type Object = Mca<F>;

    fn fit(&self, dataset: &DatasetBase<CategoricalTable, T>) -> Result<Self::Object> {
        let input = CodedInput::from_table(dataset.records(), self.columns())?;
        Mca::from_coded(self, input)
    }
}

impl<F: Float> McaValidParams<F> {
    /// Fits the model and computes the factor scores of one margin
    pub fn fit_transform<R: Records, T>(
        &self,
        dataset: &DatasetBase<R, T>,
        percent: F,
        n: Option<usize>,
        margin: Margin,
    ) -> Result<Array2<F>>
    where
        Self: Fit<R, T, McaError, Object = Mca<F>>,
    {
        self.fit(dataset)?.factor_scores(margin, percent, n)
    }
}

impl<F: Float> McaParams<F> {
    /// Checks the parameters, fits the model and computes the factor scores of one margin
    pub fn fit_transform<R: Records, T>(
        &self,
        dataset: &DatasetBase<R, T>,
        percent: F,
        n: Option<usize>,
        margin: Margin,
    ) -> Result<Array2<F>>
    where
        McaValidParams<F>: Fit<R, T, McaError, Object = Mca<F>>,
    {
        self.check_ref()?.fit_transform(dataset, percent, n, margin)
    }
}

pub(super) fn positive_factors(n: Option<usize>) -> Result<Option<usize>> {
    match n {
        Some(0) => Err(McaError::NonPositiveFactors),
        n => Ok(n),
    }
}

impl<F: Float> Mca<F> {
    pub(crate) fn from_coded(params: &McaValidParams<F>, input: CodedInput<F>) -> Result<Self> {
        let CodedInput {
            indicator,
            n_variables,
            coding,
        } = input;
        let n_columns = indicator.ncols();

        debug!(
            "fit MCA on {} observations with {} variables coded into {} columns, solver {:?}",
            indicator.nrows(),
            n_variables,
            n_columns,
            params.solver()
        );

        let sparse = params.solver() == SvdSolver::Truncated;
        let correspondence = CorrespondenceMatrix::new(&indicator, sparse)?;

        let svd = match params.solver() {
            SvdSolver::Full => SvdTriple::full(correspondence.residuals())?,
            SvdSolver::Truncated => {
                let (nrows, ncols) = correspondence.residuals().dim();
                let n_triplets = params
                    .n_cols()
                    .unwrap_or_else(|| nrows.min(ncols).saturating_sub(1));

                SvdTriple::truncated(correspondence.residuals(), n_triplets)?
            }
        };
        let (row_masses, col_masses, row_scaling, col_scaling) = correspondence.into_parts();

        let corrected = correction::benzecri(svd.s(), n_variables);
        let eigenvalues = if params.benzecri() {
            corrected.clone()
        } else {
            svd.s().mapv(|s| s * s)
        };
        let inertia = eigenvalues.sum();
        let rank = correction::numerical_rank(&eigenvalues, params.tolerance());

        debug!(
            "{} singular triplets, rank {} with total inertia {}",
            svd.s().len(),
            rank,
            inertia
        );

        Ok(Mca {
            n_variables,
            n_columns,
            benzecri: params.benzecri(),
            coding,
            row_masses,
            col_masses,
            row_scaling,
            col_scaling,
            svd,
            corrected,
            eigenvalues,
            inertia,
            rank,
            retained: None,
            row_scores: None,
            col_scores: None,
        })
    }

    /// Number of categorical variables before coding (`K`)
    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    /// Number of coded columns (`J`)
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    pub fn row_masses(&self) -> &Array1<F> {
        &self.row_masses
    }

    pub fn column_masses(&self) -> &Array1<F> {
        &self.col_masses
    }

    /// Singular values of the standardized residuals in descending order
    pub fn singular_values(&self) -> &Array1<F> {
        self.svd.s()
    }

    /// Left singular vectors `P` as columns
    pub fn left_singular_vectors(&self) -> &Array2<F> {
        self.svd.p()
    }

    /// Right singular vectors `Q` as rows
    pub fn right_singular_vectors(&self) -> &Array2<F> {
        self.svd.q()
    }

    /// Eigenvalues, Benzécri corrected if enabled and squared singular values otherwise
    pub fn eigenvalues(&self) -> &Array1<F> {
        &self.eigenvalues
    }

    /// Eigenvalues up to the numerical rank
    pub fn principal_inertias(&self) -> ArrayView1<F> {
        self.eigenvalues.slice(s![..self.rank])
    }

    /// Sum of all eigenvalues
    pub fn inertia(&self) -> F {
        self.inertia
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of axes retained by the last percent based score computation
    pub fn retained(&self) -> Option<usize> {
        self.retained
    }

    /// Dummy coding of the table the model was fitted on
    pub fn coding(&self) -> Option<&DummyCoding> {
        self.coding.as_ref()
    }

    pub fn row_factor_scores_cached(&self) -> Option<&Array2<F>> {
        self.row_scores.as_ref()
    }

    pub fn column_factor_scores_cached(&self) -> Option<&Array2<F>> {
        self.col_scores.as_ref()
    }

    pub(super) fn cached_scores(&self, margin: Margin) -> Option<&Array2<F>> {
        match margin {
            Margin::Rows => self.row_scores.as_ref(),
            Margin::Columns => self.col_scores.as_ref(),
        }
    }

    /// Row factor scores `F`, see [`Mca::factor_scores`]
    pub fn row_factor_scores(&mut self, percent: F, n: Option<usize>) -> Result<Array2<F>> {
        self.factor_scores(Margin::Rows, percent, n)
    }

    /// Column factor scores `G`, see [`Mca::factor_scores`]
    pub fn column_factor_scores(&mut self, percent: F, n: Option<usize>) -> Result<Array2<F>> {
        self.factor_scores(Margin::Columns, percent, n)
    }

    /// Computes and caches the factor scores of one margin
    ///
    /// The number of retained axes `k` is the smallest number of leading principal inertias
    /// whose cumulative sum reaches `percent` of their total. An explicit number of factors `n`
    /// overrides `k` and is clamped to the rank. The axes are scaled by the negated square root
    /// of the principal inertias under the Benzécri correction, and by the singular values
    /// otherwise.
    ///
    /// # Parameters
    ///
    /// * `margin`: row scores `F = D_r P S` or column scores `G = D_c Q^T S`
    /// * `percent`: fraction of inertia to retain, in `[0, 1]`
    /// * `n`: explicit number of factors, positive
    pub fn factor_scores(
        &mut self,
        margin: Margin,
        percent: F,
        n: Option<usize>,
    ) -> Result<Array2<F>> {
        if !(percent >= F::zero() && percent <= F::one()) {
            return Err(McaError::InvalidPercent(
                percent.to_f64().unwrap_or(f64::NAN),
            ));
        }
        let n = positive_factors(n)?.map(|n| n.min(self.rank));

        let k = correction::retained_dimensions(self.principal_inertias(), percent);
        self.retained = Some(k);
        let num2ret = n.unwrap_or(k);

        debug!(
            "compute {:?} factor scores with {} axes, {} retained for percent {}",
            margin, num2ret, k, percent
        );

        let scale = if self.benzecri {
            self.principal_inertias().mapv(|l| -l.sqrt())
        } else {
            self.svd.s().clone()
        };
        let scale = scale.slice(s![..num2ret]);

        let scores = match margin {
            Margin::Rows => {
                let diag = rectangular_diag(scale, self.svd.n_items(), num2ret);
                self.row_scaling.dot(&self.svd.p().view()).dot(&diag)
            }
            Margin::Columns => {
                let q = self.svd.q();
                let diag = rectangular_diag(scale, q.nrows(), num2ret);
                (&q.t() * &self.col_scaling.view().insert_axis(Axis(1))).dot(&diag)
            }
        };

        match margin {
            Margin::Rows => self.row_scores = Some(scores.clone()),
            Margin::Columns => self.col_scores = Some(scores.clone()),
        }

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn indicator() -> Array2<f64> {
        array![[1., 0., 1., 0.], [1., 0., 0., 1.], [0., 1., 0., 1.]]
    }

    fn fit(benzecri: bool) -> Mca<f64> {
        Mca::params()
            .n_cols(2)
            .benzecri(benzecri)
            .fit(&DatasetBase::from(indicator()))
            .unwrap()
    }

    #[test]
    fn fitted_quantities() {
        let mca = fit(false);

        assert_eq!(mca.n_variables(), 2);
        assert_eq!(mca.n_columns(), 4);
        assert_abs_diff_eq!(
            mca.singular_values().view(),
            array![0.75f64.sqrt(), 0.5, 0.0],
            epsilon = 1e-7
        );
        assert_eq!(mca.rank(), 2);
        assert_abs_diff_eq!(mca.inertia(), 1.0, epsilon = 1e-10);
        let inertias = array![0.75, 0.25];
        assert_abs_diff_eq!(mca.principal_inertias(), inertias.view(), epsilon = 1e-10);
        assert!(mca.coding().is_none());
        assert!(mca.retained().is_none());
    }

    #[test]
    fn benzecri_quantities() {
        let mca = fit(true);

        assert_eq!(mca.rank(), 1);
        assert_abs_diff_eq!(mca.inertia(), 0.25, epsilon = 1e-10);
        assert_abs_diff_eq!(
            mca.eigenvalues().view(),
            array![0.25, 0.0, 0.0],
            epsilon = 1e-10
        );
    }

    #[test]
    fn row_scores() {
        let mut mca = fit(false);
        let scores = mca.row_factor_scores(0.9, None).unwrap();

        assert_eq!(mca.retained(), Some(2));
        assert_eq!(scores.dim(), (3, 2));
        assert_abs_diff_eq!(
            scores.mapv(f64::abs),
            array![
                [1.5f64.sqrt() * 0.5f64.sqrt() * 1.5f64.sqrt(), 0.5f64.sqrt() / 2.],
                [0.0, 0.5f64.sqrt()],
                [1.5f64.sqrt() * 0.5f64.sqrt() * 1.5f64.sqrt(), 0.5f64.sqrt() / 2.],
            ],
            epsilon = 1e-6
        );
        assert!(mca.row_factor_scores_cached().is_some());
        assert!(mca.column_factor_scores_cached().is_none());
    }

    #[test]
    fn column_scores() {
        let mut mca = fit(false);
        let scores = mca.column_factor_scores(0.0, None).unwrap();

        assert_eq!(mca.retained(), Some(1));
        assert_eq!(scores.dim(), (4, 1));
        let a = 1.5f64.sqrt() / 2.;
        assert_abs_diff_eq!(
            scores.column(0).mapv(f64::abs),
            array![a, 2. * a, 2. * a, a],
            epsilon = 1e-6
        );
        assert!(mca.row_factor_scores_cached().is_none());
    }

    #[test]
    fn benzecri_row_scores() {
        let mut mca = fit(true);
        let scores = mca.row_factor_scores(0.9, None).unwrap();

        let a = 6f64.sqrt() / 4.;
        assert_eq!(scores.ncols(), 1);
        assert_abs_diff_eq!(
            scores.column(0).mapv(f64::abs),
            array![a, 0., a],
            epsilon = 1e-6
        );
    }

    #[test]
    fn explicit_factors_clamp_to_rank() {
        let mut mca = fit(false);

        assert_eq!(mca.row_factor_scores(0.9, Some(10)).unwrap().ncols(), 2);
        assert_eq!(mca.column_factor_scores(0.9, Some(1)).unwrap().ncols(), 1);
    }

    #[test]
    fn invalid_arguments() {
        let mut mca = fit(false);

        assert!(matches!(
            mca.row_factor_scores(1.5, None),
            Err(McaError::InvalidPercent(_))
        ));
        assert!(matches!(
            mca.row_factor_scores(-0.1, None),
            Err(McaError::InvalidPercent(_))
        ));
        assert!(matches!(
            mca.row_factor_scores(f64::NAN, None),
            Err(McaError::InvalidPercent(_))
        ));
        assert!(matches!(
            mca.column_factor_scores(0.5, Some(0)),
            Err(McaError::NonPositiveFactors)
        ));
    }

    #[test]
    fn columns_require_table() {
        let res = Mca::<f64>::params()
            .columns(["a"])
            .fit(&DatasetBase::from(indicator()));

        assert!(matches!(res, Err(McaError::ColumnsRequireTable)));
    }

    #[test]
    fn fit_transform_scores() {
        let scores = Mca::params()
            .n_cols(2)
            .benzecri(false)
            .fit_transform(&DatasetBase::from(indicator()), 0.9, Some(1), Margin::Columns)
            .unwrap();

        assert_eq!(scores.dim(), (4, 1));
    }
}
