use linfa::{Float, ParamGuard};
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::McaError;
use crate::mca::Mca;

/// Solver for the singular value decomposition of the standardized residuals
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SvdSolver {
    /// Dense decomposition of all singular triplets
    Full,
    /// Leading singular triplets only, with a sparse row scaling
    ///
    /// The triplet count is `n_cols`, or `min(shape) - 1` without it. LOBPCG only runs when the
    /// smaller dimension of the residuals is at least `5 * count + 1`, otherwise the dense
    /// decomposition is computed and truncated. Without a small `n_cols` this solver therefore
    /// costs as much as [`SvdSolver::Full`].
    Truncated,
}

impl Default for SvdSolver {
    fn default() -> Self {
        SvdSolver::Full
    }
}

/// Multiple Correspondence Analysis hyperparameters
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct McaValidParams<F: Float> {
    columns: Option<Vec<String>>,
    n_cols: Option<usize>,
    benzecri: bool,
    tolerance: F,
    solver: SvdSolver,
}

impl<F: Float> McaValidParams<F> {
    /// Columns of a categorical table which are dummy coded
    pub fn columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    /// Number of categorical variables of a pre-coded matrix
    pub fn n_cols(&self) -> Option<usize> {
        self.n_cols
    }

    pub fn benzecri(&self) -> bool {
        self.benzecri
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn solver(&self) -> SvdSolver {
        self.solver
    }
}

/// Multiple Correspondence Analysis hyperparameters
///
/// The records are either a [`CategoricalTable`](crate::CategoricalTable), of which all or the
/// selected `columns` are dummy coded, or an already coded indicator matrix. In the latter case
/// the number of categorical variables `K` can not be recovered from the matrix and should be
/// given with `n_cols`, otherwise every column is counted as its own variable.
#[derive(Debug, Clone, PartialEq)]
pub struct McaParams<F: Float>(McaValidParams<F>);

impl<F: Float> Default for McaParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> Mca<F> {
    pub fn params() -> McaParams<F> {
        McaParams::new()
    }
}

impl<F: Float> McaParams<F> {
    /// Creates the set of default parameters
    ///
    /// All columns are coded, the Benzécri correction is applied, eigenvalues below `1e-4` are
    /// cut from the rank and the full decomposition is computed.
    pub fn new() -> Self {
        Self(McaValidParams {
            columns: None,
            n_cols: None,
            benzecri: true,
            tolerance: F::cast(1e-4),
            solver: SvdSolver::Full,
        })
    }

    /// Select the columns of a categorical table to code
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.0.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the number of categorical variables of a pre-coded matrix
    ///
    /// With the truncated solver this is also the number of computed singular triplets.
    pub fn n_cols(mut self, n_cols: usize) -> Self {
        self.0.n_cols = Some(n_cols);
        self
    }

    /// Enable or disable the Benzécri correction of the eigenvalues
    pub fn benzecri(mut self, benzecri: bool) -> Self {
        self.0.benzecri = benzecri;
        self
    }

    /// Set the threshold below which eigenvalues no longer count to the rank
    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    pub fn solver(mut self, solver: SvdSolver) -> Self {
        self.0.solver = solver;
        self
    }
}

impl<F: Float> ParamGuard for McaParams<F> {
    type Checked = McaValidParams<F>;
    type Error = McaError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        if self.0.n_cols == Some(0) {
            Err(McaError::ZeroColumnCount)
        } else if matches!(&self.0.columns, Some(columns) if columns.is_empty()) {
            Err(McaError::EmptyColumnSelection)
        } else if !self.0.tolerance.is_finite() || self.0.tolerance < F::zero() {
            Err(McaError::InvalidTolerance)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let params = Mca::<f64>::params().check().unwrap();

        assert_eq!(params.columns(), None);
        assert_eq!(params.n_cols(), None);
        assert!(params.benzecri());
        assert_eq!(params.tolerance(), 1e-4);
        assert_eq!(params.solver(), SvdSolver::Full);
    }

    #[test]
    fn setters() {
        let params = Mca::<f32>::params()
            .columns(["color", "shape"])
            .n_cols(2)
            .benzecri(false)
            .tolerance(1e-3)
            .solver(SvdSolver::Truncated)
            .check()
            .unwrap();

        assert_eq!(
            params.columns(),
            Some(&["color".to_string(), "shape".to_string()][..])
        );
        assert_eq!(params.n_cols(), Some(2));
        assert!(!params.benzecri());
        assert_eq!(params.tolerance(), 1e-3);
        assert_eq!(params.solver(), SvdSolver::Truncated);
    }

    #[test]
    fn invalid_params() {
        assert!(matches!(
            Mca::<f64>::params().n_cols(0).check(),
            Err(McaError::ZeroColumnCount)
        ));
        assert!(matches!(
            Mca::<f64>::params().columns(Vec::<String>::new()).check(),
            Err(McaError::EmptyColumnSelection)
        ));
        assert!(matches!(
            Mca::<f64>::params().tolerance(-1.).check(),
            Err(McaError::InvalidTolerance)
        ));
        assert!(matches!(
            Mca::<f64>::params().tolerance(f64::NAN).check_ref(),
            Err(McaError::InvalidTolerance)
        ));
    }
}
