//! Quality of representation, contributions, explained variance and supplementary points
use linfa::Float;
use log::trace;
use ndarray::{s, Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix2};

use crate::correction::greenacre_inertia;
use crate::error::{McaError, Result};
use crate::preprocessing::CategoricalTable;
use crate::utils::{column_profiles, rectangular_diag, row_profiles};

use super::algorithms::{positive_factors, Margin, Mca};

impl<F: Float> Mca<F> {
    /// Factor scores of a margin with one axis per principal inertia
    ///
    /// Cached scores are reused if they span the rank, otherwise they are recomputed and replace
    /// the cache.
    fn scores_at_rank(&mut self, margin: Margin) -> Result<Array2<F>> {
        match self.cached_scores(margin) {
            Some(scores) if scores.ncols() >= self.rank => Ok(scores.clone()),
            _ => {
                trace!("recompute {:?} factor scores at rank {}", margin, self.rank);
                self.factor_scores(margin, F::cast(0.9), Some(self.rank))
            }
        }
    }

    /// Squared cosines of the observations
    ///
    /// The squared factor scores of every observation divided by their sum over all axes, which
    /// is the quality with which each axis represents the observation.
    pub fn cos_r(&mut self, n: Option<usize>) -> Result<Array2<F>> {
        self.squared_cosines(Margin::Rows, n)
    }

    /// Squared cosines of the coded levels
    pub fn cos_c(&mut self, n: Option<usize>) -> Result<Array2<F>> {
        self.squared_cosines(Margin::Columns, n)
    }

    fn squared_cosines(&mut self, margin: Margin, n: Option<usize>) -> Result<Array2<F>> {
        let n = positive_factors(n)?;
        let scores = self.scores_at_rank(margin)?;
        let n = n.map_or(scores.ncols(), |n| n.min(scores.ncols()));

        let squared = scores.mapv(|x| x * x);
        let norms = squared.sum_axis(Axis(1)).insert_axis(Axis(1));

        Ok(&squared.slice(s![.., ..n]) / &norms)
    }

    /// Contributions of the observations to the inertia of each axis
    ///
    /// `r_i * F_ia^2 / L_a`, every axis sums to one over all observations.
    pub fn cont_r(&mut self, n: Option<usize>) -> Result<Array2<F>> {
        self.contributions(Margin::Rows, n)
    }

    /// Contributions of the coded levels to the inertia of each axis
    ///
    /// `c_j * G_ja^2 / L_a`, every axis sums to one over all levels.
    pub fn cont_c(&mut self, n: Option<usize>) -> Result<Array2<F>> {
        self.contributions(Margin::Columns, n)
    }

    fn contributions(&mut self, margin: Margin, n: Option<usize>) -> Result<Array2<F>> {
        let n = positive_factors(n)?;
        let scores = self.scores_at_rank(margin)?;
        let n = n.map_or(scores.ncols(), |n| n.min(scores.ncols()));

        let masses = match margin {
            Margin::Rows => &self.row_masses,
            Margin::Columns => &self.col_masses,
        };
        let inertias = self.principal_inertias().slice_move(s![..n]);

        let mut cont = scores.slice_move(s![.., ..n]).mapv(|x| x * x);
        cont *= &masses.view().insert_axis(Axis(1));
        cont /= &inertias;

        Ok(cont)
    }

    /// Proportion of inertia explained by each axis
    ///
    /// With `greenacre` the Benzécri corrected eigenvalues are related to Greenacre's adjusted
    /// total inertia, which needs at least two variables. Otherwise the eigenvalues in use are
    /// related to their sum.
    pub fn expl_var(&self, greenacre: bool, n: Option<usize>) -> Result<Array1<F>> {
        let n = positive_factors(n)?;

        let ratios = if greenacre {
            if self.n_variables < 2 {
                return Err(McaError::TooFewVariables(self.n_variables));
            }

            let total = greenacre_inertia(self.svd.s(), self.n_variables, self.n_columns);
            self.corrected.mapv(|e| e / total)
        } else {
            let total = self.eigenvalues.sum();
            self.eigenvalues.mapv(|e| e / total)
        };

        Ok(match n {
            Some(n) => {
                let n = n.min(ratios.len());
                ratios.slice_move(s![..n])
            }
            None => ratios,
        })
    }

    /// Projects supplementary observations into the factor space
    ///
    /// The rows of `x` are coded like the fitted indicator matrix. They are turned into profiles
    /// and mapped through the column factor scores, so projecting the fitted matrix reproduces
    /// the row factor scores.
    pub fn fs_r_sup<D: Data<Elem = F>>(
        &mut self,
        x: &ArrayBase<D, Ix2>,
        n: Option<usize>,
    ) -> Result<Array2<F>> {
        self.supplementary(Margin::Rows, x.view(), n)
    }

    /// Projects supplementary coded levels into the factor space
    ///
    /// The columns of `x` are indicator columns over the fitted observations. The result has one
    /// row per column of `x`.
    pub fn fs_c_sup<D: Data<Elem = F>>(
        &mut self,
        x: &ArrayBase<D, Ix2>,
        n: Option<usize>,
    ) -> Result<Array2<F>> {
        self.supplementary(Margin::Columns, x.view(), n)
    }

    /// Codes categorical observations with the fitted levels and projects them
    pub fn fs_r_sup_table(
        &mut self,
        table: &CategoricalTable,
        n: Option<usize>,
    ) -> Result<Array2<F>> {
        let x: Array2<F> = self
            .coding
            .as_ref()
            .ok_or(McaError::NoCoding)?
            .encode(table)?;

        self.fs_r_sup(&x, n)
    }

    fn supplementary(
        &mut self,
        margin: Margin,
        x: ArrayView2<F>,
        n: Option<usize>,
    ) -> Result<Array2<F>> {
        let n = positive_factors(n)?.map_or(self.rank, |n| n.min(self.rank));

        let (profiles, scores) = match margin {
            Margin::Rows => {
                let scores = self.scores_at_rank(Margin::Columns)?;
                if x.ncols() != scores.nrows() {
                    return Err(McaError::ShapeMismatch {
                        axis: "columns",
                        expected: scores.nrows(),
                        actual: x.ncols(),
                    });
                }

                (row_profiles(&x), scores)
            }
            Margin::Columns => {
                let scores = self.scores_at_rank(Margin::Rows)?;
                if x.nrows() != scores.nrows() {
                    return Err(McaError::ShapeMismatch {
                        axis: "rows",
                        expected: scores.nrows(),
                        actual: x.nrows(),
                    });
                }

                (column_profiles(&x), scores)
            }
        };

        let inverse = self.svd.s().slice(s![..n]).mapv(|s| s.recip());
        let diag = rectangular_diag(inverse.view(), scores.ncols(), n);

        Ok(profiles.dot(&scores).dot(&diag))
    }
}
