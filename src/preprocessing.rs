//! Dummy coding of categorical tables
//!
//! Multiple correspondence analysis works on an indicator matrix: every categorical variable is
//! expanded into one binary column per observed level. This module provides a small table type
//! for categorical observations, the expansion into an indicator matrix and the validation of
//! matrices that were already coded by the caller.
//!
//! The expansion keeps track of which coded columns belong to which source variable, because
//! the number of source variables `K` enters the Benzécri and Greenacre corrections while the
//! number of coded columns `J` is only the width of the matrix.
use std::collections::BTreeSet;
use std::ops::Range;

use linfa::dataset::Records;
use linfa::Float;
use ndarray::{s, Array2, ArrayBase, ArrayView1, ArrayView2, Data, Ix2};

use crate::error::{McaError, Result};

/// Categorical observations with named columns
///
/// Each row is an observation, each column a categorical variable and each entry the level the
/// observation takes for that variable.
///
/// ```
/// use linfa_mca::CategoricalTable;
/// use ndarray::array;
///
/// let table = CategoricalTable::new(
///     vec!["colour".into(), "size".into()],
///     array![["red", "small"], ["blue", "large"], ["red", "large"]].mapv(String::from),
/// ).unwrap();
///
/// let (indicator, coding) = table.dummy::<f64>(None).unwrap();
/// assert_eq!(indicator.dim(), (3, 4));
/// assert_eq!(coding.n_variables(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalTable {
    names: Vec<String>,
    values: Array2<String>,
}

impl CategoricalTable {
    pub fn new(names: Vec<String>, values: Array2<String>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(McaError::ShapeMismatch {
                axis: "column names",
                expected: values.ncols(),
                actual: names.len(),
            });
        }

        Ok(CategoricalTable { names, values })
    }

    /// Creates a table from arbitrary records, every entry is converted to its string
    /// representation and treated as a level
    pub fn from_records<T: ToString, D: Data<Elem = T>>(
        names: Vec<String>,
        records: &ArrayBase<D, Ix2>,
    ) -> Result<Self> {
        Self::new(names, records.map(|x| x.to_string()))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> ArrayView2<String> {
        self.values.view()
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    /// Returns the levels of the named column
    pub fn column(&self, name: &str) -> Result<ArrayView1<String>> {
        Ok(self.values.column(self.column_index(name)?))
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|x| x == name)
            .ok_or_else(|| McaError::UnknownColumn(name.to_string()))
    }

    /// Dummy code selected columns of the table
    ///
    /// Every selected column is expanded into one indicator column per observed level, levels are
    /// sorted lexicographically and the expansions are concatenated in selection order. Without
    /// a selection all columns are expanded.
    ///
    /// # Returns
    ///
    /// The indicator matrix together with the coding, which remembers the column grouping
    pub fn dummy<F: Float>(&self, columns: Option<&[String]>) -> Result<(Array2<F>, DummyCoding)> {
        let selected = match columns {
            Some(columns) => columns
                .iter()
                .map(|name| self.column_index(name))
                .collect::<Result<Vec<_>>>()?,
            None => (0..self.ncols()).collect(),
        };

        if selected.is_empty() {
            return Err(McaError::NoColumns);
        }

        let groups = selected
            .into_iter()
            .map(|idx| ColumnGroup {
                name: self.names[idx].clone(),
                levels: self
                    .values
                    .column(idx)
                    .iter()
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect(),
            })
            .collect();

        let coding = DummyCoding { groups };
        let indicator = coding.encode(self)?;

        Ok((indicator, coding))
    }
}

impl Records for CategoricalTable {
    type Elem = String;

    fn nsamples(&self) -> usize {
        self.nrows()
    }

    fn nfeatures(&self) -> usize {
        self.ncols()
    }
}

/// The coded columns which originate from a single categorical variable
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGroup {
    name: String,
    levels: Vec<String>,
}

impl ColumnGroup {
    /// Name of the source column
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Observed levels, sorted
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Column grouping of an indicator matrix produced by [`CategoricalTable::dummy`]
#[derive(Debug, Clone, PartialEq)]
pub struct DummyCoding {
    groups: Vec<ColumnGroup>,
}

impl DummyCoding {
    pub fn groups(&self) -> &[ColumnGroup] {
        &self.groups
    }

    /// Number of categorical variables before coding (`K`)
    pub fn n_variables(&self) -> usize {
        self.groups.len()
    }

    /// Number of coded columns (`J`)
    pub fn n_columns(&self) -> usize {
        self.groups.iter().map(ColumnGroup::len).sum()
    }

    /// Range of coded columns occupied by each source variable
    pub fn group_ranges(&self) -> Vec<Range<usize>> {
        let mut start = 0;
        self.groups
            .iter()
            .map(|group| {
                let range = start..start + group.len();
                start = range.end;
                range
            })
            .collect()
    }

    /// Labels of the coded columns in the form `column_level`
    pub fn column_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .flat_map(|group| {
                group
                    .levels
                    .iter()
                    .map(move |level| format!("{}_{}", group.name, level))
            })
            .collect()
    }

    /// Encodes the observations of a table with the levels learned during coding
    ///
    /// The table has to contain every source column by name, additional columns are ignored.
    /// A level which was not observed while coding is reported as an error.
    pub fn encode<F: Float>(&self, table: &CategoricalTable) -> Result<Array2<F>> {
        let mut indicator = Array2::zeros((table.nrows(), self.n_columns()));

        for (group, range) in self.groups.iter().zip(self.group_ranges()) {
            let column = table.column(&group.name)?;
            for (mut row, level) in indicator
                .slice_mut(s![.., range])
                .rows_mut()
                .into_iter()
                .zip(column.iter())
            {
                let pos = group
                    .levels
                    .binary_search(level)
                    .map_err(|_| McaError::UnknownLevel(group.name.clone(), level.clone()))?;
                row[pos] = F::one();
            }
        }

        Ok(indicator)
    }
}

/// Output of the input normalizer: the indicator matrix `X` and the number of variables `K`
/// it was coded from
#[derive(Debug, Clone)]
pub struct CodedInput<F> {
    pub(crate) indicator: Array2<F>,
    pub(crate) n_variables: usize,
    pub(crate) coding: Option<DummyCoding>,
}

impl<F: Float> CodedInput<F> {
    /// Dummy codes the selected columns of a table, `K` is the number of selected columns
    pub fn from_table(table: &CategoricalTable, columns: Option<&[String]>) -> Result<Self> {
        if table.nrows() == 0 {
            return Err(McaError::NotEnoughSamples);
        }

        let (indicator, coding) = table.dummy(columns)?;

        Ok(CodedInput {
            indicator,
            n_variables: coding.n_variables(),
            coding: Some(coding),
        })
    }

    /// Accepts a matrix coded by the caller
    ///
    /// `n_cols` is the number of categorical variables the matrix was coded from. Without it
    /// every column is assumed to be a variable of its own.
    pub fn from_coded<D: Data<Elem = F>>(
        records: &ArrayBase<D, Ix2>,
        n_cols: Option<usize>,
    ) -> Result<Self> {
        let (nrows, ncols) = records.dim();
        if ncols == 0 {
            return Err(McaError::NoColumns);
        }
        if nrows == 0 {
            return Err(McaError::NotEnoughSamples);
        }

        let n_variables = match n_cols {
            Some(n) if n == 0 || n > ncols => return Err(McaError::InvalidColumnCount(n, ncols)),
            Some(n) => n,
            None => ncols,
        };

        if let Some(((row, col), _)) = records.indexed_iter().find(|(_, x)| **x < F::zero()) {
            return Err(McaError::NegativeEntry(row, col));
        }

        Ok(CodedInput {
            indicator: records.to_owned(),
            n_variables,
            coding: None,
        })
    }

    pub fn indicator(&self) -> ArrayView2<F> {
        self.indicator.view()
    }

    /// Number of categorical variables before coding (`K`)
    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    /// Number of coded columns (`J`)
    pub fn n_columns(&self) -> usize {
        self.indicator.ncols()
    }

    pub fn coding(&self) -> Option<&DummyCoding> {
        self.coding.as_ref()
    }
}
