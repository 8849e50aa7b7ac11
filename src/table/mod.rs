//! Tables
//!
//! A [`Table`] is the unit of data flowing through the pipeline: a two-dimensional matrix of
//! observations (rows) and features (columns), where every column carries a name. Missing cells
//! are stored as `NaN` in memory and as `null` once serialized.
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumAssignOps, NumCast, Signed};
use rand::distributions::uniform::SampleUniform;

use std::collections::HashSet;
use std::fmt;
use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use crate::error::{Error, Result};

mod impl_records;
#[cfg(feature = "serde")]
mod impl_serde;

pub use impl_records::Records;

/// Floating point numbers
///
/// This trait bound multiplexes to the most common assumption of floating point number and
/// implement them for 32bit and 64bit floating points. They are used in the records of a table,
/// in fitted scaler parameters and in cluster centroids.
pub trait Float:
    FromPrimitive
    + num_traits::Float
    + PartialOrd
    + Sync
    + Send
    + Default
    + fmt::Display
    + fmt::Debug
    + Signed
    + Sum
    + NumAssignOps
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + SampleUniform
    + ScalarOperand
    + approx::AbsDiffEq
{
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }
}

impl Float for f32 {}

impl Float for f64 {}

/// Table
///
/// Rows are observations, columns are named numeric features. The feature names are part of the
/// table's identity: a fitted scaler remembers the names it was fit on and refuses tables whose
/// columns differ.
///
/// # Fields
///
/// * `records`: a two-dimensional matrix with dimensionality (nsamples, nfeatures), `NaN` marks
/// a missing value
/// * `feature_names`: one unique name per column, in column order
#[derive(Clone, Debug, PartialEq)]
pub struct Table<F> {
    records: Array2<F>,
    feature_names: Vec<String>,
}

impl<F: Float> Table<F> {
    /// Create a new table from records and the names of their columns.
    ///
    /// Fails if the number of names does not match the number of columns or if a name appears
    /// twice.
    pub fn new<S: Into<String>>(records: Array2<F>, feature_names: Vec<S>) -> Result<Self> {
        let feature_names: Vec<String> = feature_names.into_iter().map(Into::into).collect();
        if feature_names.len() != records.ncols() {
            return Err(Error::FeatureNames {
                expected: records.ncols(),
                found: feature_names.len(),
            });
        }

        let mut seen = HashSet::with_capacity(feature_names.len());
        for name in &feature_names {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateFeature(name.clone()));
            }
        }

        Ok(Table {
            records,
            feature_names,
        })
    }

    /// Build a table from rows of optional values, `None` being a missing cell.
    pub fn from_rows<S: Into<String>>(
        rows: Vec<Vec<Option<F>>>,
        feature_names: Vec<S>,
    ) -> Result<Self> {
        let feature_names: Vec<String> = feature_names.into_iter().map(Into::into).collect();
        let ncols = feature_names.len();
        let mut values = Vec::with_capacity(rows.len() * ncols);
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != ncols {
                return Err(Error::RaggedRow {
                    row,
                    expected: ncols,
                    found: cells.len(),
                });
            }
            values.extend(cells.iter().map(|cell| cell.unwrap_or_else(F::nan)));
        }
        let records = Array2::from_shape_vec((rows.len(), ncols), values)?;

        Table::new(records, feature_names)
    }

    /// Return the records as a `(nsamples, nfeatures)` matrix
    pub fn records(&self) -> &Array2<F> {
        &self.records
    }

    /// Return a read-only view of the records
    pub fn view(&self) -> ArrayView2<'_, F> {
        self.records.view()
    }

    /// Consume the table and return its records
    pub fn into_records(self) -> Array2<F> {
        self.records
    }

    /// Names of the features, in column order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the `index`-th observation
    pub fn row(&self, index: usize) -> ArrayView1<'_, F> {
        self.records.row(index)
    }

    /// Replace the records while keeping the feature names.
    ///
    /// Fails if the new records have a different number of columns.
    pub fn with_records(self, records: Array2<F>) -> Result<Self> {
        Table::new(records, self.feature_names)
    }

    /// Return, for every row, whether at least one of its cells is missing
    pub fn missing_rows(&self) -> Array1<bool> {
        self.records
            .map_axis(Axis(1), |row| row.iter().any(|x| x.is_nan()))
    }

    /// Whether any cell of the table is missing
    pub fn has_missing(&self) -> bool {
        self.records.iter().any(|x| x.is_nan())
    }

    /// Return, for every row, whether at least one of its cells is `+inf` or `-inf`.
    ///
    /// Infinite cells are not missing: they are kept by [`drop_missing`](Table::drop_missing).
    pub fn infinite_rows(&self) -> Array1<bool> {
        self.records
            .map_axis(Axis(1), |row| row.iter().any(|x| x.is_infinite()))
    }

    /// Return a copy of the table without the rows containing a missing value, and the number of
    /// rows which were dropped.
    pub fn drop_missing(&self) -> (Table<F>, usize) {
        let kept = self
            .missing_rows()
            .iter()
            .enumerate()
            .filter(|&(_, &missing)| !missing)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        let dropped = self.records.nrows() - kept.len();

        let table = Table {
            records: self.records.select(Axis(0), &kept),
            feature_names: self.feature_names.clone(),
        };

        (table, dropped)
    }
}

/// Create a table from bare records, naming the features `feature-0`, `feature-1`, ...
impl<F: Float> From<Array2<F>> for Table<F> {
    fn from(records: Array2<F>) -> Self {
        let feature_names = (0..records.ncols())
            .map(|i| format!("feature-{}", i))
            .collect();

        Table {
            records,
            feature_names,
        }
    }
}
