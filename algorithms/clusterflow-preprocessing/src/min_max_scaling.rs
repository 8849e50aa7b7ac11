//! Min-Max scaling

use crate::error::{Error, Result};
use approx::abs_diff_eq;
use clusterflow::prelude::*;
use ndarray::{Array1, Array2, Axis, Zip};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The checked set of hyperparameters of a [MinMaxScaler].
pub struct MinMaxValidParams<F: Float> {
    min: F,
    max: F,
}

impl<F: Float> MinMaxValidParams<F> {
    /// Lower bound of the output range
    pub fn min(&self) -> F {
        self.min
    }

    /// Upper bound of the output range
    pub fn max(&self) -> F {
        self.max
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Min-Max scaler: learns the minimum and maximum of every feature of a table, producing a
/// [fitted scaler](FittedMinMaxScaler) that maps each feature into the range `[min, max]`
/// (`[0, 1]` by default) and can be applied to other tables with the same features.
///
/// ### Example
///
/// ```rust
/// use clusterflow::traits::{Fit, Transformer};
/// use clusterflow::Table;
/// use clusterflow_preprocessing::MinMaxScaler;
/// use ndarray::array;
///
/// let table = Table::new(array![[0., 0.], [0., 10.], [10., 0.], [10., 10.]], vec!["x", "y"]).unwrap();
/// // Learn scaling parameters
/// let scaler = MinMaxScaler::new().fit(&table).unwrap();
/// // scale table according to parameters
/// let scaled = scaler.transform(table).unwrap();
/// assert_eq!(scaled.records(), &array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]]);
/// ```
pub struct MinMaxScaler<F: Float>(MinMaxValidParams<F>);

impl<F: Float> Default for MinMaxScaler<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> MinMaxScaler<F> {
    /// Initializes a MinMax scaler with range [0,1]
    pub fn new() -> Self {
        Self(MinMaxValidParams {
            min: F::zero(),
            max: F::one(),
        })
    }

    /// Change the output range.
    ///
    /// If `min` is bigger than `max` then fitting will return an error on any input.
    pub fn range(mut self, min: F, max: F) -> Self {
        self.0.min = min;
        self.0.max = max;
        self
    }
}

impl<F: Float> ParamGuard for MinMaxScaler<F> {
    type Checked = MinMaxValidParams<F>;
    type Error = Error;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.min > self.0.max {
            Err(Error::FlippedMinMaxRange)
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

impl<F: Float> Fit<Table<F>, Error> for MinMaxValidParams<F> {
    type Object = FittedMinMaxScaler<F>;

    /// Learns the per-feature minimum and maximum of `table`.
    ///
    /// Returns an error if the table has no rows, contains missing values or contains infinite
    /// values; callers wanting to ignore incomplete rows have to drop them first with
    /// [`Table::drop_missing`](clusterflow::Table::drop_missing).
    fn fit(&self, table: &Table<F>) -> Result<Self::Object> {
        let records = table.records();
        if records.nrows() == 0 {
            return Err(Error::NotEnoughSamples);
        }
        check_cells(table)?;

        let data_min = records.fold_axis(
            Axis(0),
            F::infinity(),
            |&prev, &x| if x < prev { x } else { prev },
        );
        let data_max = records.fold_axis(
            Axis(0),
            F::neg_infinity(),
            |&prev, &x| if x > prev { x } else { prev },
        );

        let mut scales = Array1::zeros(data_min.len());
        Zip::from(&mut scales)
            .and(&data_min)
            .and(&data_max)
            .for_each(|scale, &min, &max| {
                if abs_diff_eq!(max - min, F::zero()) {
                    // if feature is constant then don't scale
                    *scale = F::one();
                } else {
                    *scale = F::one() / (max - min);
                }
            });

        Ok(FittedMinMaxScaler {
            data_min,
            data_max,
            scales,
            min: self.min,
            max: self.max,
            feature_names: table.feature_names().to_vec(),
        })
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// The result of fitting a [min-max scaler](MinMaxScaler).
///
/// Scales tables with the parameters learned during fitting, it is never refit. A feature which
/// was constant during fitting keeps a scale of one: its training values all map to the lower
/// bound of the output range and unseen values are only shifted by the training minimum.
pub struct FittedMinMaxScaler<F: Float> {
    data_min: Array1<F>,
    data_max: Array1<F>,
    scales: Array1<F>,
    min: F,
    max: F,
    feature_names: Vec<String>,
}

impl<F: Float> FittedMinMaxScaler<F> {
    /// Per-feature minimum seen during fitting
    pub fn data_min(&self) -> &Array1<F> {
        &self.data_min
    }

    /// Per-feature maximum seen during fitting
    pub fn data_max(&self) -> &Array1<F> {
        &self.data_max
    }

    /// Array of size `n_features` that contains the scale that will be applied to each feature
    /// after subtracting its minimum
    pub fn scales(&self) -> &Array1<F> {
        &self.scales
    }

    /// The output range `(min, max)`
    pub fn output_range(&self) -> (F, F) {
        (self.min, self.max)
    }

    /// The ordered feature names the scaler was fit on
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Checks that `table` has exactly the features, in the same order, the scaler was fit on
    pub fn check_schema(&self, table: &Table<F>) -> Result<()> {
        if table.feature_names() != self.feature_names.as_slice() {
            return Err(Error::SchemaMismatch {
                expected: self.feature_names.clone(),
                found: table.feature_names().to_vec(),
            });
        }
        Ok(())
    }
}

impl<F: Float> Transformer<Array2<F>, Array2<F>> for FittedMinMaxScaler<F> {
    /// Scales an array of size (nsamples, nfeatures) according to the scaler's parameters.
    /// Panics if the shape of the input array is not compatible with the shape of the table used
    /// for fitting.
    fn transform(&self, x: Array2<F>) -> Array2<F> {
        if x.is_empty() {
            return x;
        }
        let mut x = x;
        Zip::from(x.columns_mut())
            .and(&self.data_min)
            .and(&self.scales)
            .for_each(|mut col, &offset, &scale| {
                col.mapv_inplace(|el| (el - offset) * scale);
            });
        x * (self.max - self.min) + self.min
    }
}

impl<F: Float> Transformer<Table<F>, Result<Table<F>>> for FittedMinMaxScaler<F> {
    /// Scales the records of `table`, keeping its feature names.
    ///
    /// Fails with [`Error::SchemaMismatch`] if the table's features differ from the ones seen
    /// during fitting, with [`Error::MissingValues`] if a cell is missing and with
    /// [`Error::NonFinite`] if a cell is infinite.
    fn transform(&self, table: Table<F>) -> Result<Table<F>> {
        self.check_schema(&table)?;
        check_cells(&table)?;

        let records = self.transform(table.records().clone());
        Ok(table.with_records(records)?)
    }
}

/// Every cell must hold a finite value
fn check_cells<F: Float>(table: &Table<F>) -> Result<()> {
    let n_missing = table.missing_rows().iter().filter(|&&m| m).count();
    if n_missing > 0 {
        return Err(Error::MissingValues(n_missing));
    }
    let n_infinite = table.infinite_rows().iter().filter(|&&inf| inf).count();
    if n_infinite > 0 {
        return Err(Error::NonFinite(n_infinite));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn table(records: Array2<f64>) -> Table<f64> {
        let names = (0..records.ncols())
            .map(|i| format!("f{}", i))
            .collect::<Vec<_>>();
        Table::new(records, names).unwrap()
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<MinMaxScaler<f64>>();
        has_autotraits::<FittedMinMaxScaler<f64>>();
    }

    #[test]
    fn test_min_max_scaler() {
        let dataset = table(array![[1., -1., 2.], [2., 0., 0.], [0., 1., -1.]]);
        let scaler = MinMaxScaler::new().fit(&dataset).unwrap();
        assert_abs_diff_eq!(*scaler.data_min(), array![0., -1., -1.]);
        assert_abs_diff_eq!(*scaler.data_max(), array![2., 1., 2.]);
        assert_abs_diff_eq!(*scaler.scales(), array![1. / 2., 1. / 2., 1. / 3.]);
        let transformed = scaler.transform(dataset).unwrap();
        let mins = transformed.records().fold_axis(
            Axis(0),
            f64::INFINITY,
            |&x, &prev| if x < prev { x } else { prev },
        );
        let maxes = transformed.records().fold_axis(
            Axis(0),
            f64::NEG_INFINITY,
            |&x, &prev| if x > prev { x } else { prev },
        );
        assert_abs_diff_eq!(maxes, array![1., 1., 1.]);
        assert_abs_diff_eq!(mins, array![0., 0., 0.]);
    }

    #[test]
    fn test_corner_square() {
        let dataset = table(array![[0., 0.], [0., 10.], [10., 0.], [10., 10.]]);
        let scaler = MinMaxScaler::new().fit(&dataset).unwrap();
        assert_abs_diff_eq!(*scaler.data_min(), array![0., 0.]);
        assert_abs_diff_eq!(*scaler.data_max(), array![10., 10.]);

        let scaled = scaler.transform(dataset).unwrap();
        assert_abs_diff_eq!(
            *scaled.records(),
            array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]]
        );

        let test = scaler.transform(table(array![[5., 5.]])).unwrap();
        assert_abs_diff_eq!(*test.records(), array![[0.5, 0.5]]);
    }

    #[test]
    fn test_min_max_scaler_range() {
        let dataset = table(array![[1., -1., 2.], [2., 0., 0.], [0., 1., -1.]]);
        let scaler = MinMaxScaler::new().range(5., 10.).fit(&dataset).unwrap();
        assert_eq!(scaler.output_range(), (5., 10.));
        let transformed = scaler.transform(dataset).unwrap();
        let mins = transformed.records().fold_axis(
            Axis(0),
            f64::INFINITY,
            |&x, &prev| if x < prev { x } else { prev },
        );
        let maxes = transformed.records().fold_axis(
            Axis(0),
            f64::NEG_INFINITY,
            |&x, &prev| if x > prev { x } else { prev },
        );
        assert_abs_diff_eq!(mins, array![5., 5., 5.]);
        assert_abs_diff_eq!(maxes, array![10., 10., 10.]);
    }

    #[test]
    fn test_min_max_scaler_const_feature() {
        let dataset = table(array![[1., -1., 2.], [2., 0., 2.], [0., 1., 2.]]);
        let scaler = MinMaxScaler::new().fit(&dataset).unwrap();
        assert_abs_diff_eq!(*scaler.scales(), array![1. / 2., 1. / 2., 1.]);
        let transformed = scaler.transform(dataset).unwrap();
        // constant feature collapses onto the lower bound
        assert_abs_diff_eq!(transformed.records().column(2), array![0., 0., 0.]);

        // unseen values of a constant feature are only shifted
        let test = scaler.transform(table(array![[1., 0., 3.5]])).unwrap();
        assert_abs_diff_eq!(*test.records(), array![[0.5, 0.5, 1.5]]);
    }

    #[test]
    fn test_empty_input() {
        let dataset = table(Array2::from_shape_vec((0, 2), vec![]).unwrap());
        let scaler = MinMaxScaler::new().fit(&dataset);
        assert_eq!(
            scaler.err().unwrap().to_string(),
            "not enough samples".to_string()
        );
    }

    #[test]
    fn test_missing_values_are_rejected() {
        let dataset = table(array![[1., f64::NAN], [2., 3.]]);
        let res = MinMaxScaler::new().fit(&dataset);
        assert!(matches!(res, Err(Error::MissingValues(1))));

        let scaler = MinMaxScaler::new()
            .fit(&table(array![[1., 2.], [2., 3.]]))
            .unwrap();
        let res = scaler.transform(dataset);
        assert!(matches!(res, Err(Error::MissingValues(1))));
    }

    #[test]
    fn test_infinite_values_are_rejected() {
        let dataset = table(array![[0., 0.], [10., 10.], [f64::INFINITY, 5.]]);
        let res = MinMaxScaler::new().fit(&dataset);
        assert!(matches!(res, Err(Error::NonFinite(1))));

        let scaler = MinMaxScaler::new()
            .fit(&table(array![[0., 0.], [10., 10.]]))
            .unwrap();
        let res = scaler.transform(table(array![[f64::NEG_INFINITY, 10.], [5., 5.]]));
        assert!(matches!(res, Err(Error::NonFinite(1))));
    }

    #[test]
    fn test_schema_mismatch() {
        let train = Table::new(array![[1., 2.], [2., 3.]], vec!["height", "weight"]).unwrap();
        let scaler = MinMaxScaler::new().fit(&train).unwrap();

        let reordered = Table::new(array![[2., 1.]], vec!["weight", "height"]).unwrap();
        match scaler.transform(reordered) {
            Err(Error::SchemaMismatch { expected, found }) => {
                assert_eq!(expected, vec!["height", "weight"]);
                assert_eq!(found, vec!["weight", "height"]);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let extra = Table::new(array![[1., 2., 3.]], vec!["height", "weight", "age"]).unwrap();
        assert!(matches!(
            scaler.transform(extra),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_transform_empty_array() {
        let empty: Array2<f64> = Array2::from_shape_vec((0, 0), vec![]).unwrap();
        let dataset = table(array![[1., -1., 2.], [2., 0., 2.], [0., 1., 2.]]);
        let scaler = MinMaxScaler::new().fit(&dataset).unwrap();
        let transformed = scaler.transform(empty);
        assert!(transformed.is_empty());
    }

    #[test]
    #[should_panic]
    fn test_transform_wrong_size_array() {
        let wrong_size = Array2::from_shape_vec((1, 2), vec![0., 0.]).unwrap();
        let dataset = table(array![[1., -1., 2.], [2., 0., 2.], [0., 1., 2.]]);
        let scaler = MinMaxScaler::new().fit(&dataset).unwrap();
        let _transformed = scaler.transform(wrong_size);
    }

    #[test]
    fn test_min_max_wrong_range() {
        let dataset = table(array![[1., -1., 2.], [2., 0., 0.], [0., 1., -1.]]);
        let res = MinMaxScaler::new().range(10., 5.).fit(&dataset);
        assert!(matches!(res, Err(Error::FlippedMinMaxRange)));
    }

    #[test]
    fn fitting_is_deterministic() {
        let dataset = table(array![[3., 7.], [1., 9.], [4., 2.]]);
        let first = MinMaxScaler::new().fit(&dataset).unwrap();
        let second = MinMaxScaler::new().fit(&dataset).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_scales_identically() {
        let dataset = table(array![[3., 7.], [1., 9.], [4., 2.], [0., 5.]]);
        let scaler = MinMaxScaler::new().fit(&dataset).unwrap();

        let json = serde_json::to_string(&scaler).unwrap();
        let loaded: FittedMinMaxScaler<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, scaler);

        let test = table(array![[2., 8.], [5., -1.]]);
        assert_eq!(
            loaded.transform(test.clone()).unwrap(),
            scaler.transform(test).unwrap()
        );
    }
}
