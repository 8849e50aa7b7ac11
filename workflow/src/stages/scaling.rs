use clusterflow::traits::{Fit, Transformer};
use clusterflow::{Records, Table};
use clusterflow_preprocessing::{FittedMinMaxScaler, MinMaxScaler};
use tracing::{debug, info, info_span};

use crate::error::Result;
use crate::store::{save_artifact, ArtifactStore};

/// Fit a min-max scaler on the training table, commit it under `scaler_key` and return the
/// scaled table together with the scaler.
///
/// Rows with a missing cell are dropped before fitting, so the per-feature ranges only reflect
/// complete rows and the scaled table is shorter than the input by the number of dropped rows.
/// The scaler is committed before the scaled table is returned, a failed write aborts the stage.
pub fn fit_and_scale(
    store: &dyn ArtifactStore,
    scaler_key: &str,
    table: &Table<f64>,
) -> Result<(Table<f64>, FittedMinMaxScaler<f64>)> {
    let _span = info_span!("scaling", scaler_key).entered();

    let (table, dropped) = table.drop_missing();
    if dropped > 0 {
        debug!(dropped, kept = table.nsamples(), "dropped rows with missing values");
    }

    let scaler = MinMaxScaler::new().fit(&table)?;
    save_artifact(store, scaler_key, &scaler)?;
    info!(features = scaler.feature_names().len(), "committed scaler");

    let scaled = scaler.transform(table)?;
    Ok((scaled, scaler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::store::{load_artifact, MemoryArtifactStore};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn corner_square() {
        let store = MemoryArtifactStore::new();
        let table = Table::new(
            array![[0., 0.], [0., 10.], [10., 0.], [10., 10.]],
            vec!["x", "y"],
        )
        .unwrap();

        let (scaled, scaler) = fit_and_scale(&store, "scaler.json", &table).unwrap();
        assert_abs_diff_eq!(*scaler.data_min(), array![0., 0.]);
        assert_abs_diff_eq!(*scaler.data_max(), array![10., 10.]);
        assert_abs_diff_eq!(
            *scaled.records(),
            array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]]
        );
        assert_eq!(scaled.feature_names(), table.feature_names());

        let committed: FittedMinMaxScaler<f64> = load_artifact(&store, "scaler.json").unwrap();
        assert_eq!(committed, scaler);
    }

    #[test]
    fn rows_with_missing_values_are_dropped() {
        let store = MemoryArtifactStore::new();
        let table = Table::from_rows(
            vec![
                vec![Some(1.), Some(2.)],
                vec![None, Some(100.)],
                vec![Some(3.), Some(4.)],
                vec![Some(-50.), None],
            ],
            vec!["x", "y"],
        )
        .unwrap();

        let (scaled, scaler) = fit_and_scale(&store, "scaler.json", &table).unwrap();
        assert_eq!(scaled.nsamples(), 2);
        assert_abs_diff_eq!(*scaler.data_min(), array![1., 2.]);
        assert_abs_diff_eq!(*scaler.data_max(), array![3., 4.]);
    }

    #[test]
    fn infinite_training_cell_commits_nothing() {
        let store = MemoryArtifactStore::new();
        let table = Table::new(
            array![[0., 0.], [0., 10.], [10., 0.], [10., 10.], [f64::INFINITY, 5.]],
            vec!["x", "y"],
        )
        .unwrap();

        let res = fit_and_scale(&store, "scaler.json", &table);
        assert!(matches!(res, Err(PipelineError::NonFinite(1))));
        assert!(store.keys().is_empty());
    }

    #[test]
    fn nothing_left_after_dropping() {
        let store = MemoryArtifactStore::new();
        let table = Table::from_rows(vec![vec![None, Some(1.)]], vec!["x", "y"]).unwrap();

        let res = fit_and_scale(&store, "scaler.json", &table);
        assert!(matches!(res, Err(PipelineError::Scaling(_))));
        assert!(store.keys().is_empty());
    }
}
