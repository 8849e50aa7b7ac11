use clusterflow::traits::{Predict, Transformer};
use clusterflow::{Records, Table};
use clusterflow_clustering::{DispersionScores, KMeans};
use clusterflow_preprocessing::FittedMinMaxScaler;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span, warn};

use crate::error::{PipelineError, Result};
use crate::store::{load_artifact, ArtifactStore};

/// Outcome of the scoring stage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Index of the nearest centroid of the committed model, one per test row
    pub assignments: Vec<usize>,
    /// Cluster count at the elbow of the dispersion scores, for information only
    pub elbow: Option<usize>,
}

impl ScoreReport {
    /// Assignment of the first test row
    pub fn first(&self) -> Option<usize> {
        self.assignments.first().copied()
    }
}

/// Score `test` with the committed model and scaler, and locate the elbow of `scores`.
///
/// The test table is scaled with the committed scaler, it is never refit. Its features must be
/// the ones the scaler was fit on, in the same order, and none of its cells may be missing. The
/// elbow is informational: the committed model is used whatever its cluster count.
pub fn score_and_explain(
    store: &dyn ArtifactStore,
    model_key: &str,
    scaler_key: &str,
    test: &Table<f64>,
    scores: &DispersionScores<f64>,
) -> Result<ScoreReport> {
    let _span = info_span!("scoring", model_key, scaler_key).entered();

    let model: KMeans<f64> = load_artifact(store, model_key)?;
    let scaler: FittedMinMaxScaler<f64> = load_artifact(store, scaler_key)?;
    if model.centroids().ncols() != scaler.feature_names().len() {
        return Err(PipelineError::IncompatibleModel {
            model: model.centroids().ncols(),
            scaler: scaler.feature_names().len(),
        });
    }

    let scaled = scaler.transform(test.clone())?;

    // informational only, a malformed curve does not stop the scoring
    let elbow = match scores.elbow() {
        Ok(Some(n_clusters)) => {
            info!(n_clusters, "elbow of the dispersion scores");
            Some(n_clusters)
        }
        Ok(None) => {
            info!("no elbow in the dispersion scores");
            None
        }
        Err(err) => {
            warn!(error = %err, "could not locate the elbow of the dispersion scores");
            None
        }
    };

    let assignments = model.predict(scaled.records()).to_vec();
    info!(
        rows = scaled.nsamples(),
        n_clusters = model.n_clusters(),
        "scored test table"
    );

    Ok(ScoreReport { assignments, elbow })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FitSettings;
    use crate::stages::{fit_and_scale, fit_models};
    use crate::store::MemoryArtifactStore;
    use ndarray::array;

    fn trained_store() -> (MemoryArtifactStore, DispersionScores<f64>) {
        let store = MemoryArtifactStore::new();
        let train = Table::new(
            array![[0., 0.], [0., 10.], [10., 0.], [10., 10.]],
            vec!["x", "y"],
        )
        .unwrap();
        let (scaled, _) = fit_and_scale(&store, "scaler.json", &train).unwrap();
        let scores = fit_models(&store, &scaled, &FitSettings::new(3), "m.sav").unwrap();
        (store, scores)
    }

    #[test]
    fn training_rows_land_on_their_own_clusters() {
        let (store, scores) = trained_store();
        let test = Table::new(array![[0., 0.], [10., 10.], [5., 5.]], vec!["x", "y"]).unwrap();

        let report = score_and_explain(&store, "m.sav", "scaler.json", &test, &scores).unwrap();
        assert_eq!(report.assignments.len(), 3);
        assert!(report.assignments.iter().all(|&c| c < 3));
        assert_ne!(report.assignments[0], report.assignments[1]);
        assert_eq!(report.elbow, None);
    }

    #[test]
    fn unknown_model_key() {
        let (store, scores) = trained_store();
        let test = Table::new(array![[5., 5.]], vec!["x", "y"]).unwrap();

        let res = score_and_explain(&store, "other.sav", "scaler.json", &test, &scores);
        assert!(matches!(res, Err(PipelineError::ArtifactNotFound(key)) if key == "other.sav"));
    }

    #[test]
    fn unknown_scaler_key() {
        let (store, scores) = trained_store();
        let test = Table::new(array![[5., 5.]], vec!["x", "y"]).unwrap();

        let res = score_and_explain(&store, "m.sav", "minmax.json", &test, &scores);
        assert!(matches!(res, Err(PipelineError::ArtifactNotFound(key)) if key == "minmax.json"));
    }

    #[test]
    fn reordered_columns_are_rejected() {
        let (store, scores) = trained_store();
        let test = Table::new(array![[5., 5.]], vec!["y", "x"]).unwrap();

        let res = score_and_explain(&store, "m.sav", "scaler.json", &test, &scores);
        assert!(matches!(
            res,
            Err(PipelineError::SchemaMismatch { ref expected, ref found })
                if expected == &["x", "y"] && found == &["y", "x"]
        ));
    }

    #[test]
    fn missing_test_cells_are_rejected() {
        let (store, scores) = trained_store();
        let test = Table::from_rows(vec![vec![Some(5.), None]], vec!["x", "y"]).unwrap();

        let res = score_and_explain(&store, "m.sav", "scaler.json", &test, &scores);
        assert!(matches!(res, Err(PipelineError::MissingValues(1))));
    }

    #[test]
    fn unordered_scores_only_lose_the_elbow() {
        let (store, _) = trained_store();
        let scores = vec![(3, 0.5), (1, 2.0), (2, 1.0)]
            .into_iter()
            .collect::<DispersionScores<f64>>();
        assert!(scores.elbow().is_err());

        let test = Table::new(array![[0., 0.], [10., 10.]], vec!["x", "y"]).unwrap();
        let report = score_and_explain(&store, "m.sav", "scaler.json", &test, &scores).unwrap();
        assert_eq!(report.assignments.len(), 2);
        assert_eq!(report.elbow, None);
    }

    #[test]
    fn first_assignment() {
        let report = ScoreReport {
            assignments: vec![2, 0],
            elbow: Some(3),
        };
        assert_eq!(report.first(), Some(2));
        assert_eq!(
            ScoreReport {
                assignments: vec![],
                elbow: None
            }
            .first(),
            None
        );
    }
}
