use clusterflow::traits::Fit;
use clusterflow::{ParamGuard, Records, Table};
use clusterflow_clustering::{DispersionScores, KMeans, KMeansError};
use tracing::{debug, info, info_span, warn};

use crate::config::{FitSettings, FitValidSettings, ModelSelection};
use crate::error::{PipelineError, Result};
use crate::store::{save_artifact, ArtifactStore};

/// Fit one K-Means model per cluster count in `1..=max_clusters`, record the inertia of each
/// and commit one of them under `model_key`.
///
/// Every cluster count starts from a generator seeded with the configured seed, so a sweep is
/// reproducible and its scores don't depend on the range. With [`ModelSelection::Largest`] the
/// committed model is the one with `max_clusters` clusters whatever the elbow of the scores.
/// Only the latest model is held during the sweep. The elbow model is refit from the same
/// seed, which gives back the model of the sweep.
///
/// The first failing fit aborts the sweep with [`PipelineError::FitFailure`] and nothing is
/// committed.
pub fn fit_models(
    store: &dyn ArtifactStore,
    scaled: &Table<f64>,
    settings: &FitSettings,
    model_key: &str,
) -> Result<DispersionScores<f64>> {
    let settings = settings.check_ref()?;
    let _span = info_span!("fitting", model_key).entered();

    let mut scores = DispersionScores::new();
    let mut latest = None;
    for n_clusters in 1..=settings.max_clusters() {
        let model = fit_one(settings, scaled, n_clusters)?;
        debug!(n_clusters, inertia = model.inertia(), "fitted model");
        scores.push(n_clusters, model.inertia());
        latest = Some(model);
    }

    let largest = settings.max_clusters();
    let chosen = match settings.selection() {
        ModelSelection::Largest => largest,
        ModelSelection::Elbow => scores.elbow()?.unwrap_or_else(|| {
            warn!("no elbow in the dispersion scores, committing the largest model");
            largest
        }),
    };

    let model = match latest {
        Some(model) if chosen == largest => model,
        _ => fit_one(settings, scaled, chosen)?,
    };
    save_artifact(store, model_key, &model)?;
    info!(
        n_clusters = chosen,
        rows = scaled.nsamples(),
        "committed cluster model"
    );

    Ok(scores)
}

fn fit_one(
    settings: &FitValidSettings,
    scaled: &Table<f64>,
    n_clusters: usize,
) -> Result<KMeans<f64>> {
    KMeans::params_with_seed(n_clusters, settings.seed())
        .n_runs(settings.n_runs())
        .max_n_iterations(settings.max_n_iterations())
        .tolerance(settings.tolerance())
        .init_method(settings.init())
        .fit(scaled.records())
        .map_err(|source: KMeansError| PipelineError::FitFailure { n_clusters, source })
}
