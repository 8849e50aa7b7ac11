//! The pipeline stages
//!
//! Each stage is a plain function taking the [`ArtifactStore`](crate::ArtifactStore) it commits
//! to or reads from. Stages run one after the other on a single thread, a failure aborts the
//! stage and is returned to the caller.
mod fitting;
mod load;
mod scaling;
mod scoring;

pub use fitting::fit_models;
pub use load::load_data;
pub use scaling::fit_and_scale;
pub use scoring::{score_and_explain, ScoreReport};

use tracing::info;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::store::ArtifactStore;

/// Run all four stages in process: load the training table, scale it, sweep K-Means and score
/// the test table.
pub fn run_pipeline(config: &PipelineConfig, store: &dyn ArtifactStore) -> Result<ScoreReport> {
    let train = load_data(config.train_path())?;
    let (scaled, _) = fit_and_scale(store, &config.scaler_key, &train)?;
    let scores = fit_models(store, &scaled, &config.fit, &config.model_key)?;

    let test = load_data(config.test_path())?;
    let report = score_and_explain(
        store,
        &config.model_key,
        &config.scaler_key,
        &test,
        &scores,
    )?;
    info!(
        n_scored = report.assignments.len(),
        elbow = ?report.elbow,
        "pipeline finished"
    );
    Ok(report)
}
