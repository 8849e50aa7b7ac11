//! Byte level entry points
//!
//! An external scheduler running the stages as separate tasks only passes bytes between them.
//! These wrappers decode the incoming payload, run the stage and encode its output as JSON:
//! a [`Table`] after loading and scaling, [`DispersionScores`] after fitting and a
//! [`ScoreReport`](crate::ScoreReport) after scoring.
use std::path::Path;

use clusterflow::Table;
use clusterflow_clustering::DispersionScores;

use crate::config::FitSettings;
use crate::error::Result;
use crate::stages::{fit_and_scale, fit_models, load_data, score_and_explain};
use crate::store::ArtifactStore;

/// Read the training file and encode it as a table payload
pub fn load_data_payload<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
    let table = load_data(path)?;
    Ok(serde_json::to_vec(&table)?)
}

/// Decode a table payload, fit and commit the scaler and encode the scaled table
pub fn preprocess_payload(
    store: &dyn ArtifactStore,
    scaler_key: &str,
    data: &[u8],
) -> Result<Vec<u8>> {
    let table: Table<f64> = serde_json::from_slice(data)?;
    let (scaled, _) = fit_and_scale(store, scaler_key, &table)?;
    Ok(serde_json::to_vec(&scaled)?)
}

/// Decode a scaled table payload, sweep K-Means, commit a model and encode the dispersion scores
pub fn build_save_model_payload(
    store: &dyn ArtifactStore,
    data: &[u8],
    settings: &FitSettings,
    model_key: &str,
) -> Result<Vec<u8>> {
    let scaled: Table<f64> = serde_json::from_slice(data)?;
    let scores = fit_models(store, &scaled, settings, model_key)?;
    Ok(serde_json::to_vec(&scores)?)
}

/// Read the test file, decode the dispersion scores and encode the score report
pub fn load_model_elbow_payload<P: AsRef<Path>>(
    store: &dyn ArtifactStore,
    model_key: &str,
    scaler_key: &str,
    test_path: P,
    scores: &[u8],
) -> Result<Vec<u8>> {
    let scores: DispersionScores<f64> = serde_json::from_slice(scores)?;
    let test = load_data(test_path)?;
    let report = score_and_explain(store, model_key, scaler_key, &test, &scores)?;
    Ok(serde_json::to_vec(&report)?)
}
