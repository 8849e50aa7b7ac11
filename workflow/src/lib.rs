//! # Workflow
//!
//! `clusterflow-workflow` wires the pipeline together: it reads the training table, fits and
//! commits a min-max scaler, sweeps K-Means over a range of cluster counts, commits one model and
//! finally scores a test table with the committed scaler and model.
//!
//! Fitted parameters are handed between stages through an [`ArtifactStore`]: the scaler used on
//! test data is always the one committed by the scaling stage, never a refit, and the model used
//! for scoring is always the one committed by the fitting stage.
//!
//! ```
//! use clusterflow::Table;
//! use clusterflow_workflow::{fit_and_scale, fit_models, score_and_explain};
//! use clusterflow_workflow::{FitSettings, MemoryArtifactStore};
//! use ndarray::array;
//!
//! let store = MemoryArtifactStore::new();
//! let train = Table::new(array![[0., 0.], [0., 10.], [10., 0.], [10., 10.]], vec!["x", "y"])?;
//!
//! let (scaled, _) = fit_and_scale(&store, "scaler.json", &train)?;
//! let scores = fit_models(&store, &scaled, &FitSettings::new(3), "m.sav")?;
//!
//! let test = Table::new(array![[5., 5.]], vec!["x", "y"])?;
//! let report = score_and_explain(&store, "m.sav", "scaler.json", &test, &scores)?;
//! assert!(report.first().unwrap() < 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod config;
mod error;
pub mod payload;
mod stages;
mod store;

pub use config::{FitSettings, FitValidSettings, ModelSelection, PipelineConfig};
pub use error::{PipelineError, Result};
pub use stages::*;
pub use store::{
    load_artifact, save_artifact, Artifact, ArtifactStore, FsArtifactStore, MemoryArtifactStore,
    FORMAT_VERSION,
};
