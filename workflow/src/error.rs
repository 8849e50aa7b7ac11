//! Error definitions of the pipeline stages
use std::path::PathBuf;

use clusterflow_clustering::{KMeansError, KneeError};
use clusterflow_datasets::ReadError;
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// An error aborting a pipeline stage. Nothing is retried or recovered.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input file does not exist
    #[error("input file {} does not exist", .0.display())]
    MissingInput(PathBuf),
    /// The columns of a table differ from those the scaler was fit on
    #[error("features do not match the fitted scaler: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// The model and the scaler were fit on a different number of features
    #[error("model expects {model} features but the scaler produces {scaler}")]
    IncompatibleModel { model: usize, scaler: usize },
    #[error("no artifact stored under {0:?}")]
    ArtifactNotFound(String),
    #[error("artifact {key:?} holds a {found}, expected a {expected}")]
    ArtifactKind {
        key: String,
        expected: String,
        found: String,
    },
    #[error("artifact {key:?} has format version {found}, only version {supported} is supported")]
    ArtifactVersion {
        key: String,
        found: u32,
        supported: u32,
    },
    #[error("{0:?} is not a valid artifact key, keys are plain file names")]
    InvalidKey(String),
    #[error("fitting {n_clusters} clusters failed: {source}")]
    FitFailure {
        n_clusters: usize,
        #[source]
        source: KMeansError,
    },
    #[error("scaling failed: {0}")]
    Scaling(#[source] clusterflow_preprocessing::Error),
    #[error("table contains {0} rows with missing values")]
    MissingValues(usize),
    #[error("table contains {0} rows with infinite values")]
    NonFinite(usize),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("elbow detection failed: {0}")]
    Elbow(#[from] KneeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] serde_json::Error),
    #[error(transparent)]
    Read(ReadError),
    #[error(transparent)]
    Table(#[from] clusterflow::Error),
}

impl From<clusterflow_preprocessing::Error> for PipelineError {
    fn from(err: clusterflow_preprocessing::Error) -> Self {
        use clusterflow_preprocessing::Error;

        match err {
            Error::SchemaMismatch { expected, found } => {
                PipelineError::SchemaMismatch { expected, found }
            }
            Error::MissingValues(n) => PipelineError::MissingValues(n),
            Error::NonFinite(n) => PipelineError::NonFinite(n),
            err => PipelineError::Scaling(err),
        }
    }
}

impl From<ReadError> for PipelineError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Open { path, source } if source.kind() == std::io::ErrorKind::NotFound => {
                PipelineError::MissingInput(path.into())
            }
            err => PipelineError::Read(err),
        }
    }
}
