//! Error types in clusterflow
//!

use thiserror::Error;

use ndarray::ShapeError;
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("invalid ndarray shape {0}")]
    NdShape(#[from] ShapeError),
    #[error("expected {expected} feature names, found {found}")]
    FeatureNames { expected: usize, found: usize },
    #[error("duplicate feature name `{0}`")]
    DuplicateFeature(String),
    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}
