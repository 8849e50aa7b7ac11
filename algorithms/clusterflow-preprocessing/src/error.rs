//! Error definitions for preprocessing
use thiserror::Error;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("not enough samples")]
    NotEnoughSamples,
    #[error("minimum value for MinMax scaler cannot be greater than the maximum")]
    FlippedMinMaxRange,
    #[error("table contains {0} rows with missing values")]
    MissingValues(usize),
    #[error("table contains {0} rows with infinite values")]
    NonFinite(usize),
    #[error("features do not match the fitted scaler: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error(transparent)]
    BaseCrate(#[from] clusterflow::Error),
}
