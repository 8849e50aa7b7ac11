use thiserror::Error;

/// An error when locating a knee with invalid hyperparameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KneeParamsError {
    #[error("sensitivity must be non-negative and finite")]
    Sensitivity,
}

/// An error when locating the knee of a curve
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KneeError {
    #[error("Invalid hyperparameter: {0}")]
    InvalidParams(#[from] KneeParamsError),
    #[error("x has {x} points but y has {y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("x must be strictly increasing")]
    NotIncreasing,
    #[error("curve contains non-finite values")]
    NonFinite,
}
