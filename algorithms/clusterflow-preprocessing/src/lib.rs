//! # Preprocessing
//! ## The Big Picture
//!
//! `clusterflow-preprocessing` is a crate in the `clusterflow` workspace. It holds the steps
//! applied to a [`Table`](clusterflow::Table) before clustering.
//!
//! ## Current state
//! `clusterflow-preprocessing` provides the following preprocessing algorithms:
//! * [Min-max scaling](min_max_scaling::MinMaxScaler), remembering the feature schema it was
//!   fit on so that later tables are scaled consistently

pub mod error;
pub mod min_max_scaling;

pub use error::{Error, Result};
pub use min_max_scaling::{FittedMinMaxScaler, MinMaxScaler, MinMaxValidParams};
