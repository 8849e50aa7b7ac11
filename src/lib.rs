//! `clusterflow` is the core of an offline clustering pipeline: load a table of numeric
//! features, scale it, sweep K-Means over a range of cluster counts, persist the fitted
//! scaler and a chosen model, and later score new records with them.
//!
//! This crate only holds the shared vocabulary of the workspace:
//!
//! * [`Table`], a matrix of observations with named (and possibly missing) features
//! * the [`traits`] every estimator implements ([`Fit`](traits::Fit),
//!   [`Predict`](traits::Predict), [`Transformer`](traits::Transformer))
//! * [`ParamGuard`], the checked-hyperparameter pattern
//! * the core [`Error`](error::Error) type
//!
//! The algorithms live in their own crates:
//!
//! * `clusterflow-preprocessing`: min-max scaling with an explicit feature schema
//! * `clusterflow-clustering`: K-Means and the Kneedle elbow locator
//! * `clusterflow-datasets`: reading delimited files into a [`Table`]
//! * `clusterflow-workflow`: the artifact store, the pipeline stages and the CLI

pub mod error;
mod param_guard;
pub mod prelude;
pub mod table;
pub mod traits;

pub use error::{Error, Result};
pub use param_guard::ParamGuard;
pub use table::{Float, Records, Table};
