//! `clusterflow-clustering` provides the clustering side of the `clusterflow` pipeline.
//!
//! ## The big picture
//!
//! The pipeline sweeps K-Means over a range of cluster counts, records the dispersion (inertia)
//! of every fitted model and uses the elbow of that curve to report how many clusters the data
//! apparently has.
//!
//! ## Current state
//!
//! `clusterflow-clustering` provides:
//! * [K-Means](KMeans), seeded and restartable, with random or k-means++ initialisation
//! * [DispersionScores], the ordered `(cluster count, inertia)` curve of a sweep
//! * [KneeLocator], the Kneedle algorithm used to find the elbow of such a curve
//!
//! Implementation choices, algorithmic details and tutorials can be found in the page dedicated to the specific algorithms.
mod elbow;
#[allow(clippy::new_ret_no_self)]
mod k_means;

pub use elbow::*;
pub use k_means::*;
