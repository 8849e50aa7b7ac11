//! Elbow detection
//!
//! Locates the point of maximum curvature (the "knee" or "elbow") of a sampled curve with the
//! Kneedle algorithm. Applied to the inertia of K-Means models fitted over a range of cluster
//! counts, the knee is the cluster count beyond which adding clusters stops paying off.
mod algorithm;
mod dispersion;
mod errors;
mod hyperparams;

pub use algorithm::*;
pub use dispersion::*;
pub use errors::*;
pub use hyperparams::*;
