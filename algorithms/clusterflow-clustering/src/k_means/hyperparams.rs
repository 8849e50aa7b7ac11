use crate::KMeansParamsError;

use super::init::KMeansInit;
use clusterflow::prelude::*;
use ndarray_rand::rand::Rng;

/// Checked settings of a single K-Means fit.
///
/// A sweep over cluster counts builds one of these per count, all sharing the same stopping
/// rule and restarts, and each with its own generator seeded identically. See
/// [`KMeans::params_with_seed`](crate::KMeans::params_with_seed).
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansValidParams<F: Float, R: Rng> {
    n_clusters: usize,
    n_runs: usize,
    max_n_iterations: u64,
    tolerance: F,
    init: KMeansInit,
    rng: R,
}

impl<F: Float, R: Rng> KMeansValidParams<F, R> {
    /// Number of centroids to fit
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Number of restarts, only the one with the smallest inertia is kept
    pub fn n_runs(&self) -> usize {
        self.n_runs
    }

    /// Upper bound on the Lloyd iterations of one restart. Reaching it is not an error.
    pub fn max_n_iterations(&self) -> u64 {
        self.max_n_iterations
    }

    /// A restart stops early once the squared distance between consecutive centroid sets is at
    /// most this value
    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    pub fn init_method(&self) -> KMeansInit {
        self.init
    }

    /// Generator the restarts draw their initial centroids from. It is cloned at the start of
    /// every fit, so fitting twice gives the same model.
    pub fn rng(&self) -> &R {
        &self.rng
    }
}

/// Builder of [`KMeansValidParams`].
///
/// Starts from 10 restarts of at most 300 iterations each, a tolerance of `1e-4` and random
/// initialisation, the settings the model fitting stage uses unless told otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct KMeansParams<F: Float, R: Rng>(KMeansValidParams<F, R>);

impl<F: Float, R: Rng> KMeansParams<F, R> {
    pub fn new(n_clusters: usize, rng: R) -> Self {
        KMeansParams(KMeansValidParams {
            n_clusters,
            n_runs: 10,
            max_n_iterations: 300,
            tolerance: F::cast(1e-4),
            init: KMeansInit::Random,
            rng,
        })
    }

    pub fn n_runs(mut self, n_runs: usize) -> Self {
        self.0.n_runs = n_runs;
        self
    }

    pub fn max_n_iterations(mut self, max_n_iterations: u64) -> Self {
        self.0.max_n_iterations = max_n_iterations;
        self
    }

    pub fn tolerance(mut self, tolerance: F) -> Self {
        self.0.tolerance = tolerance;
        self
    }

    /// Random observations or k-means++ seeding
    pub fn init_method(mut self, init: KMeansInit) -> Self {
        self.0.init = init;
        self
    }
}

impl<F: Float, R: Rng> ParamGuard for KMeansParams<F, R> {
    type Checked = KMeansValidParams<F, R>;
    type Error = KMeansParamsError;

    fn check_ref(&self) -> Result<&Self::Checked, Self::Error> {
        let params = &self.0;
        if params.n_clusters == 0 {
            return Err(KMeansParamsError::NClusters);
        }
        if params.n_runs == 0 {
            return Err(KMeansParamsError::NRuns);
        }
        if params.max_n_iterations == 0 {
            return Err(KMeansParamsError::MaxIterations);
        }
        // also catches NaN, which would never stop a restart early
        if !(params.tolerance.is_finite() && params.tolerance > F::zero()) {
            return Err(KMeansParamsError::Tolerance);
        }
        Ok(params)
    }

    fn check(self) -> Result<Self::Checked, Self::Error> {
        self.check_ref()?;
        Ok(self.0)
    }
}
