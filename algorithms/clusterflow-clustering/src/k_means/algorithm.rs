use crate::k_means::errors::KMeansError;
use crate::k_means::{KMeansParams, KMeansValidParams};
use clusterflow::prelude::*;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, DataMut, Ix1, Ix2, Zip};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
/// K-means clustering aims to partition a set of unlabeled observations into clusters,
/// where each observation belongs to the cluster with the nearest mean.
///
/// The mean of the points within a cluster is called *centroid*.
///
/// Given the set of centroids, you can assign an observation to a cluster
/// choosing the nearest centroid.
///
/// ## Standard algorithm
///
/// K-means is an iterative algorithm: it progressively refines the choice of centroids.
///
/// It's guaranteed to converge, even though it might not find the optimal set of centroids
/// (unfortunately it can get stuck in a local minimum, finding the optimal minimum if NP-hard!).
///
/// There are three steps in the standard algorithm (Lloyd's algorithm):
/// - initialisation step: select initial centroids using one of our provided algorithms.
/// - assignment step: assign each observation to the nearest cluster
///                    (minimum distance between the observation and the cluster's centroid);
/// - update step: recompute the centroid of each cluster as the mean of its observations. A
///                cluster which lost all of its observations keeps its previous centroid.
///
/// The initialisation step is a one-off, done at the very beginning.
/// Assignment and update are repeated in a loop until convergence is reached (either the
/// squared euclidean distance between the old and the new centroids is below `tolerance` or
/// we exceed the `max_n_iterations`).
///
/// The whole procedure is repeated `n_runs` times, drawing new initial centroids from the same
/// random generator, and the run with the smallest inertia is kept. The fit never uses a thread
/// pool: with the same seed it is reproducible bit for bit.
///
/// ## Tutorial
///
/// ```
/// use clusterflow::traits::{Fit, Predict};
/// use clusterflow_clustering::KMeans;
/// use ndarray::array;
///
/// let observations = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
/// // `n_clusters` is the only mandatory parameter, the generator is seeded for
/// // reproducibility
/// let model = KMeans::params(3).fit(&observations).expect("KMeans fitted");
/// assert_eq!(model.n_clusters(), 3);
///
/// // Predict returns the **index** of the nearest centroid for every observation
/// let memberships = model.predict(&array![[0.5, 0.5]]);
/// assert!(memberships[0] < 3);
/// ```
pub struct KMeans<F: Float> {
    centroids: Array2<F>,
    cluster_count: Array1<usize>,
    inertia: F,
}

impl<F: Float> KMeans<F> {
    /// Hyperparameters with a generator seeded with 42
    pub fn params(n_clusters: usize) -> KMeansParams<F, Xoshiro256Plus> {
        Self::params_with_seed(n_clusters, 42)
    }

    /// Hyperparameters with a fresh generator seeded with `seed`. Fitting the same table with the
    /// same seed and cluster count always gives the same model, whatever was fitted before.
    pub fn params_with_seed(n_clusters: usize, seed: u64) -> KMeansParams<F, Xoshiro256Plus> {
        KMeansParams::new(n_clusters, Xoshiro256Plus::seed_from_u64(seed))
    }

    pub fn params_with_rng<R: Rng>(n_clusters: usize, rng: R) -> KMeansParams<F, R> {
        KMeansParams::new(n_clusters, rng)
    }

    /// Return the set of centroids as a 2-dimensional matrix with shape
    /// `(n_centroids, n_features)`.
    pub fn centroids(&self) -> &Array2<F> {
        &self.centroids
    }

    /// Number of clusters of the model
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Return the number of training points belonging to each cluster
    pub fn cluster_count(&self) -> &Array1<usize> {
        &self.cluster_count
    }

    /// Return the sum of squared distances between each training point and its closest
    /// centroid.
    pub fn inertia(&self) -> F {
        self.inertia
    }
}

impl<F: Float, R: Rng + Clone, DA: Data<Elem = F>> Fit<ArrayBase<DA, Ix2>, KMeansError>
    for KMeansValidParams<F, R>
{
    type Object = KMeans<F>;

    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `fit` identifies `n_clusters` centroids based on the training data distribution.
    ///
    /// Fails if there are fewer observations than clusters or if an observation is not finite.
    fn fit(&self, observations: &ArrayBase<DA, Ix2>) -> Result<Self::Object, KMeansError> {
        let mut rng = self.rng().clone();
        let observations = observations.view();
        let n_samples = observations.nrows();

        if n_samples < self.n_clusters() {
            return Err(KMeansError::NotEnoughSamples {
                n_samples,
                n_clusters: self.n_clusters(),
            });
        }
        if observations.iter().any(|x| !x.is_finite()) {
            return Err(KMeansError::NonFinite);
        }

        let mut min_inertia = F::infinity();
        let mut best = None;
        let mut memberships = Array1::zeros(n_samples);
        let mut dists = Array1::zeros(n_samples);

        for _ in 0..self.n_runs() {
            let mut centroids = self
                .init_method()
                .run(self.n_clusters(), observations, &mut rng);
            for _ in 0..self.max_n_iterations() {
                update_cluster_memberships(&centroids, &observations, &mut memberships);
                let new_centroids = compute_centroids(&centroids, &observations, &memberships);
                let shift = squared_distance(&centroids, &new_centroids);
                centroids = new_centroids;
                if shift <= self.tolerance() {
                    break;
                }
            }

            // Inertia of the final centroids, with the memberships they induce
            update_memberships_and_dists(&centroids, &observations, &mut memberships, &mut dists);
            let inertia = dists.sum();

            // We keep the centroids which minimize the inertia (defined as the sum of
            // the squared distances of the closest centroid for all observations)
            // over the n runs of the KMeans algorithm.
            if inertia < min_inertia {
                min_inertia = inertia;
                best = Some((centroids, memberships.clone()));
            }
        }

        match best {
            Some((centroids, memberships)) => {
                let mut cluster_count = Array1::zeros(self.n_clusters());
                memberships.iter().for_each(|&c| cluster_count[c] += 1);
                Ok(KMeans {
                    centroids,
                    cluster_count,
                    inertia: min_inertia,
                })
            }
            None => Err(KMeansError::InertiaError),
        }
    }
}

impl<F: Float, DA: Data<Elem = F>> Transformer<&ArrayBase<DA, Ix2>, Array1<F>> for KMeans<F> {
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `transform` returns, for each observation, its squared distance to its centroid.
    fn transform(&self, observations: &ArrayBase<DA, Ix2>) -> Array1<F> {
        let mut dists = Array1::zeros(observations.nrows());
        update_min_dists(&self.centroids, observations, &mut dists);
        dists
    }
}

impl<F: Float, DA: Data<Elem = F>> PredictInplace<ArrayBase<DA, Ix2>, Array1<usize>>
    for KMeans<F>
{
    /// Given an input matrix `observations`, with shape `(n_observations, n_features)`,
    /// `predict` returns, for each observation, the index of the closest cluster/centroid.
    ///
    /// You can retrieve the centroid associated to an index using the
    /// [`centroids` method](#method.centroids).
    fn predict_inplace(&self, observations: &ArrayBase<DA, Ix2>, memberships: &mut Array1<usize>) {
        assert_eq!(
            observations.nrows(),
            memberships.len(),
            "The number of data points must match the number of memberships."
        );

        update_cluster_memberships(&self.centroids, observations, memberships);
    }

    fn default_target(&self, x: &ArrayBase<DA, Ix2>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}

/// K-means is an iterative algorithm.
/// We will perform the assignment and update steps until we are satisfied
/// (according to our convergence criteria).
///
/// `compute_centroids` returns a 2-dimensional array,
/// where the i-th row corresponds to the i-th cluster. Clusters without any observation keep
/// their old centroid.
fn compute_centroids<F: Float>(
    old_centroids: &Array2<F>,
    // (n_observations, n_features)
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_observations,)
    cluster_memberships: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Array2<F> {
    let n_clusters = old_centroids.nrows();
    let mut counts: Array1<usize> = Array1::zeros(n_clusters);
    let mut centroids = Array2::zeros((n_clusters, observations.ncols()));

    Zip::from(observations.rows())
        .and(cluster_memberships)
        .for_each(|observation, &cluster_membership| {
            let mut centroid = centroids.row_mut(cluster_membership);
            centroid += &observation;
            counts[cluster_membership] += 1;
        });

    Zip::from(centroids.rows_mut())
        .and(old_centroids.rows())
        .and(&counts)
        .for_each(|mut centroid, old_centroid, &cnt| {
            if cnt == 0 {
                centroid.assign(&old_centroid);
            } else {
                centroid /= F::cast(cnt);
            }
        });
    centroids
}

/// Sum of the squared euclidean distances between matching rows of `a` and `b`.
fn squared_distance<F: Float>(
    a: &ArrayBase<impl Data<Elem = F>, Ix2>,
    b: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> F {
    Zip::from(a).and(b).fold(F::zero(), |acc, &x, &y| {
        let d = x - y;
        acc + d * d
    })
}

// Update `cluster_memberships` with the index of the cluster each observation belongs to.
pub(crate) fn update_cluster_memberships<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .for_each(|observation, cluster_membership| {
            *cluster_membership = closest_centroid(centroids, &observation).0
        });
}

// Updates `dists` with the distance of each observation from its closest centroid.
pub(crate) fn update_min_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(dists)
        .for_each(|observation, dist| *dist = closest_centroid(centroids, &observation).1);
}

// Efficient combination of `update_cluster_memberships` and `update_min_dists`.
pub(crate) fn update_memberships_and_dists<F: Float>(
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    observations: &ArrayBase<impl Data<Elem = F>, Ix2>,
    cluster_memberships: &mut ArrayBase<impl DataMut<Elem = usize>, Ix1>,
    dists: &mut ArrayBase<impl DataMut<Elem = F>, Ix1>,
) {
    Zip::from(observations.axis_iter(Axis(0)))
        .and(cluster_memberships)
        .and(dists)
        .for_each(|observation, cluster_membership, dist| {
            let (m, d) = closest_centroid(centroids, &observation);
            *cluster_membership = m;
            *dist = d;
        });
}

/// Given a matrix of centroids with shape (n_centroids, n_features) and an observation,
/// return the index of the closest centroid (the index of the corresponding row in `centroids`)
/// and its squared euclidean distance. Ties go to the lowest index.
pub(crate) fn closest_centroid<F: Float>(
    // (n_centroids, n_features)
    centroids: &ArrayBase<impl Data<Elem = F>, Ix2>,
    // (n_features)
    observation: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> (usize, F) {
    let mut closest_index = 0;
    let mut minimum_distance = F::infinity();

    for (centroid_index, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = Zip::from(&centroid)
            .and(observation)
            .fold(F::zero(), |acc, &c, &o| {
                let d = c - o;
                acc + d * d
            });
        if distance < minimum_distance {
            closest_index = centroid_index;
            minimum_distance = distance;
        }
    }
    (closest_index, minimum_distance)
}

#[cfg(test)]
mod tests {
    use super::super::KMeansInit;
    use super::*;
    use approx::assert_abs_diff_eq;
    use clusterflow_datasets::generate;
    use ndarray::{array, concatenate, Array, Array1, Array2, Axis};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;

    fn function_test_1d(x: &Array2<f64>) -> Array2<f64> {
        let mut y = Array2::zeros(x.dim());
        Zip::from(&mut y).and(x).for_each(|yi, &xi| {
            if xi < 0.4 {
                *yi = xi * xi;
            } else if (0.4..0.8).contains(&xi) {
                *yi = 3. * xi + 1.;
            } else {
                *yi = f64::sin(10. * xi);
            }
        });
        y
    }

    macro_rules! calc_inertia {
        ($centroids:expr, $obs:expr, $memberships:expr) => {
            $obs.rows()
                .into_iter()
                .zip($memberships.iter())
                .map(|(row, &c)| {
                    (&row - &$centroids.row(c))
                        .mapv(|x: f64| x * x)
                        .sum()
                })
                .sum::<f64>()
        };
    }

    macro_rules! calc_memberships {
        ($centroids:expr, $obs:expr) => {{
            let mut memberships = Array1::zeros($obs.nrows());
            update_cluster_memberships(&$centroids, &$obs, &mut memberships);
            memberships
        }};
    }

    #[test]
    fn test_min_dists() {
        let centroids = array![[0.0, 1.0], [40.0, 10.0]];
        let observations = array![[3.0, 4.0], [1.0, 3.0], [25.0, 15.0]];
        let mut dists = Array1::zeros(observations.nrows());

        update_min_dists(&centroids, &observations, &mut dists);
        assert_abs_diff_eq!(dists, array![18.0, 5.0, 250.0]);
    }

    #[test]
    fn test_n_runs() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let xt = Array::random_using(100, Uniform::new(0., 1.0), &mut rng).insert_axis(Axis(1));
        let yt = function_test_1d(&xt);
        let data = concatenate(Axis(1), &[xt.view(), yt.view()]).unwrap();

        for init in &[KMeansInit::Random, KMeansInit::KMeansPlusPlus] {
            // First clustering with one run
            let model = KMeans::params_with_rng(3, rng.clone())
                .n_runs(1)
                .init_method(*init)
                .fit(&data)
                .expect("KMeans fitted");
            let memberships = model.predict(&data);
            let inertia = calc_inertia!(model.centroids(), data, memberships);
            let total_dist = model.transform(&data).sum();
            assert_abs_diff_eq!(inertia, total_dist, epsilon = 1e-5);
            assert_abs_diff_eq!(inertia, model.inertia(), epsilon = 1e-5);

            // Second clustering with 10 runs (default), the first run is the same as above
            let model2 = KMeans::params_with_rng(3, rng.clone())
                .init_method(*init)
                .fit(&data)
                .expect("KMeans fitted");
            let memberships2 = model2.predict(&data);
            let inertia2 = calc_inertia!(model2.centroids(), data, memberships2);
            assert_abs_diff_eq!(inertia2, model2.inertia(), epsilon = 1e-5);

            // Check we improve inertia
            assert!(inertia2 <= inertia);
        }
    }

    #[test]
    fn compute_centroids_works() {
        let cluster_size = 100;
        let n_features = 4;

        // Let's setup a synthetic set of observations, composed of two clusters with known means
        let cluster_1: Array2<f64> =
            Array::random((cluster_size, n_features), Uniform::new(-100., 100.));
        let memberships_1 = Array1::zeros(cluster_size);
        let expected_centroid_1 = cluster_1.sum_axis(Axis(0)) / cluster_size as f64;

        let cluster_2: Array2<f64> =
            Array::random((cluster_size, n_features), Uniform::new(-100., 100.));
        let memberships_2 = Array1::ones(cluster_size);
        let expected_centroid_2 = cluster_2.sum_axis(Axis(0)) / cluster_size as f64;

        let observations = concatenate(Axis(0), &[cluster_1.view(), cluster_2.view()]).unwrap();
        let memberships =
            concatenate(Axis(0), &[memberships_1.view(), memberships_2.view()]).unwrap();

        let old_centroids = Array2::zeros((2, n_features));
        let centroids = compute_centroids(&old_centroids, &observations, &memberships);
        assert_abs_diff_eq!(
            centroids.index_axis(Axis(0), 0),
            expected_centroid_1,
            epsilon = 1e-5
        );
        assert_abs_diff_eq!(
            centroids.index_axis(Axis(0), 1),
            expected_centroid_2,
            epsilon = 1e-5
        );

        assert_eq!(centroids.len_of(Axis(0)), 2);
    }

    #[test]
    fn empty_cluster_keeps_its_centroid() {
        let observations = array![[1.0, 2.0]];
        let memberships = array![0];
        let old_centroids = array![[0., 0.], [5., 5.]];
        let centroids = compute_centroids(&old_centroids, &observations, &memberships);
        assert_abs_diff_eq!(centroids, array![[1.0, 2.0], [5.0, 5.0]]);
    }

    #[test]
    // An observation is closest to itself.
    fn nothing_is_closer_than_self() {
        let n_centroids = 20;
        let n_features = 5;
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let centroids: Array2<f64> = Array::random_using(
            (n_centroids, n_features),
            Uniform::new(-100., 100.),
            &mut rng,
        );

        let expected_memberships = (0..n_centroids).collect::<Array1<_>>();
        assert_eq!(calc_memberships!(centroids, centroids), expected_memberships);
    }

    #[test]
    fn oracle_test_for_closest_centroid() {
        let centroids = array![[0., 0.], [1., 2.], [20., 0.], [0., 20.],];
        let observations = array![[1., 0.6], [20., 2.], [20., 0.], [7., 20.],];
        let memberships = array![0, 2, 2, 3];

        assert_eq!(calc_memberships!(centroids, observations), memberships);
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let centroids = array![[0., 0.], [2., 0.]];
        assert_eq!(closest_centroid(&centroids, &array![1., 0.]), (0, 1.));
    }

    #[test]
    fn too_many_clusters() {
        let observations = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(3).fit(&observations);
        assert!(matches!(
            res,
            Err(KMeansError::NotEnoughSamples {
                n_samples: 2,
                n_clusters: 3
            })
        ));
    }

    #[test]
    fn missing_values_are_rejected() {
        let observations = array![[0., f64::NAN], [1., 1.]];
        let res = KMeans::params(1).fit(&observations);
        assert!(matches!(res, Err(KMeansError::NonFinite)));
    }

    #[test]
    fn invalid_params_surface_as_fit_error() {
        let observations = array![[0., 0.], [1., 1.]];
        let res = KMeans::params(0).fit(&observations);
        assert!(matches!(res, Err(KMeansError::InvalidParams(_))));
    }

    #[test]
    fn single_cluster_is_the_mean() {
        let observations = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
        let model = KMeans::params(1).fit(&observations).unwrap();
        assert_abs_diff_eq!(*model.centroids(), array![[0.5, 0.5]]);
        assert_abs_diff_eq!(model.inertia(), 2.0);
        assert_eq!(model.cluster_count(), &array![4]);
    }

    #[test]
    fn corner_square_with_three_clusters() {
        let observations = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
        let model = KMeans::params(3).fit(&observations).unwrap();
        assert_eq!(model.n_clusters(), 3);
        // two corners alone, two corners sharing a centroid
        assert_abs_diff_eq!(model.inertia(), 0.5);
        assert_eq!(model.cluster_count().sum(), 4);

        let memberships = model.predict(&array![[0.5, 0.5]]);
        assert!(memberships[0] < 3);
    }

    #[test]
    fn same_seed_same_model() {
        let mut rng = Xoshiro256Plus::seed_from_u64(3);
        let data: Array2<f64> = Array::random_using((60, 3), Uniform::new(0., 1.), &mut rng);

        let first = KMeans::params(5).fit(&data).unwrap();
        let second = KMeans::params(5).fit(&data).unwrap();
        assert_eq!(first, second);

        let seeded = KMeans::params_with_seed(5, 42).fit(&data).unwrap();
        assert_eq!(seeded, first);
    }

    #[test]
    fn recovers_blob_centroids() {
        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let expected_centroids = array![[0., 1.], [-10., 20.], [-1., 10.]];
        let data = generate::blobs(100, &expected_centroids, &mut rng);

        let model = KMeans::params_with_rng(3, rng)
            .init_method(KMeansInit::KMeansPlusPlus)
            .tolerance(1e-2)
            .fit(&data)
            .expect("KMeans fitted");

        let new_observation = array![[-9., 20.5]];
        let memberships = model.predict(&new_observation);
        let closest_centroid = &model.centroids().index_axis(Axis(0), memberships[0]);
        assert_abs_diff_eq!(closest_centroid.to_owned(), array![-10., 20.], epsilon = 1e-1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip_predicts_identically() {
        let observations = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.], [0.2, 0.9]];
        let model = KMeans::params(2).fit(&observations).unwrap();

        let json = serde_json::to_string(&model).unwrap();
        let loaded: KMeans<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, model);
        assert_eq!(loaded.predict(&observations), model.predict(&observations));
    }
}
