use clusterflow::traits::{Fit, Predict};
use clusterflow_clustering::{DispersionScores, KMeans};
use clusterflow_datasets::generate;
use ndarray::array;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

// Fit K-Means over a range of cluster counts on synthetic blobs, then look for the elbow of
// the inertia curve.
fn main() {
    // Our random number generator, seeded for reproducibility
    let mut rng = Xoshiro256Plus::seed_from_u64(42);

    // For each of our expected centroids, generate `n` data points around it (a "blob")
    let expected_centroids = array![[10., 10.], [1., 12.], [20., 30.], [-20., 30.],];
    let data = generate::blobs(500, &expected_centroids, &mut rng);

    let mut scores = DispersionScores::new();
    let mut models = Vec::new();
    for k in 1..=10 {
        let model = KMeans::params(k).fit(&data).expect("KMeans fitted");
        println!("k = {:>2}, inertia = {:.2}", k, model.inertia());
        scores.push(k, model.inertia());
        models.push(model);
    }

    match scores.elbow().expect("valid score curve") {
        Some(k) => {
            println!("Optimal no. of clusters: {}", k);
            let memberships = models[k - 1].predict(&array![[19., 29.]]);
            println!("[19, 29] belongs to cluster {}", memberships[0]);
        }
        None => println!("No elbow found"),
    }
}
