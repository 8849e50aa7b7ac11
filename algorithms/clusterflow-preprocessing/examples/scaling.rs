use clusterflow::traits::{Fit, Transformer};
use clusterflow_datasets::generate;
use clusterflow_preprocessing::MinMaxScaler;
use ndarray::{array, Axis};
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

fn main() {
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let centroids = array![[10., 100.], [-5., 250.], [0., 0.]];
    let train = generate::blob_table(100, &centroids, vec!["speed", "distance"], &mut rng)
        .expect("valid table");

    // Learn the ranges on the training table only
    let scaler = MinMaxScaler::new().fit(&train).expect("scaler fitted");
    println!("feature minimums: {}", scaler.data_min());
    println!("feature maximums: {}", scaler.data_max());

    let scaled = scaler.transform(train).expect("same schema");
    println!(
        "scaled minimums: {}",
        scaled.records().fold_axis(Axis(0), f64::INFINITY, |a, b| a.min(*b))
    );

    // New observations reuse the training ranges and may fall outside [0, 1]
    let test = generate::blob_table(2, &array![[30., 500.]], vec!["speed", "distance"], &mut rng)
        .expect("valid table");
    let scaled = scaler.transform(test).expect("same schema");
    println!("scaled test rows:\n{}", scaled.records());
}
