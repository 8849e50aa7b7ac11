//! `clusterflow-datasets` reads the tables flowing into the pipeline and generates synthetic
//! ones for tests and benchmarks.
//!
//! ## Reading a table
//!
//! Training and test files are delimited text files with a header row naming the features.
//! Every cell must be numeric or missing: empty cells and the usual missing-value tokens
//! (`NA`, `NaN`, `null`, ...) become `NaN` in the resulting [`Table`](clusterflow::Table).
//!
//! ```
//! use clusterflow_datasets::table_from_csv;
//!
//! let csv = "x,y\n0,0\n0,NA\n10,10\n";
//! let table = table_from_csv(csv.as_bytes(), true, b',').unwrap();
//! assert_eq!(table.feature_names(), &["x", "y"]);
//! assert!(table.has_missing());
//! ```
//!
//! Files ending in `.gz` are decompressed on the fly by [`read_table`].
mod dataset;
pub mod generate;

pub use dataset::*;
