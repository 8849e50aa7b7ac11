use std::path::Path;

use clusterflow::{Records, Table};
use tracing::info;

use crate::error::{PipelineError, Result};

/// Read a comma separated file with a header row into a table.
///
/// Empty cells and missing-value tokens such as `NA` become missing cells. Fails with
/// [`PipelineError::MissingInput`] if the file does not exist.
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<Table<f64>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }

    let table = clusterflow_datasets::read_table(path)?;
    info!(
        path = %path.display(),
        rows = table.nsamples(),
        features = table.nfeatures(),
        "loaded table"
    );
    Ok(table)
}
