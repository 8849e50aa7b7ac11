use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use clusterflow::Table;
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use thiserror::Error;

/// Cell contents read as a missing value, compared after trimming whitespace
pub const MISSING_TOKENS: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A",
];

/// An error when reading a table
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("could not open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("row {row}, column {column}: {value:?} is not a finite number")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },
    #[error(transparent)]
    Table(#[from] clusterflow::Error),
}

/// Convert Gzipped CSV bytes into a table
pub fn table_from_gz_csv<R: Read>(
    gz: R,
    has_headers: bool,
    separator: u8,
) -> Result<Table<f64>, ReadError> {
    // unzip file
    let file = GzDecoder::new(gz);
    table_from_csv(file, has_headers, separator)
}

/// Convert CSV bytes into a table
///
/// With `has_headers` the first row names the features, otherwise they are named `feature-0`,
/// `feature-1`, ... Rows must all have the same number of cells.
pub fn table_from_csv<R: Read>(
    csv: R,
    has_headers: bool,
    separator: u8,
) -> Result<Table<f64>, ReadError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(has_headers)
        .delimiter(separator)
        .from_reader(csv);

    let mut feature_names = if has_headers {
        Some(
            reader
                .headers()?
                .iter()
                .map(|name| name.trim().to_string())
                .collect::<Vec<_>>(),
        )
    } else {
        None
    };

    let mut rows = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let names = feature_names.get_or_insert_with(|| {
            (0..record.len())
                .map(|i| format!("feature-{}", i))
                .collect()
        });
        let cells = record
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                parse_cell(cell).ok_or_else(|| ReadError::Parse {
                    row,
                    column: names.get(col).cloned().unwrap_or_else(|| col.to_string()),
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(cells);
    }

    let table = Table::from_rows(rows, feature_names.unwrap_or_default())?;
    Ok(table)
}

/// Read a comma separated file with a header row, decompressing it if its name ends in `.gz`
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table<f64>, ReadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let file = BufReader::new(file);

    if path.extension().map_or(false, |ext| ext == "gz") {
        table_from_gz_csv(file, true, b',')
    } else {
        table_from_csv(file, true, b',')
    }
}

/// `Some(None)` for a missing cell, `None` if the cell is not a finite number
fn parse_cell(cell: &str) -> Option<Option<f64>> {
    let cell = cell.trim();
    if MISSING_TOKENS.contains(&cell) {
        return Some(None);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_nan() => Some(None),
        // `inf`, `-infinity` and overflowing literals like `1e400`
        Ok(value) if value.is_infinite() => None,
        Ok(value) => Some(Some(value)),
        Err(_) => None,
    }
}
