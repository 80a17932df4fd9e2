//! Machine time-series dataset - flat CSV, read fresh on each lookup

use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// One CSV row as a JSON record, columns in header order
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset: {0}")]
    Csv(#[from] csv::Error),

    #[error("Dataset has no '{0}' column")]
    MissingColumn(String),
}

/// All rows whose `key_column` equals `machine_id`, in file order
pub fn find_machine_rows(
    path: &Path,
    key_column: &str,
    machine_id: &str,
) -> Result<Vec<Record>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let headers = reader.headers()?.clone();
    let key_idx = headers
        .iter()
        .position(|h| h == key_column)
        .ok_or_else(|| DatasetError::MissingColumn(key_column.to_string()))?;

    let machine_id = machine_id.trim();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.get(key_idx) != Some(machine_id) {
            continue;
        }
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, cell)| (h.to_string(), cell_value(cell)))
                .collect(),
        );
    }

    Ok(rows)
}

/// Cells read as missing values, as the usual dataframe CSV reader treats them
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Type a cell the way a records-oriented export would: int, float, string, or null when missing
fn cell_value(cell: &str) -> Value {
    if NA_TOKENS.contains(&cell) {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(cell.to_string())
}
