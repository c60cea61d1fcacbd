//! CSV table loading
//!
//! The header row names the columns. Cell types are inferred per cell: empty
//! is null, then integer, finite float, boolean, and text as the fallback.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tabvec_core::{Error, Result, Table, Value};
use tracing::info;

/// Load a table from a CSV file with a header row
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let table = parse_csv(BufReader::new(file))
        .map_err(|e| match e {
            Error::Schema(msg) => Error::Schema(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
    info!(
        "loaded {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Parse CSV with a header row from any reader
pub fn parse_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let mut table = Table::new(headers)?;

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        table.push_row(record.iter().map(infer_value).collect())?;
    }

    Ok(table)
}

pub fn infer_value(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Int(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        if f.is_finite() {
            return Value::Float(f);
        }
    }
    if cell.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::Text(cell.to_string())
}

fn csv_error(e: csv::Error) -> Error {
    match e.into_kind() {
        csv::ErrorKind::Io(err) => Error::Io(err),
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => Error::Schema(format!(
            "ragged row{}: expected {} fields, found {}",
            pos.map(|p| format!(" at line {}", p.line()))
                .unwrap_or_default(),
            expected_len,
            len
        )),
        other => Error::Schema(format!("malformed csv: {:?}", other)),
    }
}
