use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use chrono::NaiveDate;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::schema::{FieldKind, Schema};

use super::model::{Dataset, Record, Value};

// ---------------------------------------------------------------------------
// Source: where the dataset comes from
// ---------------------------------------------------------------------------

/// Dataset source. Only the file-backed source is implemented; a
/// connection-backed source is part of the contract but fails explicitly.
#[derive(Debug, Clone)]
pub enum Source {
    /// A delimited/columnar file with backend column names in its header.
    File(PathBuf),
    /// A database connection string plus table name. Not implemented.
    Connection { conn_str: String, table: String },
}

impl Source {
    /// Wire-shape constructor: `kind` is `"file"` or `"connection"`.
    /// For `connection`, `location` is `<conn_str>:<table>`.
    pub fn from_kind(kind: &str, location: &str) -> Result<Source> {
        match kind {
            "file" => Ok(Source::File(PathBuf::from(location))),
            "connection" => {
                let (conn_str, table) = location
                    .rsplit_once(':')
                    .ok_or_else(|| Error::UnsupportedSource(location.to_string()))?;
                Ok(Source::Connection {
                    conn_str: conn_str.to_string(),
                    table: table.to_string(),
                })
            }
            other => Err(Error::UnsupportedSource(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DataLoader: owns the schema and the loaded dataset
// ---------------------------------------------------------------------------

/// The query surface over one loaded shipment dataset.
///
/// Loads once at construction and never mutates afterwards, so a shared
/// reference can serve any number of concurrent queries.
#[derive(Debug, Clone)]
pub struct DataLoader {
    schema: Schema,
    dataset: Dataset,
}

impl DataLoader {
    /// Load a dataset from the given source. A `Connection` source fails
    /// here, at construction, rather than on first query.
    pub fn new(source: Source, schema: Schema) -> Result<DataLoader> {
        match source {
            Source::File(path) => {
                let dataset = load_file(&path, &schema)?;
                info!(
                    "loaded {} shipment rows, {} columns from {}",
                    dataset.len(),
                    dataset.column_names().len(),
                    path.display()
                );
                Ok(DataLoader { schema, dataset })
            }
            Source::Connection { .. } => Err(Error::BackendNotImplemented),
        }
    }

    /// Wrap an already-materialized dataset (rows keyed by backend names).
    pub fn from_dataset(schema: Schema, dataset: Dataset) -> DataLoader {
        DataLoader { schema, dataset }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

// ---------------------------------------------------------------------------
// File loaders
// ---------------------------------------------------------------------------

/// Load a shipment dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – delimited, header row with backend column names
/// * `.json`    – records-oriented, `[{"backend_col": value, ...}, ...]`
/// * `.parquet` – scalar columns named per the backend schema
pub fn load_file(path: &Path, schema: &Schema) -> anyhow::Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, schema),
        "json" => load_json(path, schema),
        "parquet" | "pq" => load_parquet(path, schema),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// -- CSV --

fn load_csv(path: &Path, schema: &Schema) -> anyhow::Result<Dataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        let mut row = Record::new();
        for (col_idx, raw) in record.iter().enumerate() {
            let col_name = &headers[col_idx];
            let value = parse_cell(raw, schema.kind_of_backend(col_name))
                .with_context(|| format!("CSV row {row_no}, column '{col_name}'"))?;
            row.insert(col_name.clone(), value);
        }
        rows.push(row);
    }

    Ok(Dataset::from_records(rows))
}

/// Parse one delimited cell. Columns known to the schema are typed by their
/// declared kind; anything else falls back to type guessing.
fn parse_cell(raw: &str, kind: Option<FieldKind>) -> anyhow::Result<Value> {
    if raw.is_empty() {
        return Ok(Value::Null);
    }
    match kind {
        Some(FieldKind::Float) => {
            let v: f64 = raw
                .trim()
                .parse()
                .with_context(|| format!("'{raw}' is not a number"))?;
            Ok(Value::Float(v))
        }
        Some(FieldKind::Date) => {
            let d = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("'{raw}' is not an ISO date"))?;
            Ok(Value::Date(d))
        }
        Some(FieldKind::Text) => Ok(Value::Str(raw.to_string())),
        None => Ok(guess_value_type(raw)),
    }
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Float(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::Str(s.to_string())
}

// -- JSON --

/// Records-oriented JSON, the default `df.to_json(orient='records')` shape.
fn load_json(path: &Path, schema: &Schema) -> anyhow::Result<Dataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = Record::new();
        for (key, val) in obj {
            let value = json_to_value(val, schema.kind_of_backend(key))
                .with_context(|| format!("Row {i}, column '{key}'"))?;
            row.insert(key.clone(), value);
        }
        rows.push(row);
    }

    Ok(Dataset::from_records(rows))
}

fn json_to_value(val: &JsonValue, kind: Option<FieldKind>) -> anyhow::Result<Value> {
    // Date columns arrive as ISO strings in JSON.
    if let (Some(FieldKind::Date), JsonValue::String(s)) = (kind, val) {
        let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("'{s}' is not an ISO date"))?;
        return Ok(Value::Date(d));
    }
    Ok(match val {
        JsonValue::String(s) => Value::Str(s.clone()),
        JsonValue::Number(n) => {
            if let Some(f) = n.as_f64() {
                match kind {
                    Some(FieldKind::Float) => Value::Float(f),
                    _ => n.as_i64().map(Value::Integer).unwrap_or(Value::Float(f)),
                }
            } else {
                Value::Str(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Str(other.to_string()),
    })
}

// -- Parquet --

/// Load a Parquet file with scalar shipment columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); dates may be Date32 or ISO strings.
fn load_parquet(path: &Path, schema: &Schema) -> anyhow::Result<Dataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let arrow_schema = batch.schema();

        let columns: Vec<(usize, String)> = arrow_schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row_idx in 0..batch.num_rows() {
            let mut row = Record::new();
            for (col_idx, col_name) in &columns {
                let array = batch.column(*col_idx);
                let value = extract_value(array, row_idx);
                let value = retype(value, schema.kind_of_backend(col_name))
                    .with_context(|| format!("Row {row_idx}, column '{col_name}'"))?;
                row.insert(col_name.clone(), value);
            }
            rows.push(row);
        }
    }

    Ok(Dataset::from_records(rows))
}

/// Extract a single scalar from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Value {
    if col.is_null(row) {
        return Value::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                Value::Str(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                Value::Str(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>().unwrap();
            Value::Integer(arr.value(row) as i64)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>().unwrap();
            Value::Integer(arr.value(row))
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>().unwrap();
            Value::Float(arr.value(row) as f64)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>().unwrap();
            Value::Float(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>().unwrap();
            Value::Bool(arr.value(row))
        }
        DataType::Date32 => {
            let arr = col.as_any().downcast_ref::<Date32Array>().unwrap();
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            Value::Date(epoch + chrono::Duration::days(arr.value(row) as i64))
        }
        _ => Value::Str(format!("{:?}", col.data_type())),
    }
}

/// Coerce an extracted value to the schema's declared kind where the file's
/// physical type differs (integer weights, string-encoded dates).
fn retype(value: Value, kind: Option<FieldKind>) -> anyhow::Result<Value> {
    match (kind, &value) {
        (Some(FieldKind::Float), Value::Integer(i)) => Ok(Value::Float(*i as f64)),
        (Some(FieldKind::Date), Value::Str(s)) => {
            let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .with_context(|| format!("'{s}' is not an ISO date"))?;
            Ok(Value::Date(d))
        }
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_source_fails_at_construction() {
        let source = Source::from_kind("connection", "postgres://host/db:shipments").unwrap();
        let result = DataLoader::new(source, Schema::shipping());
        assert!(matches!(result, Err(Error::BackendNotImplemented)));
    }

    #[test]
    fn unknown_source_kind_fails() {
        assert!(matches!(
            Source::from_kind("carrier_pigeon", "somewhere"),
            Err(Error::UnsupportedSource(_))
        ));
    }

    #[test]
    fn cells_are_typed_by_schema_kind() {
        let schema = Schema::shipping();
        let weight = parse_cell("12.5", schema.kind_of_backend("backend_weight_kg")).unwrap();
        assert_eq!(weight, Value::Float(12.5));

        let date = parse_cell("2024-02-01", schema.kind_of_backend("backend_pickup_date")).unwrap();
        assert_eq!(
            date,
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );

        let empty = parse_cell("", schema.kind_of_backend("backend_cost")).unwrap();
        assert_eq!(empty, Value::Null);
    }

    #[test]
    fn malformed_typed_cells_fail() {
        let schema = Schema::shipping();
        assert!(parse_cell("heavy", schema.kind_of_backend("backend_weight_kg")).is_err());
        assert!(parse_cell("02/01/2024", schema.kind_of_backend("backend_pickup_date")).is_err());
    }

    #[test]
    fn unknown_columns_fall_back_to_guessing() {
        assert_eq!(guess_value_type("7"), Value::Integer(7));
        assert_eq!(guess_value_type("7.5"), Value::Float(7.5));
        assert_eq!(guess_value_type("true"), Value::Bool(true));
        assert_eq!(guess_value_type("hello"), Value::Str("hello".into()));
    }
}
