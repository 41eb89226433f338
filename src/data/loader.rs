use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value};

use super::model::{CarDataset, CarRecord, PriceRange, RowRejection, Weekday};

const MANUFACTURER_COLUMNS: &[&str] = &["manufacturer", "brand", "make"];
const BRAND_GROUP_COLUMNS: &[&str] = &["brand_group", "country", "country_group"];
const WEEKDAY_COLUMNS: &[&str] = &["weekday", "day"];
const PRICE_COLUMNS: &[&str] = &["price"];
const AGE_COLUMNS: &[&str] = &["age"];
const YEAR_COLUMNS: &[&str] = &["year"];
const MONTH_COLUMNS: &[&str] = &["month"];

/// Knobs applied while coercing raw rows into records.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub price_range: PriceRange,
    /// Brand group assigned to rows that have none.
    pub fallback_group: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            price_range: PriceRange::default(),
            fallback_group: "Other".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listings dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row; `manufacturer`, `price` required
/// * `.json`    – `[{ "manufacturer": "bmw", "price": 30000, ... }, ...]`
/// * `.parquet` – flat columns with the same names as the CSV headers
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<CarDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let mut dataset = coerce_rows(rows, options);
    dataset.source = Some(path.to_path_buf());

    log::info!(
        "Loaded {} listings from {} ({} rows rejected)",
        dataset.len(),
        path.display(),
        dataset.rejected_total()
    );
    for (kind, n) in &dataset.rejected {
        log::debug!("  rejected {n} rows: {kind}");
    }

    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Raw rows and coercion
// ---------------------------------------------------------------------------

/// A cell as it appears in the source, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Number(f64),
    Text(String),
}

impl RawCell {
    fn text(&self) -> String {
        match self {
            RawCell::Number(n) => n.to_string(),
            RawCell::Text(s) => s.trim().to_string(),
        }
    }

    fn number(&self) -> Option<f64> {
        match self {
            RawCell::Number(n) => Some(*n),
            RawCell::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|n| n.is_finite())
    }
}

/// One source row with loosely typed cells.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub manufacturer: Option<RawCell>,
    pub brand_group: Option<RawCell>,
    pub weekday: Option<RawCell>,
    pub price: Option<RawCell>,
    pub age: Option<RawCell>,
    pub year: Option<RawCell>,
    pub month: Option<RawCell>,
}

impl RawRow {
    /// Validate and coerce into a typed record.
    pub fn into_record(self, options: &LoadOptions) -> Result<CarRecord, RowRejection> {
        let manufacturer = self
            .manufacturer
            .map(|c| c.text())
            .filter(|s| !s.is_empty())
            .ok_or(RowRejection::MissingManufacturer)?;

        let price = match self.price {
            None => return Err(RowRejection::MissingPrice),
            Some(RawCell::Text(s)) if s.trim().is_empty() => {
                return Err(RowRejection::MissingPrice);
            }
            Some(cell) => cell
                .number()
                .ok_or_else(|| RowRejection::InvalidPrice(cell.text()))?,
        };
        if !options.price_range.contains(price) {
            return Err(RowRejection::PriceOutOfRange(price));
        }

        let brand_group = self
            .brand_group
            .map(|c| c.text())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| options.fallback_group.clone());

        Ok(CarRecord {
            manufacturer,
            brand_group,
            weekday: self.weekday.and_then(|c| c.text().parse::<Weekday>().ok()),
            price,
            age: self.age.and_then(|c| c.number()),
            year: self.year.and_then(|c| c.number()).map(|y| y as i32),
            month: self
                .month
                .and_then(|c| c.number())
                .filter(|m| (1.0..=12.0).contains(m))
                .map(|m| m as u32),
        })
    }
}

fn coerce_rows(rows: Vec<RawRow>, options: &LoadOptions) -> CarDataset {
    let mut records = Vec::with_capacity(rows.len());
    let mut rejections = Vec::new();

    for row in rows {
        match row.into_record(options) {
            Ok(record) => records.push(record),
            Err(rejection) => rejections.push(rejection),
        }
    }

    let mut dataset = CarDataset::from_records(records);
    for rejection in &rejections {
        dataset.record_rejection(rejection);
    }
    dataset
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Source column chosen for each field. When several accepted names are
/// present the earliest in the alias list wins.
#[derive(Debug, Clone, PartialEq)]
struct SourceColumns {
    manufacturer: &'static str,
    price: &'static str,
    brand_group: Option<&'static str>,
    weekday: Option<&'static str>,
    age: Option<&'static str>,
    year: Option<&'static str>,
    month: Option<&'static str>,
}

impl SourceColumns {
    fn resolve<S: AsRef<str>>(headers: &[S]) -> Result<Self> {
        let find = |names: &[&'static str]| find_column(headers, names);
        Ok(Self {
            manufacturer: require_column(
                find(MANUFACTURER_COLUMNS),
                MANUFACTURER_COLUMNS,
                "manufacturer",
            )?,
            price: require_column(find(PRICE_COLUMNS), PRICE_COLUMNS, "price")?,
            brand_group: find(BRAND_GROUP_COLUMNS),
            weekday: find(WEEKDAY_COLUMNS),
            age: find(AGE_COLUMNS),
            year: find(YEAR_COLUMNS),
            month: find(MONTH_COLUMNS),
        })
    }

    /// Build a row by looking each chosen column up through `cell`.
    fn row(&self, mut cell: impl FnMut(&str) -> Option<RawCell>) -> RawRow {
        let mut opt = |name: Option<&str>| name.and_then(&mut cell);
        RawRow {
            manufacturer: opt(Some(self.manufacturer)),
            brand_group: opt(self.brand_group),
            weekday: opt(self.weekday),
            price: opt(Some(self.price)),
            age: opt(self.age),
            year: opt(self.year),
            month: opt(self.month),
        }
    }
}

fn find_column<S: AsRef<str>>(headers: &[S], names: &[&'static str]) -> Option<&'static str> {
    names
        .iter()
        .copied()
        .find(|n| headers.iter().any(|h| h.as_ref() == *n))
}

fn require_column(
    found: Option<&'static str>,
    names: &[&str],
    what: &str,
) -> Result<&'static str> {
    match found {
        Some(name) => Ok(name),
        None => bail!("missing '{what}' column (accepted names: {})", names.join(", ")),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let cols = SourceColumns::resolve(&headers)?;
    let index_of = |name: &str| headers.iter().position(|h| h == name);

    reader
        .records()
        .enumerate()
        .map(|(row_no, record)| -> Result<RawRow> {
            let record = record.with_context(|| format!("CSV row {row_no}"))?;
            Ok(cols.row(|name| {
                index_of(name)
                    .and_then(|i| record.get(i))
                    .map(|s| RawCell::Text(s.to_string()))
            }))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented):
///
/// ```json
/// [
///   { "manufacturer": "toyota", "brand_group": "Japan", "price": 10000 },
///   ...
/// ]
/// ```
///
/// Required fields must appear in at least one object.
fn read_json(path: &Path) -> Result<Vec<RawRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let objects: Vec<Map<String, Value>> =
        serde_json::from_str(&text).context("parsing JSON listings")?;

    let keys: BTreeSet<&str> = objects
        .iter()
        .flat_map(|o| o.keys().map(String::as_str))
        .collect();
    let keys: Vec<&str> = keys.into_iter().collect();
    let cols = SourceColumns::resolve(&keys)?;

    Ok(objects
        .iter()
        .map(|obj| cols.row(|name| obj.get(name).and_then(json_cell)))
        .collect())
}

fn json_cell(value: &Value) -> Option<RawCell> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().map(RawCell::Number),
        Value::String(s) => Some(RawCell::Text(s.clone())),
        other => Some(RawCell::Text(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one listing per row.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        let cols = SourceColumns::resolve(&names)?;

        for row in 0..batch.num_rows() {
            rows.push(cols.row(|name| {
                batch
                    .column_by_name(name)
                    .and_then(|col| extract_cell(col, row))
            }));
        }
    }

    Ok(rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Option<RawCell> {
    if col.is_null(row) {
        return None;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => RawCell::Text(any.downcast_ref::<StringArray>()?.value(row).to_string()),
        DataType::LargeUtf8 => RawCell::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => RawCell::Number(any.downcast_ref::<Int32Array>()?.value(row) as f64),
        DataType::Int64 => RawCell::Number(any.downcast_ref::<Int64Array>()?.value(row) as f64),
        DataType::Float32 => {
            RawCell::Number(any.downcast_ref::<Float32Array>()?.value(row) as f64)
        }
        DataType::Float64 => RawCell::Number(any.downcast_ref::<Float64Array>()?.value(row)),
        DataType::Boolean => {
            RawCell::Text(any.downcast_ref::<BooleanArray>()?.value(row).to_string())
        }
        other => {
            log::debug!("ignoring parquet cell of type {other:?}");
            return None;
        }
    };
    Some(cell)
}
