use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int32Type, Int64Type, UInt32Type, UInt64Type,
};
use arrow::record_batch::RecordBatch;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::SchemaError;
use super::model::{DisasterDataset, DisasterRecord};

// ---------------------------------------------------------------------------
// Column contract
// ---------------------------------------------------------------------------

pub const COL_START_YEAR: &str = "Start Year";
pub const COL_START_MONTH: &str = "Start Month";
pub const COL_DISASTER_TYPE: &str = "Disaster Type";
pub const COL_REGION: &str = "Region";
pub const COL_COUNTRY: &str = "Country";
pub const COL_TOTAL_DEATHS: &str = "Total Deaths";
pub const COL_NO_AFFECTED: &str = "No. Affected";
pub const COL_DISNO: &str = "DisNo.";

/// Every column the pipeline reads. Other columns are kept as display text.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_START_YEAR,
    COL_START_MONTH,
    COL_DISASTER_TYPE,
    COL_REGION,
    COL_COUNTRY,
    COL_TOTAL_DEATHS,
    COL_NO_AFFECTED,
    COL_DISNO,
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a disaster dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – the EM-DAT public export (header row with column names)
/// * `.json`    – `[{ "Start Year": 2020, "Disaster Type": "Flood", ... }, ...]`
/// * `.parquet` – same columns, numeric columns as int or float
pub fn load_file(path: &Path) -> Result<DisasterDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(SchemaError::UnsupportedExtension(other.to_string()).into()),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} disaster records ({} types, {} countries) from {}",
        dataset.len(),
        dataset.disaster_types.len(),
        dataset.countries.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Row decoding shared by every format
// ---------------------------------------------------------------------------

/// A row as it appears in the file, before range checks.
///
/// Numbers are read as `f64` because pandas exports write integer columns
/// holding nulls as floats (`12.0`).
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    #[serde(rename = "Start Year")]
    start_year: Option<f64>,
    #[serde(rename = "Start Month")]
    start_month: Option<f64>,
    #[serde(rename = "Disaster Type")]
    disaster_type: Option<String>,
    #[serde(rename = "Region")]
    region: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "Total Deaths")]
    total_deaths: Option<f64>,
    #[serde(rename = "No. Affected")]
    no_affected: Option<f64>,
    #[serde(rename = "DisNo.")]
    disno: Option<String>,
}

impl RawRecord {
    /// `row` is the user-facing location reported in errors.
    fn into_record(
        self,
        row: usize,
        extra: BTreeMap<String, String>,
    ) -> Result<DisasterRecord, SchemaError> {
        let year = self.start_year.ok_or(SchemaError::MissingYear { row })?;
        if !year.is_finite() || year.fract() != 0.0 || year.abs() > i32::MAX as f64 {
            return Err(SchemaError::InvalidYear { row, value: year });
        }

        let start_month = match self.start_month {
            None => None,
            Some(m) if (1.0..=12.0).contains(&m) && m.fract() == 0.0 => Some(m as u8),
            Some(m) => return Err(SchemaError::InvalidMonth { row, value: m }),
        };

        Ok(DisasterRecord {
            start_year: year as i32,
            start_month,
            disaster_type: non_blank(self.disaster_type),
            region: non_blank(self.region),
            country: non_blank(self.country),
            total_deaths: to_count(self.total_deaths, row, COL_TOTAL_DEATHS)?,
            no_affected: to_count(self.no_affected, row, COL_NO_AFFECTED)?,
            disno: self.disno.unwrap_or_default(),
            extra,
        })
    }
}

fn to_count(
    value: Option<f64>,
    row: usize,
    column: &'static str,
) -> Result<Option<u64>, SchemaError> {
    match value {
        None => Ok(None),
        Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as u64)),
        Some(v) => Err(SchemaError::InvalidCount {
            row,
            column,
            value: v,
        }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_required(column: &str) -> bool {
    REQUIRED_COLUMNS.contains(&column)
}

/// Fail fast on the first required column that `has` does not report.
fn check_columns(has: impl Fn(&str) -> bool) -> Result<(), SchemaError> {
    match REQUIRED_COLUMNS.iter().find(|col| !has(col)) {
        Some(col) => Err(SchemaError::MissingColumn(*col)),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one disaster per line.
/// Empty cells are nulls.
fn load_csv(path: &Path) -> Result<DisasterDataset> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    check_columns(|col| headers.iter().any(|h| h == col))?;

    let extra_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !is_required(h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        // Header is line 1.
        let fallback_line = i + 2;
        let row = result.with_context(|| format!("CSV line {fallback_line}"))?;
        let line = row
            .position()
            .map_or(fallback_line, |pos| pos.line() as usize);
        let raw: RawRecord = row
            .deserialize(Some(&headers))
            .with_context(|| format!("CSV line {line}"))?;

        let extra = extra_columns
            .iter()
            .filter_map(|(idx, name)| {
                let value = row.get(*idx)?;
                (!value.is_empty()).then(|| (name.clone(), value.to_string()))
            })
            .collect();
        records.push(raw.into_record(line, extra)?);
    }

    let names = extra_columns.into_iter().map(|(_, name)| name).collect();
    Ok(DisasterDataset::from_records(records).with_extra_columns(names))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Start Year": 2020, "Start Month": 7, "Disaster Type": "Flood", ... },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<DisasterDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;
    // Records carry the columns, so an empty array has none of them.
    if rows.is_empty() {
        check_columns(|_| false)?;
    }

    let mut records = Vec::with_capacity(rows.len());
    let mut extra_columns: Vec<String> = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        let row_no = i + 1;
        let obj = row
            .as_object()
            .with_context(|| format!("Record {row_no} is not a JSON object"))?;
        check_columns(|col| obj.contains_key(col))?;

        let raw: RawRecord = serde_json::from_value(row.clone())
            .with_context(|| format!("Record {row_no}: unexpected value types"))?;

        let mut extra = BTreeMap::new();
        for (name, value) in obj.iter().filter(|(name, _)| !is_required(name)) {
            if !extra_columns.contains(name) {
                extra_columns.push(name.clone());
            }
            let text = match value {
                JsonValue::Null => continue,
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            extra.insert(name.clone(), text);
        }
        records.push(raw.into_record(row_no, extra)?);
    }

    Ok(DisasterDataset::from_records(records).with_extra_columns(extra_columns))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet export of the table.
///
/// Numeric columns may be any Int/UInt/Float width; text columns Utf8 or
/// LargeUtf8. Works with files written by both pandas and Polars.
fn load_parquet(path: &Path) -> Result<DisasterDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    check_columns(|col| schema.index_of(col).is_ok())?;
    let extra_columns: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .filter(|name| !is_required(name))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let year = column_of(&batch, COL_START_YEAR)?;
        let month = column_of(&batch, COL_START_MONTH)?;
        let kind = column_of(&batch, COL_DISASTER_TYPE)?;
        let region = column_of(&batch, COL_REGION)?;
        let country = column_of(&batch, COL_COUNTRY)?;
        let deaths = column_of(&batch, COL_TOTAL_DEATHS)?;
        let affected = column_of(&batch, COL_NO_AFFECTED)?;
        let disno = column_of(&batch, COL_DISNO)?;
        let extras: Vec<(&String, &ArrayRef)> = extra_columns
            .iter()
            .filter_map(|name| {
                let idx = batch.schema().index_of(name).ok()?;
                Some((name, batch.column(idx)))
            })
            .collect();

        for row in 0..batch.num_rows() {
            let row_no = row_offset + row + 1;
            let ctx = || format!("Parquet row {row_no}");
            let raw = RawRecord {
                start_year: numeric_at(year, row).with_context(ctx)?,
                start_month: numeric_at(month, row).with_context(ctx)?,
                disaster_type: text_at(kind, row).with_context(ctx)?,
                region: text_at(region, row).with_context(ctx)?,
                country: text_at(country, row).with_context(ctx)?,
                total_deaths: numeric_at(deaths, row).with_context(ctx)?,
                no_affected: numeric_at(affected, row).with_context(ctx)?,
                disno: text_at(disno, row).with_context(ctx)?,
            };
            let mut extra = BTreeMap::new();
            for &(name, col) in &extras {
                if !col.is_null(row) {
                    let text = array_value_to_string(&**col, row).with_context(ctx)?;
                    extra.insert(name.clone(), text);
                }
            }
            records.push(raw.into_record(row_no, extra)?);
        }
        row_offset += batch.num_rows();
    }

    Ok(DisasterDataset::from_records(records).with_extra_columns(extra_columns))
}

// -- Parquet / Arrow helpers --

fn column_of<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a ArrayRef, SchemaError> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| SchemaError::MissingColumn(name))?;
    Ok(batch.column(idx))
}

/// Read a numeric cell of any supported width as `f64`.
fn numeric_at(col: &ArrayRef, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row) as f64,
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row) as f64,
        DataType::UInt32 => col.as_primitive::<UInt32Type>().value(row) as f64,
        DataType::UInt64 => col.as_primitive::<UInt64Type>().value(row) as f64,
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row) as f64,
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row),
        other => anyhow::bail!("expected a numeric column, got {other:?}"),
    };
    Ok(Some(value))
}

fn text_at(col: &ArrayRef, row: usize) -> Result<Option<String>> {
    if col.is_null(row) {
        return Ok(None);
    }
    match col.data_type() {
        DataType::Utf8 => Ok(Some(col.as_string::<i32>().value(row).to_string())),
        DataType::LargeUtf8 => Ok(Some(col.as_string::<i64>().value(row).to_string())),
        other => anyhow::bail!("expected a text column, got {other:?}"),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    pub(crate) const HEADER: &str =
        "DisNo.,Disaster Type,Country,Region,Start Year,Start Month,Total Deaths,No. Affected";

    /// Write `contents` to `name` inside a fresh temp dir. The file lives as
    /// long as the returned `TempDir`.
    pub(crate) fn fixture(name: &str, contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    fn schema_error(err: &anyhow::Error) -> Option<&SchemaError> {
        err.chain().find_map(|e| e.downcast_ref::<SchemaError>())
    }

    #[test]
    fn csv_rows_decode_with_nulls() {
        let (_dir, path) = fixture(
            "nulls.csv",
            &format!(
                "{HEADER},Subregion\n\
                 2020-0001-IND,Flood,India,Asia,2020,7,12,3400,Southern Asia\n\
                 2021-0002-ITA,Earthquake,Italy,Europe,2021,,,,Southern Europe\n\
                 2021-0003-USA,Storm,United States of America,Americas,2021,9.0,1.0,250.0,\n"
            ),
        );
        let ds = load_file(&path).unwrap();

        assert_eq!(ds.len(), 3);
        assert_eq!(ds.extra_columns, vec!["Subregion"]);
        assert_eq!(ds.records[0].extra["Subregion"], "Southern Asia");
        assert!(ds.records[2].extra.is_empty());
        let flood = &ds.records[0];
        assert_eq!(flood.start_year, 2020);
        assert_eq!(flood.start_month, Some(7));
        assert_eq!(flood.total_deaths, Some(12));
        assert_eq!(flood.no_affected, Some(3400));
        assert_eq!(flood.disno, "2020-0001-IND");

        let quake = &ds.records[1];
        assert_eq!(quake.start_month, None);
        assert_eq!(quake.total_deaths, None);
        assert_eq!(quake.no_affected, None);

        let storm = &ds.records[2];
        assert_eq!(storm.start_month, Some(9));
        assert_eq!(storm.no_affected, Some(250));
        assert_eq!(ds.year_bounds, Some((2020, 2021)));
    }

    #[test]
    fn csv_missing_column_fails_fast() {
        let (_dir, path) = fixture(
            "missing.csv",
            "DisNo.,Disaster Type,Country,Region,Start Year,Start Month,Total Deaths\n\
             2020-0001-IND,Flood,India,Asia,2020,7,12\n",
        );
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            schema_error(&err),
            Some(&SchemaError::MissingColumn(COL_NO_AFFECTED))
        );
    }

    #[test]
    fn csv_bad_month_names_the_row() {
        let (_dir, path) = fixture(
            "month.csv",
            &format!("{HEADER}\n2020-0001-IND,Flood,India,Asia,2020,13,1,1\n"),
        );
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            schema_error(&err),
            Some(&SchemaError::InvalidMonth { row: 2, value: 13.0 })
        );
    }

    #[test]
    fn csv_errors_name_the_file_line() {
        let (_dir, path) = fixture(
            "late.csv",
            &format!(
                "{HEADER}\n\
                 2020-0001-IND,Flood,India,Asia,2020,7,12,3400\n\
                 2020-0002-IND,Flood,India,Asia,2020,8,1,1\n\
                 2020-0003-IND,Flood,India,Asia,,8,1,1\n"
            ),
        );
        let err = load_file(&path).unwrap_err();
        assert_eq!(schema_error(&err), Some(&SchemaError::MissingYear { row: 4 }));
    }

    #[test]
    fn fractional_count_is_rejected() {
        let (_dir, path) = fixture(
            "fraction.csv",
            &format!("{HEADER}\n2020-0001-IND,Flood,India,Asia,2020,1,2,12.5\n"),
        );
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            schema_error(&err),
            Some(&SchemaError::InvalidCount {
                row: 2,
                column: COL_NO_AFFECTED,
                value: 12.5,
            })
        );
    }

    #[test]
    fn blank_categories_load_as_null() {
        let (_dir, path) = fixture(
            "blank.csv",
            &format!("{HEADER}\n2020-0001-XXX,Flood,,  ,2020,1,2,3\n"),
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.records[0].region, None);
        assert_eq!(ds.records[0].country, None);
        assert_eq!(ds.records[0].disaster_type.as_deref(), Some("Flood"));
        assert!(ds.regions.is_empty());
        assert!(ds.countries.is_empty());
    }

    #[test]
    fn csv_negative_count_is_rejected() {
        let (_dir, path) = fixture(
            "negative.csv",
            &format!("{HEADER}\n2020-0001-IND,Flood,India,Asia,2020,1,-4,1\n"),
        );
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            schema_error(&err),
            Some(SchemaError::InvalidCount {
                column: COL_TOTAL_DEATHS,
                ..
            })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load_file(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let (_dir, path) = fixture("table.xlsx", "");
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            schema_error(&err),
            Some(&SchemaError::UnsupportedExtension("xlsx".into()))
        );
    }

    #[test]
    fn json_records_decode() {
        let (_dir, path) = fixture(
            "records.json",
            r#"[
                {"DisNo.": "1990-0001-CHN", "Disaster Type": "Flood", "Country": "China",
                 "Region": "Asia", "Start Year": 1990, "Start Month": 6,
                 "Total Deaths": 40.0, "No. Affected": null},
                {"DisNo.": "1991-0002-PER", "Disaster Type": "Earthquake", "Country": "Peru",
                 "Region": "Americas", "Start Year": 1991, "Start Month": null,
                 "Total Deaths": null, "No. Affected": 1200, "Magnitude": 7.5}
            ]"#,
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.extra_columns, vec!["Magnitude"]);
        assert_eq!(ds.records[1].extra["Magnitude"], "7.5");
        assert_eq!(ds.records[0].total_deaths, Some(40));
        assert_eq!(ds.records[0].no_affected, None);
        assert_eq!(ds.records[1].start_month, None);
        assert_eq!(ds.records[1].no_affected, Some(1200));
    }

    #[test]
    fn json_missing_column_fails_fast() {
        let (_dir, path) = fixture(
            "short.json",
            r#"[{"Start Year": 1990, "Disaster Type": "Flood"}]"#,
        );
        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            schema_error(&err),
            Some(SchemaError::MissingColumn(_))
        ));
    }

    #[test]
    fn json_without_records_has_no_columns() {
        let (_dir, path) = fixture("empty.json", "[]");
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            schema_error(&err),
            Some(&SchemaError::MissingColumn(COL_START_YEAR))
        );
    }

    #[test]
    fn json_errors_name_the_record() {
        let (_dir, path) = fixture(
            "bad_month.json",
            r#"[
                {"DisNo.": "a", "Disaster Type": "Flood", "Country": "China",
                 "Region": "Asia", "Start Year": 1990, "Start Month": 6,
                 "Total Deaths": null, "No. Affected": null},
                {"DisNo.": "b", "Disaster Type": "Flood", "Country": "China",
                 "Region": "Asia", "Start Year": 1990, "Start Month": 0,
                 "Total Deaths": null, "No. Affected": null}
            ]"#,
        );
        let err = load_file(&path).unwrap_err();
        assert_eq!(
            schema_error(&err),
            Some(&SchemaError::InvalidMonth { row: 2, value: 0.0 })
        );
    }

    #[test]
    fn parquet_table_decodes() {
        let schema = Arc::new(Schema::new(vec![
            Field::new(COL_DISNO, DataType::Utf8, false),
            Field::new(COL_DISASTER_TYPE, DataType::Utf8, false),
            Field::new(COL_COUNTRY, DataType::Utf8, false),
            Field::new(COL_REGION, DataType::Utf8, false),
            Field::new(COL_START_YEAR, DataType::Int64, false),
            Field::new(COL_START_MONTH, DataType::Float64, true),
            Field::new(COL_TOTAL_DEATHS, DataType::Float64, true),
            Field::new(COL_NO_AFFECTED, DataType::Int64, true),
            Field::new("Subregion", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["2000-0001-CHL", "2001-0002-NPL"])),
                Arc::new(StringArray::from(vec!["Earthquake", "Landslide"])),
                Arc::new(StringArray::from(vec!["Chile", "Nepal"])),
                Arc::new(StringArray::from(vec!["Americas", "Asia"])),
                Arc::new(Int64Array::from(vec![2000, 2001])),
                Arc::new(Float64Array::from(vec![Some(2.0), None])),
                Arc::new(Float64Array::from(vec![None, Some(17.0)])),
                Arc::new(Int64Array::from(vec![Some(900), None])),
                Arc::new(StringArray::from(vec![Some("South America"), None])),
            ],
        )
        .unwrap();

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].start_month, Some(2));
        assert_eq!(ds.records[0].total_deaths, None);
        assert_eq!(ds.records[0].no_affected, Some(900));
        assert_eq!(ds.records[1].country.as_deref(), Some("Nepal"));
        assert_eq!(ds.extra_columns, vec!["Subregion"]);
        assert_eq!(ds.records[0].extra["Subregion"], "South America");
        assert!(ds.records[1].extra.is_empty());
        assert_eq!(ds.records[1].total_deaths, Some(17));
        assert_eq!(ds.year_bounds, Some((2000, 2001)));
    }
}
