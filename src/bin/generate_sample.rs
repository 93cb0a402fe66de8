//! Writes a synthetic EM-DAT-shaped disaster table for trying the dashboard
//! without the real export.
//!
//! Usage: `generate_sample [OUTPUT]`. The format follows the extension:
//! `.parquet` writes Parquet, anything else CSV. Default `sample_disasters.csv`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n.max(1)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Disaster type, peak month (None = no season), log-mean deaths, log-mean affected.
const DISASTER_TYPES: [(&str, Option<u8>, f64, f64); 8] = [
    ("Flood", Some(7), 2.5, 9.5),
    ("Storm", Some(9), 2.0, 9.0),
    ("Earthquake", None, 3.0, 8.5),
    ("Drought", Some(6), 1.0, 12.0),
    ("Wildfire", Some(8), 1.0, 6.0),
    ("Landslide", Some(7), 2.5, 6.0),
    ("Epidemic", None, 3.5, 7.0),
    ("Extreme temperature", Some(1), 2.0, 7.5),
];

const COUNTRIES: [(&str, &str, &str); 14] = [
    ("India", "IND", "Asia"),
    ("China", "CHN", "Asia"),
    ("Japan", "JPN", "Asia"),
    ("Philippines", "PHL", "Asia"),
    ("Kenya", "KEN", "Africa"),
    ("Ethiopia", "ETH", "Africa"),
    ("Nigeria", "NGA", "Africa"),
    ("Italy", "ITA", "Europe"),
    ("Greece", "GRC", "Europe"),
    ("United States of America", "USA", "Americas"),
    ("Brazil", "BRA", "Americas"),
    ("Haiti", "HTI", "Americas"),
    ("Australia", "AUS", "Oceania"),
    ("Fiji", "FJI", "Oceania"),
];

#[derive(Debug, Serialize)]
struct Row {
    #[serde(rename = "DisNo.")]
    disno: String,
    #[serde(rename = "Disaster Type")]
    disaster_type: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Region")]
    region: String,
    #[serde(rename = "Start Year")]
    start_year: i64,
    #[serde(rename = "Start Month")]
    start_month: Option<i64>,
    #[serde(rename = "Total Deaths")]
    total_deaths: Option<i64>,
    #[serde(rename = "No. Affected")]
    no_affected: Option<i64>,
}

fn generate(rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for year in 1980..=2024 {
        // Recorded events grow over time, as reporting improves.
        let n_events = 40 + (year - 1980) * 2 + rng.below(20) as i64;
        for seq in 0..n_events {
            let (kind, peak, log_deaths, log_affected) =
                DISASTER_TYPES[rng.below(DISASTER_TYPES.len())];
            let (country, iso, region) = COUNTRIES[rng.below(COUNTRIES.len())];

            let start_month = if rng.chance(0.05) {
                None
            } else {
                // Zero-based month, wrapped around the year.
                let month = match peak {
                    Some(p) => (p as f64 - 1.0 + rng.gauss(0.0, 1.5))
                        .round()
                        .rem_euclid(12.0) as i64,
                    None => rng.below(12) as i64,
                };
                Some(month + 1)
            };
            let total_deaths = (!rng.chance(0.2))
                .then(|| rng.gauss(log_deaths, 1.5).exp().round() as i64);
            let no_affected = (!rng.chance(0.3))
                .then(|| rng.gauss(log_affected, 2.0).exp().round() as i64);

            rows.push(Row {
                disno: format!("{year}-{:04}-{iso}", seq + 1),
                disaster_type: kind.to_string(),
                country: country.to_string(),
                region: region.to_string(),
                start_year: year,
                start_month,
                total_deaths,
                no_affected,
            });
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn text_column<'a>(rows: &'a [Row], field: impl Fn(&'a Row) -> &'a str) -> StringArray {
    rows.iter().map(|r| Some(field(r))).collect()
}

/// pandas writes nullable integer columns as floats.
fn float_column(rows: &[Row], field: impl Fn(&Row) -> Option<i64>) -> Float64Array {
    rows.iter().map(|r| field(r).map(|v| v as f64)).collect()
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("DisNo.", DataType::Utf8, false),
        Field::new("Disaster Type", DataType::Utf8, false),
        Field::new("Country", DataType::Utf8, false),
        Field::new("Region", DataType::Utf8, false),
        Field::new("Start Year", DataType::Int64, false),
        Field::new("Start Month", DataType::Float64, true),
        Field::new("Total Deaths", DataType::Float64, true),
        Field::new("No. Affected", DataType::Float64, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(text_column(rows, |r| r.disno.as_str())),
            Arc::new(text_column(rows, |r| r.disaster_type.as_str())),
            Arc::new(text_column(rows, |r| r.country.as_str())),
            Arc::new(text_column(rows, |r| r.region.as_str())),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.start_year))),
            Arc::new(float_column(rows, |r| r.start_month)),
            Arc::new(float_column(rows, |r| r.total_deaths)),
            Arc::new(float_column(rows, |r| r.no_affected)),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating output file")?;
    let mut writer =
        ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_disasters.csv".to_string());
    let path = Path::new(&output);

    let mut rng = SimpleRng::new(42);
    let rows = generate(&mut rng);

    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") | Some("pq") => write_parquet(path, &rows)?,
        _ => write_csv(path, &rows)?,
    }

    println!("Wrote {} disaster records to {output}", rows.len());
    Ok(())
}
