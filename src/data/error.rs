use thiserror::Error;

/// Ways an input file can fail to match the disaster table layout.
///
/// I/O and parser failures are reported through `anyhow` context at the
/// loader boundary; these variants cover the cases where the bytes parse but
/// the table is not the one we expect.
///
/// `row` is where a user finds the cell: the file line for CSV (the header
/// is line 1), the 1-based record number for JSON and Parquet.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: 'Start Year' is empty")]
    MissingYear { row: usize },

    #[error("row {row}: 'Start Year' value {value} is not a whole year")]
    InvalidYear { row: usize, value: f64 },

    #[error("row {row}: 'Start Month' value {value} is outside 1-12")]
    InvalidMonth { row: usize, value: f64 },

    #[error("row {row}: '{column}' value {value} is not a non-negative whole count")]
    InvalidCount {
        row: usize,
        column: &'static str,
        value: f64,
    },
}
