use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

// ---------------------------------------------------------------------------
// DisasterRecord – one row of the EM-DAT table
// ---------------------------------------------------------------------------

/// A single disaster event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisasterRecord {
    /// Calendar year of onset. Always present.
    pub start_year: i32,
    /// Month of onset, 1–12, when known.
    pub start_month: Option<u8>,
    /// Categories are `None` when the cell was empty. Such records match no
    /// selection and sit in no group of that dimension.
    pub disaster_type: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    /// `None` means the cell was empty; sums treat it as zero.
    pub total_deaths: Option<u64>,
    pub no_affected: Option<u64>,
    /// EM-DAT disaster number, e.g. `2020-0123-IND`.
    pub disno: String,
    /// Non-null cells of the columns the pipeline does not read.
    pub extra: BTreeMap<String, String>,
}

impl DisasterRecord {
    /// Deaths with nulls collapsed to zero.
    pub fn deaths(&self) -> u64 {
        self.total_deaths.unwrap_or(0)
    }

    /// Affected people with nulls collapsed to zero.
    pub fn affected(&self) -> u64 {
        self.no_affected.unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// DisasterDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed value indices for the filter
/// widgets. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct DisasterDataset {
    /// All records (rows), in file order.
    pub records: Vec<DisasterRecord>,
    /// Sorted unique disaster types.
    pub disaster_types: BTreeSet<String>,
    /// Sorted unique regions.
    pub regions: BTreeSet<String>,
    /// Sorted unique countries.
    pub countries: BTreeSet<String>,
    /// Observed `(min, max)` start year, `None` for an empty table.
    pub year_bounds: Option<(i32, i32)>,
    /// Names of the extra columns, in file order when the loader knows it.
    pub extra_columns: Vec<String>,
}

impl DisasterDataset {
    /// Build value indices from the loaded records.
    pub fn from_records(records: Vec<DisasterRecord>) -> Self {
        let mut disaster_types = BTreeSet::new();
        let mut regions = BTreeSet::new();
        let mut countries = BTreeSet::new();
        let mut extra_columns = BTreeSet::new();
        let mut year_bounds: Option<(i32, i32)> = None;

        for rec in &records {
            disaster_types.extend(rec.disaster_type.clone());
            regions.extend(rec.region.clone());
            countries.extend(rec.country.clone());
            extra_columns.extend(rec.extra.keys().cloned());
            year_bounds = Some(match year_bounds {
                None => (rec.start_year, rec.start_year),
                Some((lo, hi)) => (lo.min(rec.start_year), hi.max(rec.start_year)),
            });
        }

        DisasterDataset {
            records,
            disaster_types,
            regions,
            countries,
            year_bounds,
            extra_columns: extra_columns.into_iter().collect(),
        }
    }

    /// Replace the sorted extra column names with the file's own order.
    pub fn with_extra_columns(mut self, columns: Vec<String>) -> Self {
        self.extra_columns = columns;
        self
    }

    /// Full observed year range; an empty table yields an empty range.
    pub fn year_range(&self) -> RangeInclusive<i32> {
        match self.year_bounds {
            Some((lo, hi)) => lo..=hi,
            None => 1..=0,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
