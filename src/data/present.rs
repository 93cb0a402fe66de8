use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::aggregate::{AggregatedMetric, Dimension, GroupKey, Metric};
use super::filter::FilteredView;
use super::loader::{
    COL_COUNTRY, COL_DISASTER_TYPE, COL_DISNO, COL_NO_AFFECTED, COL_REGION, COL_START_MONTH,
    COL_START_YEAR, COL_TOTAL_DEATHS,
};

// ---------------------------------------------------------------------------
// Month labels
// ---------------------------------------------------------------------------

/// Axis labels for months 1–12. Fixed, not locale dependent.
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Label for a 1-based month, `None` outside 1–12.
pub fn month_label(month: u8) -> Option<&'static str> {
    MONTH_LABELS.get(usize::from(month).checked_sub(1)?).copied()
}

/// Keys for all twelve months, used to pin heatmap columns.
pub fn all_months() -> Vec<GroupKey> {
    (1..=12).map(GroupKey::Month).collect()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Count(u64),
    Missing,
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Count(n) => write!(f, "{n}"),
            Cell::Missing => Ok(()),
        }
    }
}

impl From<Option<u64>> for Cell {
    fn from(value: Option<u64>) -> Self {
        value.map_or(Cell::Missing, Cell::Count)
    }
}

/// Row-oriented table with display headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column titled `header`.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Aggregate as a table: one key column per dimension, then one column per
/// metric in `columns`, rows ordered by `sort_by` descending.
pub fn metric_table(agg: &AggregatedMetric, sort_by: Metric, columns: &[Metric]) -> Table {
    let headers = agg
        .dimensions()
        .iter()
        .map(|d| d.label().to_string())
        .chain(columns.iter().map(|m| m.label().to_string()))
        .collect();

    let rows = agg
        .ranked(sort_by)
        .into_iter()
        .map(|(key, totals)| {
            key.iter()
                .map(|k| Cell::Text(k.to_string()))
                .chain(columns.iter().map(|m| Cell::Count(totals.get(*m))))
                .collect()
        })
        .collect();

    Table { headers, rows }
}

/// The filtered records themselves, in file order: the required columns,
/// then every extra column the file carried.
pub fn record_table(view: &FilteredView<'_>) -> Table {
    let extra_columns = &view.dataset().extra_columns;
    let headers = [
        COL_DISNO,
        COL_START_YEAR,
        COL_START_MONTH,
        COL_DISASTER_TYPE,
        COL_REGION,
        COL_COUNTRY,
        COL_TOTAL_DEATHS,
        COL_NO_AFFECTED,
    ]
    .iter()
    .map(|h| h.to_string())
    .chain(extra_columns.iter().cloned())
    .collect();

    let text = |value: &Option<String>| value.clone().map_or(Cell::Missing, Cell::Text);
    let rows = view
        .iter()
        .map(|rec| {
            let mut row = vec![
                Cell::Text(rec.disno.clone()),
                Cell::Text(rec.start_year.to_string()),
                rec.start_month
                    .map_or(Cell::Missing, |m| Cell::Text(m.to_string())),
                text(&rec.disaster_type),
                text(&rec.region),
                text(&rec.country),
                rec.total_deaths.into(),
                rec.no_affected.into(),
            ];
            row.extend(extra_columns.iter().map(|col| text(&rec.extra.get(col).cloned())));
            row
        })
        .collect();

    Table { headers, rows }
}

// ---------------------------------------------------------------------------
// Pivot (heatmap matrix)
// ---------------------------------------------------------------------------

/// Two-dimensional cross tabulation. Every (row, column) pair has a value;
/// combinations with no records are `0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pivot {
    pub row_keys: Vec<GroupKey>,
    pub col_keys: Vec<GroupKey>,
    /// `cells[r][c]` for `row_keys[r]` × `col_keys[c]`.
    pub cells: Vec<Vec<u64>>,
}

impl Pivot {
    pub fn get(&self, row: &GroupKey, col: &GroupKey) -> Option<u64> {
        let r = self.row_keys.iter().position(|k| k == row)?;
        let c = self.col_keys.iter().position(|k| k == col)?;
        Some(self.cells[r][c])
    }

    /// Sum of every cell.
    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    /// Largest cell, `0` when empty.
    pub fn max(&self) -> u64 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() || self.col_keys.is_empty()
    }
}

/// Cross-tabulate a two-dimension aggregate.
///
/// `col_domain` adds columns that must appear even without records (all
/// twelve months); observed keys outside it are kept. Returns `None` when
/// `rows`/`cols` are not the aggregate's two dimensions.
pub fn pivot(
    agg: &AggregatedMetric,
    rows: Dimension,
    cols: Dimension,
    metric: Metric,
    col_domain: Option<&[GroupKey]>,
) -> Option<Pivot> {
    let dims = agg.dimensions();
    if dims.len() != 2 || rows == cols {
        return None;
    }
    let r_pos = dims.iter().position(|d| *d == rows)?;
    let c_pos = dims.iter().position(|d| *d == cols)?;

    let row_keys: Vec<GroupKey> = agg
        .iter()
        .map(|(key, _)| key[r_pos].clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut col_set: BTreeSet<GroupKey> = col_domain
        .map(|keys| keys.iter().cloned().collect())
        .unwrap_or_default();
    col_set.extend(agg.iter().map(|(key, _)| key[c_pos].clone()));
    let col_keys: Vec<GroupKey> = col_set.into_iter().collect();

    let mut cells = vec![vec![0; col_keys.len()]; row_keys.len()];
    for (key, totals) in agg.iter() {
        // Both key lists are sorted and hold every observed key.
        if let (Ok(r), Ok(c)) = (
            row_keys.binary_search(&key[r_pos]),
            col_keys.binary_search(&key[c_pos]),
        ) {
            cells[r][c] = totals.get(metric);
        }
    }

    Some(Pivot {
        row_keys,
        col_keys,
        cells,
    })
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

/// One bar per group of a single-dimension aggregate, in key order.
pub fn bar_series(agg: &AggregatedMetric, metric: Metric) -> Vec<(String, f64)> {
    agg.iter()
        .map(|(key, totals)| {
            let label = key
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(" / ");
            (label, totals.get(metric) as f64)
        })
        .collect()
}

/// A named polyline for a line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
}

/// One line per `series` key, x taken from the numeric `x` dimension (year
/// or month). Points are x-ordered; x values without records are absent.
pub fn line_series(
    agg: &AggregatedMetric,
    x: Dimension,
    series: Dimension,
    metric: Metric,
) -> Vec<LineSeries> {
    let dims = agg.dimensions();
    let (Some(x_pos), Some(s_pos)) = (
        dims.iter().position(|d| *d == x),
        dims.iter().position(|d| *d == series),
    ) else {
        return Vec::new();
    };

    let mut lines: BTreeMap<&GroupKey, Vec<[f64; 2]>> = BTreeMap::new();
    for (key, totals) in agg.iter() {
        let Some(xv) = key[x_pos].as_f64() else {
            continue;
        };
        lines
            .entry(&key[s_pos])
            .or_default()
            .push([xv, totals.get(metric) as f64]);
    }

    lines
        .into_iter()
        .map(|(name, mut points)| {
            points.sort_by(|a, b| a[0].total_cmp(&b[0]));
            LineSeries {
                name: name.to_string(),
                points,
            }
        })
        .collect()
}
