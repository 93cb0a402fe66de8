use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::data::aggregate::{
    aggregate, moving_average, yearly_totals, Dimension, Metric, MOVING_AVERAGE_WINDOW,
};
use crate::data::filter::{FilterSpec, FilteredView, GeoLevel, GeoSelection};
use crate::data::model::DisasterDataset;
use crate::data::present::{
    all_months, bar_series, line_series, metric_table, pivot, record_table, LineSeries, Pivot,
    Table,
};

// ---------------------------------------------------------------------------
// Page controls
// ---------------------------------------------------------------------------

/// Types preselected on the time-series page.
pub const TIME_SERIES_DEFAULT_TYPES: usize = 3;

/// Controls of the overview page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewControls {
    pub years: RangeInclusive<i32>,
    pub disaster_types: BTreeSet<String>,
}

impl OverviewControls {
    /// Every year and every type selected.
    pub fn defaults(dataset: &DisasterDataset) -> Self {
        Self {
            years: dataset.year_range(),
            disaster_types: dataset.disaster_types.clone(),
        }
    }

    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            years: self.years.clone(),
            disaster_types: self.disaster_types.clone(),
            geography: None,
        }
    }
}

/// Controls of the geographic page. `level` is `Region` or `Country`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeographicControls {
    pub years: RangeInclusive<i32>,
    pub level: GeoLevel,
    pub disaster_types: BTreeSet<String>,
}

impl GeographicControls {
    pub fn defaults(dataset: &DisasterDataset) -> Self {
        Self {
            years: dataset.year_range(),
            level: GeoLevel::Region,
            disaster_types: dataset.disaster_types.clone(),
        }
    }

    pub fn filter_spec(&self) -> FilterSpec {
        FilterSpec {
            years: self.years.clone(),
            disaster_types: self.disaster_types.clone(),
            geography: None,
        }
    }

    /// Grouping dimension for the chosen level; `Global` groups by region.
    pub fn dimension(&self) -> Dimension {
        Dimension::for_geo(self.level).unwrap_or(Dimension::Region)
    }
}

/// Controls of the time-series page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesControls {
    pub years: RangeInclusive<i32>,
    pub level: GeoLevel,
    /// Selected values at `level`; ignored for `Global`.
    pub geo_values: BTreeSet<String>,
    pub disaster_types: BTreeSet<String>,
}

impl TimeSeriesControls {
    /// Full year range, the first few types and the first region.
    pub fn defaults(dataset: &DisasterDataset) -> Self {
        let level = GeoLevel::Region;
        Self {
            years: dataset.year_range(),
            level,
            geo_values: Self::default_geo_values(dataset, level),
            disaster_types: dataset
                .disaster_types
                .iter()
                .take(TIME_SERIES_DEFAULT_TYPES)
                .cloned()
                .collect(),
        }
    }

    /// Selection to apply after switching to `level`: its first value.
    pub fn default_geo_values(dataset: &DisasterDataset, level: GeoLevel) -> BTreeSet<String> {
        level
            .options(dataset)
            .and_then(|opts| opts.first())
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn filter_spec(&self) -> FilterSpec {
        let geography = match self.level {
            GeoLevel::Global => None,
            level => Some(GeoSelection {
                level,
                values: self.geo_values.clone(),
            }),
        };
        FilterSpec {
            years: self.years.clone(),
            disaster_types: self.disaster_types.clone(),
            geography,
        }
    }
}

// ---------------------------------------------------------------------------
// Overview page
// ---------------------------------------------------------------------------

/// Impact by disaster type plus the matching records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverviewView {
    pub matched: usize,
    pub affected_by_type: Vec<(String, f64)>,
    pub deaths_by_type: Vec<(String, f64)>,
    pub records: Table,
}

pub fn overview(dataset: &DisasterDataset, controls: &OverviewControls) -> OverviewView {
    let view = FilteredView::new(dataset, &controls.filter_spec());
    let by_type = aggregate(view.iter(), &[Dimension::DisasterType]);

    OverviewView {
        matched: view.len(),
        affected_by_type: bar_series(&by_type, Metric::Affected),
        deaths_by_type: bar_series(&by_type, Metric::Deaths),
        records: record_table(&view),
    }
}

// ---------------------------------------------------------------------------
// Geographic page
// ---------------------------------------------------------------------------

/// Frequency and impact per region or country.
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicView {
    pub dimension: Dimension,
    pub matched: usize,
    pub frequency: Vec<(String, f64)>,
    pub deaths: Vec<(String, f64)>,
    /// Geography × disaster type, disaster counts.
    pub heatmap: Pivot,
    /// Per geography, sorted by disaster count descending.
    pub metrics: Table,
}

pub fn geographic(dataset: &DisasterDataset, controls: &GeographicControls) -> GeographicView {
    let geo = controls.dimension();
    let view = FilteredView::new(dataset, &controls.filter_spec());
    let by_geo_type = aggregate(view.iter(), &[geo, Dimension::DisasterType]);
    let by_geo = aggregate(view.iter(), &[geo]);

    GeographicView {
        dimension: geo,
        matched: view.len(),
        frequency: bar_series(&by_geo, Metric::Count),
        deaths: bar_series(&by_geo, Metric::Deaths),
        heatmap: pivot(&by_geo_type, geo, Dimension::DisasterType, Metric::Count, None)
            .unwrap_or_default(),
        metrics: metric_table(
            &by_geo,
            Metric::Count,
            &[Metric::Count, Metric::Deaths, Metric::Affected],
        ),
    }
}

// ---------------------------------------------------------------------------
// Time-series page
// ---------------------------------------------------------------------------

/// Trailing moving averages over the yearly totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trend {
    pub years: Vec<i32>,
    pub deaths: Vec<Option<f64>>,
    pub frequency: Vec<Option<f64>>,
}

/// Annual and monthly patterns per disaster type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesView {
    pub matched: usize,
    pub yearly_frequency: Vec<LineSeries>,
    pub yearly_deaths: Vec<LineSeries>,
    pub monthly_frequency: Vec<LineSeries>,
    pub monthly_deaths: Vec<LineSeries>,
    /// Disaster type × month (all twelve), disaster counts.
    pub monthly_heatmap: Pivot,
    pub trend: Trend,
    pub count_by_type: Table,
    pub deaths_by_type: Table,
}

pub fn time_series(dataset: &DisasterDataset, controls: &TimeSeriesControls) -> TimeSeriesView {
    let view = FilteredView::new(dataset, &controls.filter_spec());

    let yearly = aggregate(view.iter(), &[Dimension::Year, Dimension::DisasterType]);
    let monthly = aggregate(view.iter(), &[Dimension::Month, Dimension::DisasterType]);
    let by_type = aggregate(view.iter(), &[Dimension::DisasterType]);
    let months = all_months();

    TimeSeriesView {
        matched: view.len(),
        yearly_frequency: line_series(&yearly, Dimension::Year, Dimension::DisasterType, Metric::Count),
        yearly_deaths: line_series(&yearly, Dimension::Year, Dimension::DisasterType, Metric::Deaths),
        monthly_frequency: line_series(&monthly, Dimension::Month, Dimension::DisasterType, Metric::Count),
        monthly_deaths: line_series(&monthly, Dimension::Month, Dimension::DisasterType, Metric::Deaths),
        monthly_heatmap: pivot(
            &monthly,
            Dimension::DisasterType,
            Dimension::Month,
            Metric::Count,
            Some(months.as_slice()),
        )
        .unwrap_or_default(),
        trend: trend(&view),
        count_by_type: metric_table(&by_type, Metric::Count, &[Metric::Count]),
        deaths_by_type: metric_table(&by_type, Metric::Deaths, &[Metric::Deaths]),
    }
}

fn trend(view: &FilteredView<'_>) -> Trend {
    let yearly = yearly_totals(view.iter());
    let deaths: Vec<f64> = yearly.iter().map(|(_, t)| t.deaths as f64).collect();
    let counts: Vec<f64> = yearly.iter().map(|(_, t)| t.count as f64).collect();

    Trend {
        years: yearly.iter().map(|(y, _)| *y).collect(),
        deaths: moving_average(&deaths, MOVING_AVERAGE_WINDOW),
        frequency: moving_average(&counts, MOVING_AVERAGE_WINDOW),
    }
}
