use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

use super::filter::GeoLevel;
use super::model::DisasterRecord;
use super::present::month_label;

// ---------------------------------------------------------------------------
// Grouping dimensions and keys
// ---------------------------------------------------------------------------

/// A categorical column records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dimension {
    DisasterType,
    Region,
    Country,
    Year,
    Month,
}

impl Dimension {
    /// Grouping key of `rec`, `None` when the record has no value (unknown
    /// month, empty category). Such records are left out of the grouping.
    pub fn key_of(&self, rec: &DisasterRecord) -> Option<GroupKey> {
        match self {
            Dimension::DisasterType => rec.disaster_type.clone().map(GroupKey::Text),
            Dimension::Region => rec.region.clone().map(GroupKey::Text),
            Dimension::Country => rec.country.clone().map(GroupKey::Text),
            Dimension::Year => Some(GroupKey::Year(rec.start_year)),
            Dimension::Month => rec.start_month.map(GroupKey::Month),
        }
    }

    /// Display label used for table headers and axes.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::DisasterType => "Disaster Type",
            Dimension::Region => "Region",
            Dimension::Country => "Country",
            Dimension::Year => "Year",
            Dimension::Month => "Month",
        }
    }

    /// The dimension grouping by a geography level; `None` for `Global`.
    pub fn for_geo(level: GeoLevel) -> Option<Dimension> {
        match level {
            GeoLevel::Global => None,
            GeoLevel::Region => Some(Dimension::Region),
            GeoLevel::Country => Some(Dimension::Country),
        }
    }
}

/// One component of a group key. Ordering is numeric for years and months
/// and lexicographic for text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Year(i32),
    Month(u8),
    Text(String),
}

impl GroupKey {
    /// Numeric position for chart axes (years and months); `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GroupKey::Year(y) => Some(*y as f64),
            GroupKey::Month(m) => Some(*m as f64),
            GroupKey::Text(_) => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Year(y) => write!(f, "{y}"),
            GroupKey::Month(m) => write!(f, "{}", month_label(*m).unwrap_or("?")),
            GroupKey::Text(s) => write!(f, "{s}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reducers
// ---------------------------------------------------------------------------

/// A reduced numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Number of records in the group.
    Count,
    /// Sum of `total_deaths`, nulls as zero.
    Deaths,
    /// Sum of `no_affected`, nulls as zero.
    Affected,
}

impl Metric {
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Count => "Disaster Count",
            Metric::Deaths => "Total Deaths",
            Metric::Affected => "No. Affected",
        }
    }
}

/// All reducers for one group, computed in a single pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub count: u64,
    pub deaths: u64,
    pub affected: u64,
}

impl Totals {
    fn add_record(&mut self, rec: &DisasterRecord) {
        self.count += 1;
        self.deaths += rec.deaths();
        self.affected += rec.affected();
    }

    fn merge(&mut self, other: &Totals) {
        self.count += other.count;
        self.deaths += other.deaths;
        self.affected += other.affected;
    }

    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Count => self.count,
            Metric::Deaths => self.deaths,
            Metric::Affected => self.affected,
        }
    }
}

// ---------------------------------------------------------------------------
// AggregatedMetric
// ---------------------------------------------------------------------------

/// Records grouped by one or more dimensions, with reduced totals per group.
/// Groups iterate in ascending key order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedMetric {
    dimensions: Vec<Dimension>,
    groups: BTreeMap<Vec<GroupKey>, Totals>,
}

/// Group `records` by `group_keys`, reducing count, deaths and affected.
pub fn aggregate<'r>(
    records: impl IntoIterator<Item = &'r DisasterRecord>,
    group_keys: &[Dimension],
) -> AggregatedMetric {
    let mut groups: BTreeMap<Vec<GroupKey>, Totals> = BTreeMap::new();

    for rec in records {
        let key: Option<Vec<GroupKey>> = group_keys.iter().map(|d| d.key_of(rec)).collect();
        if let Some(key) = key {
            groups.entry(key).or_default().add_record(rec);
        }
    }

    AggregatedMetric {
        dimensions: group_keys.to_vec(),
        groups,
    }
}

impl AggregatedMetric {
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, key: &[GroupKey]) -> Option<&Totals> {
        self.groups.get(key)
    }

    /// Groups in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&[GroupKey], &Totals)> {
        self.groups.iter().map(|(k, t)| (k.as_slice(), t))
    }

    /// Sum over every group.
    pub fn total(&self) -> Totals {
        let mut sum = Totals::default();
        for t in self.groups.values() {
            sum.merge(t);
        }
        sum
    }

    /// Collapse to the single dimension `keep`, summing the groups that
    /// share its key. Returns `None` if `keep` is not a dimension here.
    pub fn rollup(&self, keep: Dimension) -> Option<AggregatedMetric> {
        let pos = self.dimensions.iter().position(|d| *d == keep)?;
        let mut groups: BTreeMap<Vec<GroupKey>, Totals> = BTreeMap::new();
        for (key, totals) in &self.groups {
            groups
                .entry(vec![key[pos].clone()])
                .or_default()
                .merge(totals);
        }
        Some(AggregatedMetric {
            dimensions: vec![keep],
            groups,
        })
    }

    /// Groups ordered by `metric` descending, ties by key ascending.
    pub fn ranked(&self, metric: Metric) -> Vec<(&[GroupKey], &Totals)> {
        let mut rows: Vec<_> = self.iter().collect();
        // Stable sort over key-ordered input keeps ties in key order.
        rows.sort_by_key(|(_, t)| Reverse(t.get(metric)));
        rows
    }
}

// ---------------------------------------------------------------------------
// Yearly series and moving averages
// ---------------------------------------------------------------------------

/// Window of the trend-analysis moving averages, in years.
pub const MOVING_AVERAGE_WINDOW: usize = 5;

/// Per-year totals in ascending year order. Years without records are absent.
pub fn yearly_totals<'r>(records: impl IntoIterator<Item = &'r DisasterRecord>) -> Vec<(i32, Totals)> {
    aggregate(records, &[Dimension::Year])
        .iter()
        .filter_map(|(key, totals)| match key {
            [GroupKey::Year(y)] => Some((*y, *totals)),
            _ => None,
        })
        .collect()
}

/// Trailing mean over `window` consecutive points.
///
/// Positions with fewer than `window` points so far are `None`. Points are
/// consecutive entries of `values`, not calendar years.
pub fn moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }
            let slice = &values[i + 1 - window..=i];
            Some(slice.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn sample() -> Vec<DisasterRecord> {
        vec![
            record(2000, Some(1), "Flood", "Asia", "India", Some(10), Some(100)),
            record(2000, Some(1), "Flood", "Asia", "China", None, Some(50)),
            record(2001, Some(3), "Drought", "Africa", "Kenya", Some(4), None),
            record(2001, None, "Flood", "Europe", "Italy", Some(1), Some(9)),
            record(2002, Some(3), "Storm", "Asia", "Japan", Some(7), Some(70)),
            record(2002, Some(12), "Drought", "Asia", "India", None, None),
        ]
    }

    fn text(s: &str) -> GroupKey {
        GroupKey::Text(s.to_string())
    }

    #[test]
    fn sums_by_type_treat_nulls_as_zero() {
        let recs = sample();
        let agg = aggregate(&recs, &[Dimension::DisasterType]);

        assert_eq!(agg.len(), 3);
        assert_eq!(
            agg.get(&[text("Flood")]),
            Some(&Totals {
                count: 3,
                deaths: 11,
                affected: 159
            })
        );
        assert_eq!(
            agg.get(&[text("Drought")]),
            Some(&Totals {
                count: 2,
                deaths: 4,
                affected: 0
            })
        );
    }

    #[test]
    fn count_ignores_null_values() {
        let recs = vec![record(2000, None, "Drought", "Africa", "Mali", None, None)];
        let agg = aggregate(&recs, &[Dimension::DisasterType]);
        assert_eq!(agg.get(&[text("Drought")]).map(|t| t.count), Some(1));
    }

    #[test]
    fn totals_do_not_depend_on_row_order() {
        let recs = sample();
        let expected = aggregate(&recs, &[Dimension::Region, Dimension::DisasterType]);
        for shift in 0..recs.len() {
            let mut shuffled = recs.clone();
            shuffled.rotate_left(shift);
            if shift % 2 == 1 {
                shuffled.reverse();
            }
            let agg = aggregate(&shuffled, &[Dimension::Region, Dimension::DisasterType]);
            assert_eq!(agg, expected);
        }
    }

    #[test]
    fn two_key_groups_and_rollup() {
        let recs = sample();
        let agg = aggregate(&recs, &[Dimension::Region, Dimension::DisasterType]);
        assert_eq!(
            agg.get(&[text("Asia"), text("Flood")]).map(|t| t.count),
            Some(2)
        );

        let by_region = agg.rollup(Dimension::Region).unwrap();
        assert_eq!(by_region.dimensions(), &[Dimension::Region]);
        assert_eq!(
            by_region.get(&[text("Asia")]),
            Some(&Totals {
                count: 4,
                deaths: 17,
                affected: 220
            })
        );
        assert_eq!(by_region.total(), agg.total());
        assert!(agg.rollup(Dimension::Month).is_none());
    }

    #[test]
    fn unknown_month_is_left_out_of_month_groups() {
        let recs = sample();
        let agg = aggregate(&recs, &[Dimension::Month, Dimension::DisasterType]);
        assert_eq!(agg.total().count, 5);
        assert_eq!(
            agg.get(&[GroupKey::Month(1), text("Flood")]).map(|t| t.count),
            Some(2)
        );
    }

    #[test]
    fn empty_region_is_left_out_of_region_groups() {
        let mut recs = sample();
        recs[4].region = None;
        let by_region = aggregate(&recs, &[Dimension::Region]);
        assert_eq!(by_region.total().count, 5);
        assert!(by_region.get(&[text("")]).is_none());
        assert_eq!(by_region.get(&[text("Asia")]).map(|t| t.count), Some(3));

        // Other dimensions still see the record.
        let by_type = aggregate(&recs, &[Dimension::DisasterType]);
        assert_eq!(by_type.get(&[text("Storm")]).map(|t| t.count), Some(1));
    }

    #[test]
    fn ranking_breaks_ties_by_key() {
        let recs = vec![
            record(2000, None, "Storm", "Asia", "Japan", Some(5), None),
            record(2000, None, "Flood", "Asia", "India", Some(5), None),
            record(2000, None, "Drought", "Africa", "Chad", Some(9), None),
            record(2000, None, "Wildfire", "Oceania", "Australia", Some(1), None),
        ];
        let agg = aggregate(&recs, &[Dimension::DisasterType]);
        let order: Vec<String> = agg
            .ranked(Metric::Deaths)
            .into_iter()
            .map(|(k, _)| k[0].to_string())
            .collect();
        assert_eq!(order, vec!["Drought", "Flood", "Storm", "Wildfire"]);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let agg = aggregate(std::iter::empty(), &[Dimension::Year, Dimension::DisasterType]);
        assert!(agg.is_empty());
        assert_eq!(agg.total(), Totals::default());
        assert!(yearly_totals(std::iter::empty()).is_empty());
        assert!(moving_average(&[], MOVING_AVERAGE_WINDOW).is_empty());
    }

    #[test]
    fn yearly_totals_are_year_ordered() {
        let recs = sample();
        let years: Vec<(i32, u64)> = yearly_totals(recs.iter().rev())
            .into_iter()
            .map(|(y, t)| (y, t.count))
            .collect();
        assert_eq!(years, vec![(2000, 2), (2001, 2), (2002, 2)]);
    }

    #[test]
    fn five_point_moving_average() {
        let ma = moving_average(&[10.0, 20.0, 30.0, 40.0, 50.0, 60.0], 5);
        assert_eq!(ma, vec![None, None, None, None, Some(30.0), Some(40.0)]);
    }

    #[test]
    fn moving_average_shorter_than_window() {
        assert_eq!(moving_average(&[1.0, 2.0], 5), vec![None, None]);
        assert_eq!(moving_average(&[3.0], 1), vec![Some(3.0)]);
        assert_eq!(moving_average(&[3.0], 0), vec![None]);
    }
}
