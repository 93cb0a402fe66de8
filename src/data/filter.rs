use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use super::model::{DisasterDataset, DisasterRecord};

// ---------------------------------------------------------------------------
// Geography level
// ---------------------------------------------------------------------------

/// Granularity of the geography controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeoLevel {
    /// No geography constraint.
    Global,
    Region,
    Country,
}

impl GeoLevel {
    /// Value of `rec` at this level; `None` for [`GeoLevel::Global`] or an
    /// empty cell.
    pub fn value_of<'r>(&self, rec: &'r DisasterRecord) -> Option<&'r str> {
        match self {
            GeoLevel::Global => None,
            GeoLevel::Region => rec.region.as_deref(),
            GeoLevel::Country => rec.country.as_deref(),
        }
    }

    /// Every value the dataset holds at this level.
    pub fn options<'d>(&self, dataset: &'d DisasterDataset) -> Option<&'d BTreeSet<String>> {
        match self {
            GeoLevel::Global => None,
            GeoLevel::Region => Some(&dataset.regions),
            GeoLevel::Country => Some(&dataset.countries),
        }
    }
}

impl fmt::Display for GeoLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoLevel::Global => write!(f, "Global"),
            GeoLevel::Region => write!(f, "Region"),
            GeoLevel::Country => write!(f, "Country"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter predicate
// ---------------------------------------------------------------------------

/// Selected geography values at one level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoSelection {
    pub level: GeoLevel,
    pub values: BTreeSet<String>,
}

/// One render's worth of filter choices.
///
/// Selections are taken literally: an empty set matches nothing. Callers
/// that want "everything" must select every value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Inclusive `start_year` bounds.
    pub years: RangeInclusive<i32>,
    pub disaster_types: BTreeSet<String>,
    /// `None` (or a `Global` level) skips the geography predicate.
    pub geography: Option<GeoSelection>,
}

impl FilterSpec {
    /// Whether a single record passes every predicate.
    pub fn matches(&self, rec: &DisasterRecord) -> bool {
        if !self.years.contains(&rec.start_year) {
            return false;
        }
        match rec.disaster_type.as_deref() {
            Some(kind) if self.disaster_types.contains(kind) => {}
            _ => return false,
        }
        match &self.geography {
            Some(sel) if sel.level != GeoLevel::Global => sel
                .level
                .value_of(rec)
                .is_some_and(|value| sel.values.contains(value)),
            _ => true,
        }
    }
}

/// Return indices of records that pass all predicates, in dataset order.
pub fn filtered_indices(dataset: &DisasterDataset, spec: &FilterSpec) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| spec.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

// ---------------------------------------------------------------------------
// FilteredView – borrowed subset of the dataset
// ---------------------------------------------------------------------------

/// The records passing a [`FilterSpec`], borrowed from the dataset.
#[derive(Debug, Clone)]
pub struct FilteredView<'d> {
    dataset: &'d DisasterDataset,
    indices: Vec<usize>,
}

impl<'d> FilteredView<'d> {
    pub fn new(dataset: &'d DisasterDataset, spec: &FilterSpec) -> Self {
        Self {
            dataset,
            indices: filtered_indices(dataset, spec),
        }
    }

    /// A view over every record.
    pub fn all(dataset: &'d DisasterDataset) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    pub fn dataset(&self) -> &'d DisasterDataset {
        self.dataset
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'d DisasterRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn dataset() -> DisasterDataset {
        DisasterDataset::from_records(vec![
            record(1998, Some(1), "Flood", "Asia", "India", Some(10), Some(100)),
            record(2000, Some(5), "Drought", "Africa", "Kenya", None, Some(5000)),
            record(2003, None, "Earthquake", "Europe", "Italy", Some(300), None),
            record(2005, Some(8), "Flood", "Americas", "Brazil", Some(2), Some(40)),
            record(2010, Some(2), "Storm", "Asia", "Japan", Some(7), Some(70)),
        ])
    }

    fn types(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn spec(years: RangeInclusive<i32>, kinds: &[&str]) -> FilterSpec {
        FilterSpec {
            years,
            disaster_types: types(kinds),
            geography: None,
        }
    }

    #[test]
    fn year_range_is_inclusive_on_both_ends() {
        let ds = dataset();
        let all = types(&["Flood", "Drought", "Earthquake", "Storm"]);
        for lo in 1995..=2012 {
            for hi in lo..=2012 {
                let s = FilterSpec {
                    years: lo..=hi,
                    disaster_types: all.clone(),
                    geography: None,
                };
                let view = FilteredView::new(&ds, &s);
                assert!(view.iter().all(|r| lo <= r.start_year && r.start_year <= hi));
                let expected = ds
                    .records
                    .iter()
                    .filter(|r| (lo..=hi).contains(&r.start_year))
                    .count();
                assert_eq!(view.len(), expected);
            }
        }
    }

    #[test]
    fn type_membership_is_exact() {
        let ds = dataset();
        let view = FilteredView::new(&ds, &spec(1900..=2100, &["Flood", "Fl"]));
        assert_eq!(view.indices(), &[0, 3]);
        assert!(view.iter().all(|r| r.disaster_type.as_deref() == Some("Flood")));
    }

    #[test]
    fn empty_type_selection_yields_nothing() {
        let ds = dataset();
        let view = FilteredView::new(&ds, &spec(1900..=2100, &[]));
        assert!(view.is_empty());
    }

    #[test]
    fn empty_geography_selection_yields_nothing() {
        let ds = dataset();
        let mut s = spec(1900..=2100, &["Flood", "Storm"]);
        s.geography = Some(GeoSelection {
            level: GeoLevel::Region,
            values: BTreeSet::new(),
        });
        assert!(filtered_indices(&ds, &s).is_empty());
    }

    #[test]
    fn predicates_compose_conjunctively() {
        let ds = dataset();
        let mut s = spec(1990..=2008, &["Flood", "Storm"]);
        s.geography = Some(GeoSelection {
            level: GeoLevel::Region,
            values: types(&["Asia"]),
        });
        // Storm/Asia is out of years, Flood/Americas is out of region.
        assert_eq!(filtered_indices(&ds, &s), vec![0]);
    }

    #[test]
    fn country_level_filters_on_country() {
        let ds = dataset();
        let mut s = spec(1900..=2100, &["Flood", "Storm"]);
        s.geography = Some(GeoSelection {
            level: GeoLevel::Country,
            values: types(&["Japan", "Brazil"]),
        });
        assert_eq!(filtered_indices(&ds, &s), vec![3, 4]);
    }

    #[test]
    fn global_level_applies_no_geography_predicate() {
        let ds = dataset();
        let mut s = spec(1900..=2100, &["Flood"]);
        s.geography = Some(GeoSelection {
            level: GeoLevel::Global,
            values: BTreeSet::new(),
        });
        assert_eq!(filtered_indices(&ds, &s), vec![0, 3]);
    }

    #[test]
    fn null_categories_never_match() {
        let mut no_region = record(2001, Some(4), "Flood", "Asia", "Laos", Some(1), None);
        no_region.region = None;
        let mut no_type = record(2001, Some(4), "Flood", "Asia", "Laos", Some(1), None);
        no_type.disaster_type = None;
        let ds = DisasterDataset::from_records(vec![no_region, no_type]);

        let mut s = spec(1900..=2100, &["Flood"]);
        assert_eq!(filtered_indices(&ds, &s), vec![0]);

        s.geography = Some(GeoSelection {
            level: GeoLevel::Region,
            values: types(&["Asia", ""]),
        });
        assert!(filtered_indices(&ds, &s).is_empty());
    }

    #[test]
    fn reversed_year_range_selects_nothing() {
        let ds = dataset();
        #[allow(clippy::reversed_empty_ranges)]
        let s = spec(2010..=1990, &["Flood", "Storm"]);
        assert!(filtered_indices(&ds, &s).is_empty());
    }

    #[test]
    fn filtering_leaves_the_dataset_untouched() {
        let ds = dataset();
        let before = ds.records.clone();
        let _ = FilteredView::new(&ds, &spec(2000..=2000, &["Drought"]));
        assert_eq!(ds.records, before);
    }
}
