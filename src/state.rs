use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use disaster_dash::data::cache::DatasetCache;
use disaster_dash::data::model::DisasterDataset;
use disaster_dash::views::{
    self, GeographicControls, GeographicView, OverviewControls, OverviewView, TimeSeriesControls,
    TimeSeriesView,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Dashboard pages. Each runs its own filter → aggregate pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Geographic,
    TimeSeries,
}

impl Page {
    pub const ALL: [Page; 3] = [Page::Overview, Page::Geographic, Page::TimeSeries];

    pub fn title(&self) -> &'static str {
        match self {
            Page::Overview => "Global Disaster Analytics",
            Page::Geographic => "Geographic Disaster Analysis",
            Page::TimeSeries => "Disaster Time Series Analysis",
        }
    }

    pub fn tab_label(&self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Geographic => "Geographic",
            Page::TimeSeries => "Time Series",
        }
    }
}

/// Filter controls of every page, seeded from the dataset.
#[derive(Debug, Clone)]
pub struct Controls {
    pub overview: OverviewControls,
    pub geographic: GeographicControls,
    pub time_series: TimeSeriesControls,
}

impl Controls {
    fn defaults(dataset: &DisasterDataset) -> Self {
        Self {
            overview: OverviewControls::defaults(dataset),
            geographic: GeographicControls::defaults(dataset),
            time_series: TimeSeriesControls::defaults(dataset),
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Memoized loads; reopening a file never re-reads it.
    pub cache: DatasetCache,

    /// Loaded dataset (None until a file loads).
    pub dataset: Option<Arc<DisasterDataset>>,

    /// Path of the loaded dataset.
    pub source: Option<PathBuf>,

    pub page: Page,

    /// Per-page controls (None until a file loads).
    pub controls: Option<Controls>,

    /// Page outputs, cleared on every control change and rebuilt lazily.
    pub overview: Option<OverviewView>,
    pub geographic: Option<GeographicView>,
    pub time_series: Option<TimeSeriesView>,

    /// Colour per disaster type.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: DatasetCache::new(),
            dataset: None,
            source: None,
            page: Page::Overview,
            controls: None,
            overview: None,
            geographic: None,
            time_series: None,
            color_map: ColorMap::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Load `path` (or reuse the memoized load) and make it the active dataset.
    /// A failure leaves the previous dataset in place and reports the error.
    pub fn open(&mut self, path: &Path) {
        match self.cache.get_or_load(path) {
            Ok(dataset) => {
                self.set_dataset(dataset);
                self.source = Some(path.to_path_buf());
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a dataset, reset controls to their defaults and colour by type.
    pub fn set_dataset(&mut self, dataset: Arc<DisasterDataset>) {
        self.controls = Some(Controls::defaults(&dataset));
        self.color_map = ColorMap::new(&dataset.disaster_types);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.invalidate();
    }

    /// Drop every page output after a control change.
    pub fn invalidate(&mut self) {
        self.overview = None;
        self.geographic = None;
        self.time_series = None;
    }

    /// Rebuild the active page's output if a control changed since the last frame.
    pub fn refresh(&mut self) {
        let (Some(ds), Some(controls)) = (&self.dataset, &self.controls) else {
            return;
        };
        match self.page {
            Page::Overview if self.overview.is_none() => {
                log::debug!("Recomputing overview: {:?}", controls.overview);
                self.overview = Some(views::overview(ds, &controls.overview));
            }
            Page::Geographic if self.geographic.is_none() => {
                log::debug!("Recomputing geographic view: {:?}", controls.geographic);
                self.geographic = Some(views::geographic(ds, &controls.geographic));
            }
            Page::TimeSeries if self.time_series.is_none() => {
                log::debug!("Recomputing time series: {:?}", controls.time_series);
                self.time_series = Some(views::time_series(ds, &controls.time_series));
            }
            _ => {}
        }
    }

    /// Records matched by the active page's filters, if computed.
    pub fn visible_count(&self) -> Option<usize> {
        match self.page {
            Page::Overview => self.overview.as_ref().map(|v| v.matched),
            Page::Geographic => self.geographic.as_ref().map(|v| v.matched),
            Page::TimeSeries => self.time_series.as_ref().map(|v| v.matched),
        }
    }
}

/// Toggle a single value in a multiselect.
pub fn toggle(selected: &mut BTreeSet<String>, value: &str) {
    if !selected.remove(value) {
        selected.insert(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use disaster_dash::data::model::DisasterRecord;

    fn dataset() -> Arc<DisasterDataset> {
        let rec = |year, kind: &str, region: &str| DisasterRecord {
            start_year: year,
            start_month: Some(1),
            disaster_type: Some(kind.to_string()),
            region: Some(region.to_string()),
            country: Some(format!("{region}-land")),
            total_deaths: Some(1),
            no_affected: None,
            disno: format!("{year}-{kind}"),
            extra: Default::default(),
        };
        Arc::new(DisasterDataset::from_records(vec![
            rec(2000, "Flood", "Asia"),
            rec(2001, "Storm", "Europe"),
        ]))
    }

    #[test]
    fn refresh_builds_only_the_active_page() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.refresh();

        assert_eq!(state.visible_count(), Some(2));
        assert!(state.geographic.is_none());

        state.page = Page::TimeSeries;
        state.refresh();
        // Defaults pick the first region only.
        assert_eq!(state.visible_count(), Some(1));
    }

    #[test]
    fn control_change_recomputes_after_invalidate() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.refresh();

        if let Some(c) = state.controls.as_mut() {
            toggle(&mut c.overview.disaster_types, "Flood");
        }
        state.invalidate();
        state.refresh();
        assert_eq!(state.visible_count(), Some(1));
    }

    #[test]
    fn failed_open_keeps_state_and_reports() {
        let mut state = AppState::default();
        state.open(Path::new("/nonexistent/disasters.csv"));
        assert!(state.dataset.is_none());
        assert!(state.status_message.is_some());
    }

    #[test]
    fn toggle_flips_membership() {
        let mut set = BTreeSet::new();
        toggle(&mut set, "Flood");
        assert!(set.contains("Flood"));
        toggle(&mut set, "Flood");
        assert!(set.is_empty());
    }
}
