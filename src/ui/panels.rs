use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use disaster_dash::data::filter::GeoLevel;
use disaster_dash::views::TimeSeriesControls;

use crate::color::ColorMap;
use crate::state::{toggle, AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filters of the active page.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };
    let page = state.page;
    let color_map = &state.color_map;
    let Some(controls) = state.controls.as_mut() else {
        return;
    };
    let bounds = dataset.year_range();
    let mut changed = false;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match page {
            Page::Overview => {
                let c = &mut controls.overview;
                changed |= year_sliders(ui, &mut c.years, &bounds);
                ui.separator();
                changed |= multiselect(
                    ui,
                    "Disaster Types",
                    &dataset.disaster_types,
                    &mut c.disaster_types,
                    Some(color_map),
                );
            }
            Page::Geographic => {
                let c = &mut controls.geographic;
                changed |= year_sliders(ui, &mut c.years, &bounds);
                ui.separator();
                changed |= level_radio(ui, &mut c.level, &[GeoLevel::Region, GeoLevel::Country]);
                ui.separator();
                changed |= multiselect(
                    ui,
                    "Disaster Types",
                    &dataset.disaster_types,
                    &mut c.disaster_types,
                    Some(color_map),
                );
            }
            Page::TimeSeries => {
                let c = &mut controls.time_series;
                changed |= year_sliders(ui, &mut c.years, &bounds);
                ui.separator();
                if level_radio(
                    ui,
                    &mut c.level,
                    &[GeoLevel::Global, GeoLevel::Region, GeoLevel::Country],
                ) {
                    c.geo_values = TimeSeriesControls::default_geo_values(&dataset, c.level);
                    changed = true;
                }
                if let Some(options) = c.level.options(&dataset) {
                    let title = match c.level {
                        GeoLevel::Country => "Countries",
                        _ => "Regions",
                    };
                    changed |= multiselect(
                        ui,
                        title,
                        options,
                        &mut c.geo_values,
                        None,
                    );
                }
                ui.separator();
                changed |= multiselect(
                    ui,
                    "Disaster Types",
                    &dataset.disaster_types,
                    &mut c.disaster_types,
                    Some(color_map),
                );
            }
        });

    if changed {
        state.invalidate();
    }
}

/// Two sliders bounding an inclusive year range. Returns whether it changed.
fn year_sliders(
    ui: &mut Ui,
    years: &mut RangeInclusive<i32>,
    bounds: &RangeInclusive<i32>,
) -> bool {
    ui.strong("Select Years");
    let (mut lo, mut hi) = (*years.start(), *years.end());
    let mut changed = ui.add(Slider::new(&mut lo, bounds.clone()).text("from")).changed();
    changed |= ui.add(Slider::new(&mut hi, bounds.clone()).text("to")).changed();
    if changed {
        hi = hi.max(lo);
        *years = lo..=hi;
    }
    changed
}

fn level_radio(ui: &mut Ui, level: &mut GeoLevel, options: &[GeoLevel]) -> bool {
    ui.strong("Select Geographic Level");
    let before = *level;
    ui.horizontal(|ui: &mut Ui| {
        for opt in options {
            ui.radio_value(level, *opt, opt.to_string());
        }
    });
    *level != before
}

/// Checkbox list with All / None shortcuts. Returns whether the selection changed.
fn multiselect(
    ui: &mut Ui,
    title: &str,
    options: &BTreeSet<String>,
    selected: &mut BTreeSet<String>,
    colors: Option<&ColorMap>,
) -> bool {
    let mut changed = false;
    let header = format!("{title}  ({}/{})", selected.len(), options.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt(title)
        .default_open(options.len() <= 30)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    *selected = options.clone();
                    changed = true;
                }
                if ui.small_button("None").clicked() {
                    selected.clear();
                    changed = true;
                }
            });

            for val in options {
                let mut checked = selected.contains(val);
                let mut text = RichText::new(val);
                if let Some(cm) = colors {
                    text = text.color(cm.color_for(val));
                }
                if ui.checkbox(&mut checked, text).changed() {
                    toggle(selected, val);
                    changed = true;
                }
            }
        });

    if selected.is_empty() {
        ui.label(RichText::new("Nothing selected: charts will be empty.").color(Color32::YELLOW));
    }
    changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for page in Page::ALL {
            ui.selectable_value(&mut state.page, page, page.tab_label());
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            let visible = state
                .visible_count()
                .map_or_else(|| "…".to_string(), |n| n.to_string());
            let source = state
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!("{source}: {} records loaded, {visible} matching", ds.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open disaster data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
