use eframe::egui::{Color32, ScrollArea, Ui};

use disaster_dash::views::{GeographicView, OverviewView, TimeSeriesView};

use crate::color::ColorMap;
use crate::state::{AppState, Page};
use crate::ui::plot::{self, XAxis};

// ---------------------------------------------------------------------------
// Central panel: active page
// ---------------------------------------------------------------------------

/// Render the charts and tables of the active page.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view disasters  (File → Open…)");
        });
        return;
    }

    ui.heading(state.page.title());
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Overview => {
                if let Some(view) = &state.overview {
                    overview(ui, view);
                }
            }
            Page::Geographic => {
                if let Some(view) = &state.geographic {
                    geographic(ui, view);
                }
            }
            Page::TimeSeries => {
                if let Some(view) = &state.time_series {
                    time_series(ui, view, &state.color_map);
                }
            }
        });
}

fn overview(ui: &mut Ui, view: &OverviewView) {
    ui.columns(2, |cols| {
        plot::bar_chart(
            &mut cols[0],
            "affected_by_type",
            "People Affected by Disaster Type",
            "No. Affected",
            &view.affected_by_type,
        );
        plot::bar_chart(
            &mut cols[1],
            "deaths_by_type",
            "Deaths by Disaster Type",
            "Total Deaths",
            &view.deaths_by_type,
        );
    });

    ui.add_space(12.0);
    ui.heading("Detailed Data");
    plot::data_table(ui, "detailed_data", &view.records, 400.0);
}

fn geographic(ui: &mut Ui, view: &GeographicView) {
    let level = view.dimension.label();

    ui.columns(2, |cols| {
        plot::bar_chart(
            &mut cols[0],
            "geo_frequency",
            &format!("Disaster Frequency by {level}"),
            "Disaster Count",
            &view.frequency,
        );
        plot::bar_chart(
            &mut cols[1],
            "geo_deaths",
            &format!("Total Deaths by {level}"),
            "Total Deaths",
            &view.deaths,
        );
    });

    ui.add_space(12.0);
    plot::heatmap(
        ui,
        &format!("Disaster Type Distribution by {level}"),
        &view.heatmap,
    );

    ui.add_space(12.0);
    ui.heading("Detailed Metrics");
    plot::data_table(ui, "geo_metrics", &view.metrics, 400.0);
}

fn time_series(ui: &mut Ui, view: &TimeSeriesView, colors: &ColorMap) {
    ui.heading("Annual Trends");
    ui.columns(2, |cols| {
        plot::line_chart(
            &mut cols[0],
            "yearly_frequency",
            "Disaster Frequency Over Time",
            "Count",
            XAxis::Year,
            &view.yearly_frequency,
            colors,
        );
        plot::line_chart(
            &mut cols[1],
            "yearly_deaths",
            "Total Deaths Over Time",
            "Total Deaths",
            XAxis::Year,
            &view.yearly_deaths,
            colors,
        );
    });

    ui.add_space(12.0);
    ui.heading("Monthly Patterns");
    ui.columns(2, |cols| {
        plot::line_chart(
            &mut cols[0],
            "monthly_frequency",
            "Monthly Distribution of Disasters",
            "Count",
            XAxis::Month,
            &view.monthly_frequency,
            colors,
        );
        plot::line_chart(
            &mut cols[1],
            "monthly_deaths",
            "Monthly Distribution of Deaths",
            "Deaths",
            XAxis::Month,
            &view.monthly_deaths,
            colors,
        );
    });
    plot::heatmap(ui, "Disaster Frequency Heatmap by Month", &view.monthly_heatmap);

    ui.add_space(12.0);
    ui.heading("Trend Analysis");
    let trend = &view.trend;
    ui.columns(2, |cols| {
        plot::trend_chart(
            &mut cols[0],
            "frequency_ma",
            "Frequency (5-year MA)",
            &trend.years,
            &trend.frequency,
            Color32::from_rgb(60, 110, 230),
        );
        plot::trend_chart(
            &mut cols[1],
            "deaths_ma",
            "Deaths (5-year MA)",
            &trend.years,
            &trend.deaths,
            Color32::from_rgb(220, 50, 50),
        );
    });

    ui.add_space(12.0);
    ui.heading("Summary Statistics");
    ui.columns(2, |cols| {
        cols[0].strong("Total Disasters by Type");
        plot::data_table(&mut cols[0], "count_by_type", &view.count_by_type, 300.0);
        cols[1].strong("Total Deaths by Type");
        plot::data_table(&mut cols[1], "deaths_by_type", &view.deaths_by_type, 300.0);
    });
}
