use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Ui, Vec2};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};

use disaster_dash::data::present::{month_label, LineSeries, Pivot, Table};

use crate::color::{heat_color, ColorMap};

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Bar charts
// ---------------------------------------------------------------------------

/// Categorical bar chart; bars sit at x = 0, 1, 2 … with the labels on the axis.
pub fn bar_chart(ui: &mut Ui, id: &str, title: &str, y_label: &str, bars: &[(String, f64)]) {
    ui.strong(title);
    if bars.is_empty() {
        ui.label("No records match the current filters.");
        return;
    }

    let labels: Vec<String> = bars.iter().map(|(l, _)| l.clone()).collect();
    let chart = BarChart::new(
        bars.iter()
            .enumerate()
            .map(|(i, (label, value))| Bar::new(i as f64, *value).name(label).width(0.7))
            .collect(),
    )
    .color(Color32::from_rgb(99, 110, 250))
    .name(y_label);

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark: GridMark, _range| category_label(&labels, mark.value))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

fn category_label(labels: &[String], x: f64) -> String {
    if x < 0.0 || x.fract() != 0.0 {
        return String::new();
    }
    labels.get(x as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Line charts
// ---------------------------------------------------------------------------

/// How the x axis of a line chart is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XAxis {
    Year,
    Month,
}

/// One coloured line per disaster type.
pub fn line_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    y_label: &str,
    axis: XAxis,
    series: &[LineSeries],
    colors: &ColorMap,
) {
    ui.strong(title);
    if series.is_empty() {
        ui.label("No records match the current filters.");
        return;
    }

    let mut plot = Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(y_label);
    plot = match axis {
        XAxis::Year => plot.x_axis_label("Start Year"),
        XAxis::Month => plot
            .x_axis_label("Month")
            .x_axis_formatter(|mark: GridMark, _range| month_axis_label(mark.value)),
    };

    plot.show(ui, |plot_ui| {
        for s in series {
            let points: PlotPoints = s.points.iter().copied().collect();
            plot_ui.line(
                Line::new(points)
                    .name(&s.name)
                    .color(colors.color_for(&s.name))
                    .width(1.5),
            );
        }
    });
}

fn month_axis_label(x: f64) -> String {
    if x.fract() != 0.0 || !(1.0..=12.0).contains(&x) {
        return String::new();
    }
    month_label(x as u8).unwrap_or_default().to_string()
}

/// A single moving-average line; positions without a value are skipped.
pub fn trend_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    years: &[i32],
    values: &[Option<f64>],
    color: Color32,
) {
    ui.strong(title);
    let points: PlotPoints = years
        .iter()
        .zip(values)
        .filter_map(|(y, v)| v.map(|v| [*y as f64, v]))
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label("Start Year")
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name(title).color(color).width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

/// Paint a pivot as a grid of coloured cells with row and column labels.
pub fn heatmap(ui: &mut Ui, title: &str, pivot: &Pivot) {
    ui.strong(title);
    if pivot.is_empty() {
        ui.label("No records match the current filters.");
        return;
    }

    let label_width = 140.0;
    let header_height = 60.0;
    let rows = pivot.row_keys.len();
    let cols = pivot.col_keys.len();
    let cell_h = 18.0_f32;
    let cell_w = ((ui.available_width() - label_width) / cols as f32).max(8.0);
    let size = Vec2::new(
        label_width + cell_w * cols as f32,
        header_height + cell_h * rows as f32,
    );

    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let font = FontId::proportional(11.0);
    let text_color = ui.visuals().text_color();
    let max = pivot.max().max(1) as f32;

    for (c, key) in pivot.col_keys.iter().enumerate() {
        let x = origin.x + label_width + (c as f32 + 0.5) * cell_w;
        painter.text(
            egui::pos2(x, origin.y + header_height - 4.0),
            Align2::CENTER_BOTTOM,
            key.to_string(),
            font.clone(),
            text_color,
        );
    }

    for (r, key) in pivot.row_keys.iter().enumerate() {
        let y = origin.y + header_height + r as f32 * cell_h;
        painter.text(
            egui::pos2(origin.x + label_width - 6.0, y + cell_h / 2.0),
            Align2::RIGHT_CENTER,
            key.to_string(),
            font.clone(),
            text_color,
        );
        for (c, value) in pivot.cells[r].iter().enumerate() {
            let min = egui::pos2(origin.x + label_width + c as f32 * cell_w, y);
            let rect = Rect::from_min_size(min, Vec2::new(cell_w, cell_h)).shrink(0.5);
            painter.rect_filled(rect, 0.0, heat_color(*value as f32 / max));
        }
    }

    if let Some(pos) = response.hover_pos() {
        let c = ((pos.x - origin.x - label_width) / cell_w).floor();
        let r = ((pos.y - origin.y - header_height) / cell_h).floor();
        if c >= 0.0 && r >= 0.0 && (c as usize) < cols && (r as usize) < rows {
            let (r, c) = (r as usize, c as usize);
            let tip = format!(
                "{} × {}: {}",
                pivot.row_keys[r], pivot.col_keys[c], pivot.cells[r][c]
            );
            response.on_hover_text_at_pointer(tip);
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Scrollable striped table; only visible rows are laid out.
pub fn data_table(ui: &mut Ui, id: &str, table: &Table, max_height: f32) {
    if table.headers.is_empty() {
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(max_height)
            .columns(Column::auto().at_least(70.0), table.headers.len())
            .header(20.0, |mut header| {
                for h in &table.headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(h);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.rows.len(), |mut row| {
                    let cells = &table.rows[row.index()];
                    for cell in cells {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell.to_string());
                        });
                    }
                });
            });
    });
}
