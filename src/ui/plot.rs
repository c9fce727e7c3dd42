use chrono::NaiveDate;
use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, PlotUi, Points};
use tank_analyzer::data::daily::{self, DailySeries};

use crate::color::generate_palette;
use crate::state::AppState;

/// Lines per breakdown chart.
const TOP_N: usize = 5;

// ---------------------------------------------------------------------------
// Daily extracted kg (central panel, Charts tab)
// ---------------------------------------------------------------------------

/// Two charts over the daily series: total plus the top materials, and the
/// top tanks. x is the day offset from the first day in the series.
pub fn daily_plot(ui: &mut Ui, state: &AppState) {
    let series = &state.daily;
    let Some(first) = series.keys().next().copied() else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No dated measurements to chart");
        });
        return;
    };

    ui.label(format!(
        "Day 0 = {}; selected day highlighted",
        first.format("%d/%m/%Y")
    ));

    let height = (ui.available_height() / 2.0 - 12.0).max(120.0);
    let selected = state.selected_date();

    ui.strong(format!("Total and top {TOP_N} materials"));
    let materials = daily::top_keys(&daily::material_totals(series), TOP_N);
    Plot::new("daily_material_plot")
        .legend(Legend::default())
        .height(height)
        .x_axis_label("Day")
        .y_axis_label("kg extracted")
        .show(ui, |plot_ui| {
            let totals: PlotPoints = series
                .iter()
                .map(|(day, bucket)| [day_offset(first, *day), bucket.total_kg])
                .collect();
            plot_ui.line(Line::new(totals).name("Total").color(Color32::WHITE).width(2.5));

            for material in &materials {
                let points = daily::zero_filled(series, material, |b| &b.by_material);
                let color = state.material_colors.color_for(material);
                plot_ui.line(breakdown_line(first, &points, material, color));
            }
            highlight_day(plot_ui, first, series, selected);
        });

    ui.add_space(8.0);
    ui.strong(format!("Top {TOP_N} tanks"));
    let tanks = daily::top_keys(&daily::tank_totals(series), TOP_N);
    let palette = generate_palette(tanks.len());
    Plot::new("daily_tank_plot")
        .legend(Legend::default())
        .height(height)
        .x_axis_label("Day")
        .y_axis_label("kg extracted")
        .show(ui, |plot_ui| {
            for (tank, color) in tanks.iter().zip(palette.iter()) {
                let points = daily::zero_filled(series, tank, |b| &b.by_tank);
                plot_ui.line(breakdown_line(first, &points, tank, *color));
            }
        });
}

fn day_offset(first: NaiveDate, day: NaiveDate) -> f64 {
    (day - first).num_days() as f64
}

fn breakdown_line(first: NaiveDate, points: &[(NaiveDate, f64)], name: &str, color: Color32) -> Line<'static> {
    let points: PlotPoints = points
        .iter()
        .map(|(day, kg)| [day_offset(first, *day), *kg])
        .collect();
    Line::new(points).name(name).color(color).width(1.5)
}

fn highlight_day(plot_ui: &mut PlotUi, first: NaiveDate, series: &DailySeries, day: Option<NaiveDate>) {
    if let Some((day, bucket)) = day.and_then(|d| series.get_key_value(&d)) {
        plot_ui.points(
            Points::new(vec![[day_offset(first, *day), bucket.total_kg]])
                .radius(5.0)
                .color(Color32::YELLOW)
                .name("Selected day"),
        );
    }
}
