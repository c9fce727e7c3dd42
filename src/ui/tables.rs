use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};
use tank_analyzer::Trend;

use super::format::{format_it, format_opt_it, format_timestamp};
use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;
const HEADER_HEIGHT: f32 = 22.0;

// ---------------------------------------------------------------------------
// Shared table scaffolding
// ---------------------------------------------------------------------------

/// Striped, resizable table with one text cell per column.
fn text_table(ui: &mut Ui, id: &str, headers: &[&str], rows: usize, cell: impl Fn(usize, usize) -> RichText) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .columns(Column::auto().at_least(70.0), headers.len())
            .header(HEADER_HEIGHT, |mut header| {
                for h in headers {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*h);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows, |mut row| {
                    let r = row.index();
                    for c in 0..headers.len() {
                        row.col(|ui: &mut Ui| {
                            ui.label(cell(r, c));
                        });
                    }
                });
            });
    });
}

fn trend_color(trend: Trend) -> Option<Color32> {
    match trend {
        Trend::Decrease => Some(Color32::from_rgb(220, 80, 80)),
        Trend::Increase => Some(Color32::from_rgb(70, 170, 90)),
        Trend::Steady => None,
    }
}

// ---------------------------------------------------------------------------
// Summary: tanks and materials
// ---------------------------------------------------------------------------

pub fn summary(ui: &mut Ui, state: &AppState) {
    let report = &state.report;
    if report.is_empty() {
        ui.label("No valid measurements for this selection.");
        return;
    }

    let half = ui.available_height() / 2.0;
    ui.strong("Per tank");
    ui.allocate_ui(egui::vec2(ui.available_width(), half), |ui: &mut Ui| {
        let rows = &report.tank_rows;
        text_table(
            ui,
            "tank_table",
            &["Tank", "Material", "Gravity", "Level (hl)", "Σ f(A)", "kg", "n"],
            rows.len(),
            |r, c| {
                let t = &rows[r];
                RichText::new(match c {
                    0 => t.tank_key.clone(),
                    1 => t.last_material.clone(),
                    2 => format_it(t.last_gravity, 2),
                    3 => format_it(t.last_level, 2),
                    4 => format_it(t.sum_f_a, 6),
                    5 => format_it(t.sum_kg, 3),
                    _ => t.count.to_string(),
                })
            },
        );
    });

    ui.separator();
    ui.strong("Per material");
    let rows = &report.material_rows;
    text_table(
        ui,
        "material_table",
        &["Material", "kg", "Σ f(A)", "n"],
        rows.len(),
        |r, c| {
            let m = &rows[r];
            RichText::new(match c {
                0 => m.material.clone(),
                1 => format_it(m.sum_kg, 3),
                2 => format_it(m.sum_f_a, 6),
                _ => m.count.to_string(),
            })
        },
    );
}

// ---------------------------------------------------------------------------
// Debug: one row per contributing measurement
// ---------------------------------------------------------------------------

pub fn debug_rows(ui: &mut Ui, state: &AppState) {
    let rows = &state.report.debug_rows;
    text_table(
        ui,
        "debug_table",
        &["Time", "Tank", "Material", "Gravity", "Level (hl)", "f(A)", "kg"],
        rows.len(),
        |r, c| {
            let d = &rows[r];
            RichText::new(match c {
                0 => format_timestamp(d.timestamp),
                1 => d.tank_key.clone(),
                2 => d.material.clone(),
                3 => format_it(d.gravity, 2),
                4 => format_it(d.level, 2),
                5 => format_it(d.f_a, 6),
                _ => format_it(d.kg_extracted, 3),
            })
            .monospace()
        },
    );
}

// ---------------------------------------------------------------------------
// Variations
// ---------------------------------------------------------------------------

pub fn variations(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Load variations").clicked() {
            state.load_variations();
        }
        if ui.button("Intra-day (selected day)").clicked() {
            state.load_intraday_variations();
        }

        let tanks = state.variation_tanks();
        let current = state.variation_tank.clone().unwrap_or_else(|| "All tanks".to_string());
        egui::ComboBox::from_id_salt("variation_tank")
            .selected_text(current)
            .show_ui(ui, |ui: &mut Ui| {
                ui.selectable_value(&mut state.variation_tank, None, "All tanks");
                for tank in tanks {
                    let label = tank.clone();
                    ui.selectable_value(&mut state.variation_tank, Some(tank), label);
                }
            });
    });

    if state.variations.is_empty() {
        ui.label("No variations loaded.");
        return;
    }

    let s = state.variation_summary();
    ui.label(format!(
        "{} variations · Δ level {} hl · Δ kg {} · max rise {} hl · max drop {} hl",
        s.count,
        format_it(s.total_delta_level, 2),
        format_it(s.total_delta_kg, 3),
        format_it(s.max_increase_level, 2),
        format_it(s.max_decrease_level, 2),
    ));
    ui.separator();

    let threshold = state.config.level_change_threshold;
    let rows = state.visible_variations();
    text_table(
        ui,
        "variation_table",
        &[
            "Day", "Tank", "Material", "Level prev", "Level curr", "Δ level", "Gravity prev",
            "Gravity curr", "kg prev", "kg curr", "Δ kg",
        ],
        rows.len(),
        |r, c| {
            let v = rows[r];
            let text = RichText::new(match c {
                0 => v.day.format("%d/%m/%Y").to_string(),
                1 => v.tank_key.clone(),
                2 => v.material.clone(),
                3 => format_it(v.level_prev, 2),
                4 => format_it(v.level_curr, 2),
                5 => format_opt_it(v.delta_level, 2),
                6 => format_it(v.gravity_prev, 2),
                7 => format_it(v.gravity_curr, 2),
                8 => format_it(v.kg_prev, 3),
                9 => format_it(v.kg_curr, 3),
                _ => format_it(v.delta_kg, 3),
            });
            match trend_color(v.trend(threshold)) {
                Some(color) if c == 5 => text.color(color).strong(),
                _ => text,
            }
        },
    );
}

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

pub fn raw_rows(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };
    let headers: Vec<&str> = ds.header.iter().map(String::as_str).collect();
    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        text_table(ui, "raw_table", &headers, ds.rows.len(), |r, c| {
            RichText::new(ds.rows[r].get(c).unwrap_or_default()).monospace()
        });
    });
}
