use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use tank_analyzer::Family;

use super::format::format_it;
use crate::state::{AppState, Tab};

// ---------------------------------------------------------------------------
// Left side panel – families, day selector, totals
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Families ----
            ui.strong("Tank families");
            let mut changed = false;
            ui.horizontal(|ui: &mut Ui| {
                for family in Family::ALL {
                    changed |= ui
                        .checkbox(state.families.flag_mut(family), family.as_str())
                        .changed();
                }
            });
            if changed {
                state.apply();
            }
            ui.separator();

            // ---- Day ----
            day_selector(ui, state);
            ui.separator();

            // ---- Totals ----
            ui.strong("Totals");
            ui.checkbox(&mut state.exclude_empty, "Exclude empty tanks");
            let totals = state.totals();
            egui::Grid::new("totals_grid")
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    ui.label("kg extracted");
                    ui.monospace(format_it(totals.kg, 3));
                    ui.end_row();
                    ui.label("Σ f(A)");
                    ui.monospace(format_it(totals.f_a, 6));
                    ui.end_row();
                    ui.label("Measurements");
                    ui.monospace(totals.count.to_string());
                    ui.end_row();
                });
        });
}

fn day_selector(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Day");
    if state.days.is_empty() {
        ui.label("No dated rows: the whole file is analysed.");
        return;
    }

    let initial = state.selected_day;
    let mut picked = initial;
    let current = state
        .selected_date()
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default();
    let at_start = initial.map_or(true, |i| i == 0);
    let at_end = initial.map_or(true, |i| i + 1 >= state.days.len());

    ui.horizontal(|ui: &mut Ui| {
        if ui.add_enabled(!at_start, egui::Button::new("◀")).clicked() {
            state.previous_day();
        }
        egui::ComboBox::from_id_salt("day_selector")
            .selected_text(current)
            .show_ui(ui, |ui: &mut Ui| {
                for (i, day) in state.days.iter().enumerate() {
                    ui.selectable_value(&mut picked, Some(i), day.format("%d/%m/%Y").to_string());
                }
            });
        if ui.add_enabled(!at_end, egui::Button::new("▶")).clicked() {
            state.next_day();
        }
    });

    // Picked from the list, as opposed to stepped with the arrows.
    if let Some(i) = picked.filter(|_| picked != initial) {
        state.select_day(i);
    }
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

pub fn tab_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.label());
        }
    });
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
            let loaded = state.dataset.is_some();
            if ui.add_enabled(loaded, egui::Button::new("Export all")).clicked() {
                export_all(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let name = state
                .source_path
                .as_deref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}: {} rows, {} tanks, {} days",
                ds.len(),
                ds.columns.tank_keys().len(),
                state.days.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog and export
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open tank export")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}

fn export_all(state: &mut AppState) {
    match state.export_all() {
        Ok(paths) => {
            log::info!("exported {} files", paths.len());
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Export failed: {e:#}"));
        }
    }
}
