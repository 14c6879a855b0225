use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::ledger::Ledger;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – batch selection and options
// ---------------------------------------------------------------------------

/// Render the left panel: options, batch checkboxes, ledger metadata.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Batches");
    ui.separator();

    if ui.button("Load batch files…").clicked() {
        open_batch_dialog(state);
    }

    if state.registry.is_empty() {
        ui.add_space(4.0);
        ui.label("Load at least one export to begin.");
        show_warnings(ui, state);
        return;
    }

    ui.add_space(4.0);
    ui.strong("Options");
    ui.checkbox(&mut state.relative_time, "Relative time (hours since start)");
    ui.checkbox(&mut state.show_pressure, "Plot pressure");
    ui.separator();

    // Snapshot the ledger once per frame; the TTL cache makes this cheap.
    let ledger = state.ledger_snapshot();
    let labels: Vec<String> = state.registry.labels().map(str::to_string).collect();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Select batches to compare");
            for label in &labels {
                let mut checked = state.selected.contains(label);
                let text = RichText::new(label).color(state.colors.color_for(label));
                let source = state
                    .registry
                    .get(label)
                    .map(|b| b.source_filename.clone())
                    .unwrap_or_default();
                if ui.checkbox(&mut checked, text).on_hover_text(source).changed() {
                    state.toggle_batch(label);
                }
            }

            if state.selected.is_empty() {
                ui.add_space(4.0);
                ui.label("Check at least one batch to see the charts.");
            }

            ui.separator();
            ledger_section(ui, state, ledger.as_ref());
            show_warnings(ui, state);
        });
}

/// Quality/status metadata for each selected batch.
fn ledger_section(ui: &mut Ui, state: &mut AppState, ledger: Option<&Ledger>) {
    ui.strong("Batch ledger");

    if ui.button("Load ledger…").clicked() {
        open_ledger_dialog(state);
    }

    let Some(ledger) = ledger else {
        if !state.ledger_configured() {
            ui.label("No ledger loaded.");
        }
        return;
    };

    if let Some(name) = state.ledger_name() {
        ui.label(format!("{name} — {} rows", ledger.rows.len()));
    }

    let selected: Vec<String> = state.selected.iter().cloned().collect();
    for label in selected {
        match state.ledger_match(&label, ledger) {
            Some(row) => {
                egui::CollapsingHeader::new(RichText::new(&label).strong())
                    .id_salt(&label)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        for col in &ledger.columns {
                            let value = row.get(col).unwrap_or("");
                            if !value.trim().is_empty() {
                                ui.label(format!("{col}: {value}"));
                            }
                        }
                    });
            }
            None => {
                ui.label(format!("{label}: not found in ledger"));
            }
        }
    }
}

fn show_warnings(ui: &mut Ui, state: &AppState) {
    if state.warnings.is_empty() {
        return;
    }
    ui.separator();
    egui::CollapsingHeader::new(format!("Warnings ({})", state.warnings.len()))
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            for warning in &state.warnings {
                ui.label(RichText::new(warning).color(Color32::ORANGE).small());
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open batch files…").clicked() {
                open_batch_dialog(state);
                ui.close_menu();
            }
            if ui.button("Open ledger…").clicked() {
                open_ledger_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Clear batches").clicked() {
                state.clear_batches();
                ui.close_menu();
            }
        });

        ui.separator();

        if !state.registry.is_empty() {
            ui.label(format!(
                "{} batches loaded, {} selected",
                state.registry.len(),
                state.selected.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_batch_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open batch exports")
        .add_filter("SCADA exports", &["csv", "xlsx"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .pick_files();

    if let Some(paths) = files {
        log::info!("loading {} batch file(s)", paths.len());
        state.load_paths(paths);
    }
}

pub fn open_ledger_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open batch ledger")
        .add_filter("Ledger", &["csv", "xlsx"])
        .pick_file();

    if let Some(path) = file {
        log::info!("using ledger {}", path.display());
        state.set_ledger_path(path);
    }
}
