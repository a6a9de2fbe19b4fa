use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use hof_explorer::data::model::Selection;

use crate::state::{AppState, CriterionKind};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Enhancer Selection");
    ui.label("Choose an enhancer and narrow the list with the filters below.");
    ui.separator();

    if state.datasets.is_none() {
        ui.label("No data loaded.");
        return;
    }

    // Clone what we need so we can mutate state while drawing.
    let options = state.options.clone();
    let criteria = state.criteria.clone();
    let controls = [
        ("Select Enhancer", CriterionKind::Enhancer, &criteria.enhancer, &options.enhancers),
        ("Filter by Cargo", CriterionKind::Cargo, &criteria.cargo, &options.cargos),
        ("Filter by Experiment", CriterionKind::Experiment, &criteria.experiment, &options.experiments),
        ("Filter by Proximal Gene", CriterionKind::Gene, &criteria.gene, &options.genes),
        ("Filter by Cell Type", CriterionKind::CellType, &criteria.cell_type, &options.cell_types),
    ];

    let mut changed: Option<(CriterionKind, Selection)> = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (label, kind, current, values) in controls {
                ui.strong(label);
                if let Some(choice) = selection_combo(ui, kind, current, values) {
                    changed = Some((kind, choice));
                }
                ui.add_space(6.0);
            }

            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });

    if let Some((kind, value)) = changed {
        state.set_selection(kind, value);
    }
}

/// A combo box offering "All" followed by `values`.  Returns the new
/// selection when the user picks a different entry.
fn selection_combo(
    ui: &mut Ui,
    kind: CriterionKind,
    current: &Selection,
    values: &[String],
) -> Option<Selection> {
    let mut picked = None;
    egui::ComboBox::from_id_salt(("criterion", kind as u8))
        .selected_text(current.to_string())
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            if ui.selectable_label(current.is_all(), "All").clicked() {
                picked = Some(Selection::All);
            }
            for value in values {
                let selected = current.as_only() == Some(value.as_str());
                if ui.selectable_label(selected, value).clicked() {
                    picked = Some(Selection::only(value.clone()));
                }
            }
        });
    picked.filter(|p| p != current)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(overview) = &state.overview {
            ui.label(format!(
                "{} enhancers · {} cell types · {} peak records",
                overview.total_enhancers,
                overview.cell_types,
                thousands(overview.peak_records as i64),
            ));
            ui.separator();
            ui.label(format!("{} matching", state.outcome.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

/// `1234567` → `"1,234,567"`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open enhancer data folder")
        .pick_folder();

    if let Some(dir) = folder {
        let paths = state.config.paths_in(&dir);
        log::info!("Loading data from {}", dir.display());
        state.load(&paths);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    #[case(0, "0")]
    #[case(999, "999")]
    #[case(1_000, "1,000")]
    #[case(1_234_567, "1,234,567")]
    #[case(-45_000, "-45,000")]
    fn test_thousands(#[case] n: i64, #[case] expected: &str) {
        assert_eq!(thousands(n), expected);
    }
}
