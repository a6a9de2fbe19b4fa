use eframe::egui::{self, ScrollArea, Ui};
use hof_explorer::data::stats::EnhancerSummary;
use hof_explorer::data::tracks::FallbackRow;

use crate::ui::panels::thousands;

fn score(v: Option<f64>) -> String {
    v.map_or_else(String::new, |v| format!("{v:.4}"))
}

/// Overview of every enhancer passing the filters.
pub fn summary_table(ui: &mut Ui, rows: &[EnhancerSummary]) {
    ScrollArea::both()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("enhancer_summary_grid")
                .striped(true)
                .min_col_width(70.0)
                .show(ui, |ui| {
                    for h in [
                        "Enhancer ID",
                        "Chromosome",
                        "Start",
                        "End",
                        "Length (bp)",
                        "Cell Types",
                        "Mean Accessibility",
                        "Max Accessibility",
                    ] {
                        ui.strong(h);
                    }
                    ui.end_row();

                    for s in rows {
                        ui.label(&s.enhancer_id);
                        ui.label(&s.locus.chr);
                        ui.label(thousands(s.locus.start));
                        ui.label(thousands(s.locus.end));
                        ui.label(thousands(s.locus.length()));
                        ui.label(s.cell_types.to_string());
                        ui.label(score(s.mean_score));
                        ui.label(score(s.max_score));
                        ui.end_row();
                    }
                });
        });
}

/// Tabular stand-in for a track figure that could not be drawn.
pub fn fallback_table(ui: &mut Ui, id_salt: &str, rows: &[FallbackRow]) {
    egui::Grid::new(("fallback_grid", id_salt))
        .striped(true)
        .min_col_width(100.0)
        .show(ui, |ui| {
            ui.strong("cell_type");
            ui.strong("position_index");
            ui.strong("accessibility_score");
            ui.end_row();

            for r in rows {
                ui.label(r.cell_type.as_deref().unwrap_or("<null>"));
                ui.label(r.position_index.to_string());
                ui.label(format!("{:.4}", r.accessibility_score));
                ui.end_row();
            }
        });
}
