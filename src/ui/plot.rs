use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{Line, Plot, PlotPoints, Points};
use hof_explorer::color::TrackPalette;
use hof_explorer::data::stats::SliceStats;
use hof_explorer::data::tracks::{TrackFigure, TrackOutcome};

use crate::state::{AppState, EnhancerDetail, MainView};
use crate::ui::panels::thousands;
use crate::ui::tables;

const TRACK_HEIGHT: f32 = 90.0;
const WARNING: Color32 = Color32::from_rgb(200, 140, 0);

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the central panel for the current view.
pub fn main_view(ui: &mut Ui, state: &AppState) {
    match &state.view {
        MainView::NoData => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a data folder to begin  (File → Open data folder…)");
            });
        }
        MainView::NoMatches => {
            ui.label(
                RichText::new(
                    "⚠ No enhancers match the selected filters. Please adjust your filter criteria.",
                )
                .color(WARNING),
            );
        }
        MainView::Summary(rows) => {
            ui.label("Select a specific enhancer to view detailed analysis.");
            ui.heading("Available Enhancers");
            tables::summary_table(ui, rows);
        }
        MainView::Detail(details) => {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| {
                    let single = details.len() == 1;
                    for detail in details {
                        egui::CollapsingHeader::new(RichText::new(&detail.enhancer_id).strong())
                            .id_salt(&detail.enhancer_id)
                            .default_open(single)
                            .show(ui, |ui: &mut Ui| enhancer_detail(ui, detail, &state.palette));
                    }
                });
        }
    }
}

fn enhancer_detail(ui: &mut Ui, detail: &EnhancerDetail, palette: &TrackPalette) {
    ui.columns(2, |cols| {
        let ui = &mut cols[0];
        ui.strong("Experimental Information");
        match &detail.metadata {
            Some(meta) => {
                for (name, value) in [
                    ("Cargo", &meta.cargo),
                    ("Experiment Type", &meta.experiment),
                    ("Proximal Gene", &meta.proximal_gene),
                ] {
                    if let Some(value) = value {
                        ui.label(format!("• {name}: {value}"));
                    }
                }
            }
            None => {
                ui.label("• No metadata available for this enhancer");
            }
        }

        let ui = &mut cols[1];
        if let Some(locus) = &detail.locus {
            ui.strong("Genomic Location");
            ui.label(format!("• Chromosome: {}", locus.chr));
            ui.label(format!("• Start Position: {}", thousands(locus.start)));
            ui.label(format!("• End Position: {}", thousands(locus.end)));
            ui.label(format!("• Length: {} bp", thousands(locus.length())));
            ui.label(format!("• Cell Types Analyzed: {}", detail.cell_types));
            ui.label(format!("• Genomic Positions: {}", detail.positions));
        }
    });
    ui.separator();

    ui.heading("Imaging");
    let links = detail
        .metadata
        .as_ref()
        .map(|m| m.imaging_links())
        .unwrap_or_default();
    if links.is_empty() {
        ui.label("No imaging visualizations available for this enhancer");
    }
    for (title, url) in links {
        ui.hyperlink_to(title, url);
    }
    ui.separator();

    ui.heading("Peak Accessibility Profile Across Cell Types");
    if let Some(cell_type) = &detail.cell_type {
        ui.label(format!("Showing data filtered for cell type: {cell_type}"));
    }
    let Some(peaks) = &detail.peaks else {
        ui.label(
            RichText::new("⚠ No peak accessibility data available for this enhancer with current filters")
                .color(WARNING),
        );
        return;
    };

    match &peaks.tracks {
        TrackOutcome::Figure(figure) => track_figure(ui, figure, palette),
        TrackOutcome::Fallback { reason, rows } => {
            ui.label(
                RichText::new(format!("Error generating visualization: {reason}"))
                    .color(Color32::RED),
            );
            ui.strong("Raw Peak Data Preview:");
            tables::fallback_table(ui, &detail.enhancer_id, rows);
        }
    }
    ui.separator();

    ui.heading("Accessibility Statistics");
    stats_panel(ui, &peaks.stats);
}

// ---------------------------------------------------------------------------
// Tracks
// ---------------------------------------------------------------------------

/// Stacked per-cell-type plots sharing the enhancer's genomic window.
fn track_figure(ui: &mut Ui, figure: &TrackFigure, palette: &TrackPalette) {
    ui.label(figure.title());
    let (x_min, x_max) = figure.x_range();
    let last = figure.tracks.len().saturating_sub(1);

    for (i, track) in figure.tracks.iter().enumerate() {
        let color = palette.color_for(&track.cell_type);
        let points: Vec<[f64; 2]> = track
            .points
            .iter()
            .map(|p| [p.genomic_position, p.score])
            .collect();

        let mut plot = Plot::new(("track", &figure.enhancer_id, &track.cell_type))
            .height(TRACK_HEIGHT)
            .y_axis_label(&track.cell_type)
            .include_x(x_min)
            .include_x(x_max)
            .include_y(0.0)
            .include_y(track.y_max)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .allow_boxed_zoom(false);
        if i == last {
            plot = plot.x_axis_label(format!("{} position (bp)", figure.locus.chr));
        }

        plot.show(ui, |plot_ui| {
            if track.is_single_point() {
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .name(&track.cell_type)
                        .color(color)
                        .radius(4.0),
                );
            } else {
                plot_ui.line(
                    Line::new(PlotPoints::from(points))
                        .name(&track.cell_type)
                        .color(color)
                        .fill(0.0)
                        .width(1.5),
                );
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

fn stats_panel(ui: &mut Ui, stats: &SliceStats) {
    let fmt = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"));
    ui.columns(4, |cols| {
        metric(&mut cols[0], "Cell Types", stats.cell_type_count.to_string());
        metric(&mut cols[1], "Max Accessibility", fmt(stats.max_score));
        metric(&mut cols[2], "Mean Accessibility", fmt(stats.mean_score));
        metric(&mut cols[3], "Std Deviation", fmt(stats.std_score));
    });

    if !stats.top_by_mean.is_empty() {
        ui.strong("Top Cell Types by Mean Accessibility:");
        for (rank, entry) in stats.top_by_mean.iter().enumerate() {
            ui.label(format!("{}. {}: {:.4}", rank + 1, entry.cell_type, entry.mean));
        }
    }
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).size(22.0).strong());
    });
}
