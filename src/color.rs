use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Track colours: cell type → Color32
// ---------------------------------------------------------------------------

/// Assigns each cell type a fixed colour, so a cell type keeps its colour
/// when other cell types are filtered out.
#[derive(Debug, Clone, Default)]
pub struct TrackPalette {
    mapping: BTreeMap<String, Color32>,
}

impl TrackPalette {
    /// Build from the full, ordered list of cell types.
    pub fn new(cell_types: &[String]) -> Self {
        let mapping = cell_types
            .iter()
            .cloned()
            .zip(generate_palette(cell_types.len()))
            .collect();
        TrackPalette { mapping }
    }

    pub fn color_for(&self, cell_type: &str) -> Color32 {
        self.mapping
            .get(cell_type)
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}
